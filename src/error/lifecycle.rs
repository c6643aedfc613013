// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Errors of driving lifecycle entities through their state machines.
//!
//! These always indicate a driver bug, so they are never retried and are
//! propagated to the caller.

use derive_more::with_trait::{Display, Error};

use crate::value::{ScenarioId, StepId};

/// Kind of a lifecycle entity, used in [`LifecycleError`] messages.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum EntityKind {
    /// [`Step`](crate::Step).
    #[display("step")]
    Step,

    /// [`Scenario`](crate::Scenario).
    #[display("scenario")]
    Scenario,

    /// [`Execution`](crate::Execution).
    #[display("execution")]
    Execution,
}

/// Error of a lifecycle operation.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum LifecycleError {
    /// Lifecycle method called from a state it isn't allowed in.
    #[display("cannot `{action}` {entity} `{id}` while it is `{from}`")]
    InvalidTransition {
        /// Kind of the entity.
        entity: EntityKind,

        /// Identifier of the entity.
        #[error(not(source))]
        id: String,

        /// State the entity was in.
        #[error(not(source))]
        from: String,

        /// Name of the attempted operation.
        #[error(not(source))]
        action: &'static str,
    },

    /// [`Step::fail()`] called with an empty message.
    ///
    /// [`Step::fail()`]: crate::Step::fail
    #[display("step `{step}` cannot fail without an error message")]
    EmptyFailureMessage {
        /// Identifier of the step.
        step: StepId,
    },

    /// [`Scenario::complete()`] called while one of its steps still runs.
    ///
    /// [`Scenario::complete()`]: crate::Scenario::complete
    #[display("cannot complete scenario `{scenario}` while step `{step}` is running")]
    UnfinishedStep {
        /// Identifier of the scenario.
        scenario: ScenarioId,

        /// Identifier of the running step.
        step: StepId,
    },

    /// No scenario with the given identifier in the execution.
    #[display("unknown scenario `{scenario}`")]
    UnknownScenario {
        /// Requested identifier.
        scenario: ScenarioId,
    },

    /// No step with the given identifier in the scenario.
    #[display("unknown step `{step}` in scenario `{scenario}`")]
    UnknownStep {
        /// Identifier of the scenario searched.
        scenario: ScenarioId,

        /// Requested identifier.
        step: StepId,
    },
}

/// Result type alias for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

impl LifecycleError {
    /// Creates a new [`LifecycleError::InvalidTransition`].
    #[must_use]
    pub fn invalid_transition(
        entity: EntityKind,
        id: impl ToString,
        from: impl ToString,
        action: &'static str,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            id: id.to_string(),
            from: from.to_string(),
            action,
        }
    }

    /// Returns true if an operation was attempted from a wrong state.
    #[must_use]
    pub const fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. } | Self::UnfinishedStep { .. },
        )
    }
}
