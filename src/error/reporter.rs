// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Errors raised inside a single [`Reporter`] callback.
//!
//! They are caught at the [`Coordinator`] boundary, logged and never
//! propagated.
//!
//! [`Coordinator`]: crate::Coordinator
//! [`Reporter`]: crate::Reporter

use derive_more::with_trait::{Display, Error};

use crate::value::LifecycleEvent;

/// How a [`Reporter`] callback went wrong.
///
/// [`Reporter`]: crate::Reporter
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum FailureKind {
    /// Callback returned an error.
    #[display("failed")]
    Error,

    /// Callback panicked.
    #[display("panicked")]
    Panic,
}

/// Failure of a specific [`Reporter`] on a specific [`LifecycleEvent`].
///
/// [`Reporter`]: crate::Reporter
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("reporter `{reporter}` {kind} on `{event}`: {message}")]
pub struct ReporterError {
    /// Name of the failed reporter.
    #[error(not(source))]
    pub reporter: String,

    /// Event being delivered.
    pub event: LifecycleEvent,

    /// Whether the callback errored or panicked.
    pub kind: FailureKind,

    /// Rendered cause.
    #[error(not(source))]
    pub message: String,
}

impl ReporterError {
    /// Creates a [`ReporterError`] from an error returned by the callback.
    #[must_use]
    pub fn failed(
        reporter: impl Into<String>,
        event: LifecycleEvent,
        cause: &anyhow::Error,
    ) -> Self {
        Self {
            reporter: reporter.into(),
            event,
            kind: FailureKind::Error,
            message: format!("{cause:#}"),
        }
    }

    /// Creates a [`ReporterError`] from a panic payload of the callback.
    #[must_use]
    pub fn panicked(
        reporter: impl Into<String>,
        event: LifecycleEvent,
        payload: &(dyn std::any::Any + Send),
    ) -> Self {
        Self {
            reporter: reporter.into(),
            event,
            kind: FailureKind::Panic,
            message: super::utilities::panic_message(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_reporter_and_event() {
        let err = ReporterError::failed(
            "portal",
            LifecycleEvent::EndScenario,
            &anyhow::anyhow!("connection refused").context("finish item"),
        );

        assert_eq!(
            err.to_string(),
            "reporter `portal` failed on `end_scenario`: finish item: connection refused",
        );
    }

    #[test]
    fn renders_panic_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        let err = ReporterError::panicked("console", LifecycleEvent::StartStep, payload.as_ref());

        assert_eq!(err.kind, FailureKind::Panic);
        assert!(err.to_string().contains("panicked on `start_step`: boom"));
    }
}
