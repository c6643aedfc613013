// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! [`Step`] entity and its state machine.

use std::time::SystemTime;

use crate::{
    error::{EntityKind, LifecycleError, LifecycleResult},
    value::{Elapsed, Keyword, StepId, StepStatus},
};

/// Single Given/When/Then action within a [`Scenario`].
///
/// Transitions:
/// ```text
/// Pending --start()--> Running --complete_successfully()--> Passed
///                              --fail(message)-----------> Failed
///                              --skip()------------------> Skipped
///                              --undefined()-------------> Undefined
/// ```
/// Any other call returns [`LifecycleError::InvalidTransition`]. Once
/// terminal, a [`Step`] never changes again.
///
/// [`Scenario`]: crate::Scenario
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Identifier of this [`Step`].
    id: StepId,

    /// Text following the keyword.
    name: String,

    /// Keyword this [`Step`] was written with.
    keyword: Keyword,

    /// Current status.
    status: StepStatus,

    /// Time of the `Pending -> Running` transition.
    started_at: Option<SystemTime>,

    /// Time of reaching a terminal status.
    finished_at: Option<SystemTime>,

    /// Message of a [`StepStatus::Failed`] step.
    error: Option<String>,
}

impl Step {
    /// Creates a new [`StepStatus::Pending`] [`Step`].
    #[must_use]
    pub fn new(keyword: Keyword, name: impl Into<String>) -> Self {
        Self {
            id: StepId::new(),
            name: name.into(),
            keyword,
            status: StepStatus::Pending,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    /// Reassembles a [`Step`] from its recorded state, keeping the
    /// identifier and timestamps verbatim.
    pub(crate) fn restore(
        id: StepId,
        keyword: Keyword,
        name: String,
        status: StepStatus,
        started_at: Option<SystemTime>,
        finished_at: Option<SystemTime>,
        error: Option<String>,
    ) -> Self {
        Self { id, name, keyword, status, started_at, finished_at, error }
    }

    /// Returns the identifier of this [`Step`].
    #[must_use]
    pub const fn id(&self) -> StepId {
        self.id
    }

    /// Returns the text of this [`Step`] following its keyword.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the [`Keyword`] of this [`Step`].
    #[must_use]
    pub const fn keyword(&self) -> Keyword {
        self.keyword
    }

    /// Returns the current [`StepStatus`].
    #[must_use]
    pub const fn status(&self) -> StepStatus {
        self.status
    }

    /// Returns the time this [`Step`] started running, if it did.
    #[must_use]
    pub const fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    /// Returns the time this [`Step`] became terminal, if it did.
    #[must_use]
    pub const fn finished_at(&self) -> Option<SystemTime> {
        self.finished_at
    }

    /// Returns the error message of a failed [`Step`].
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Indicates whether this [`Step`] reached a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns the time spent running, or [`Elapsed::ZERO`] until both
    /// timestamps are known.
    #[must_use]
    pub fn duration(&self) -> Elapsed {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Elapsed::between(start, end),
            _ => Elapsed::ZERO,
        }
    }

    /// Starts running this [`Step`].
    ///
    /// # Errors
    ///
    /// If this [`Step`] isn't [`StepStatus::Pending`].
    pub fn start(&mut self) -> LifecycleResult<()> {
        if self.status != StepStatus::Pending {
            return Err(self.invalid("start"));
        }
        self.status = StepStatus::Running;
        self.started_at = Some(SystemTime::now());
        Ok(())
    }

    /// Marks this running [`Step`] as [`StepStatus::Passed`].
    ///
    /// # Errors
    ///
    /// If this [`Step`] isn't [`StepStatus::Running`].
    pub fn complete_successfully(&mut self) -> LifecycleResult<()> {
        self.finish(StepStatus::Passed, "complete_successfully")
    }

    /// Marks this running [`Step`] as [`StepStatus::Failed`] with the given
    /// error `message`.
    ///
    /// # Errors
    ///
    /// If this [`Step`] isn't [`StepStatus::Running`], or the `message` is
    /// blank.
    pub fn fail(&mut self, message: impl Into<String>) -> LifecycleResult<()> {
        if self.status != StepStatus::Running {
            return Err(self.invalid("fail"));
        }
        let message = message.into();
        if message.trim().is_empty() {
            return Err(LifecycleError::EmptyFailureMessage { step: self.id });
        }
        self.error = Some(message);
        self.finish(StepStatus::Failed, "fail")
    }

    /// Marks this running [`Step`] as [`StepStatus::Skipped`].
    ///
    /// # Errors
    ///
    /// If this [`Step`] isn't [`StepStatus::Running`].
    pub fn skip(&mut self) -> LifecycleResult<()> {
        self.finish(StepStatus::Skipped, "skip")
    }

    /// Marks this running [`Step`] as [`StepStatus::Undefined`], meaning the
    /// runner found no step definition matching it.
    ///
    /// # Errors
    ///
    /// If this [`Step`] isn't [`StepStatus::Running`].
    pub fn undefined(&mut self) -> LifecycleResult<()> {
        self.finish(StepStatus::Undefined, "undefined")
    }

    /// Moves a running [`Step`] into the terminal `status`.
    fn finish(
        &mut self,
        status: StepStatus,
        action: &'static str,
    ) -> LifecycleResult<()> {
        if self.status != StepStatus::Running {
            return Err(self.invalid(action));
        }
        self.status = status;
        self.finished_at = Some(SystemTime::now());
        Ok(())
    }

    /// Builds an [`LifecycleError::InvalidTransition`] for this [`Step`].
    fn invalid(&self, action: &'static str) -> LifecycleError {
        LifecycleError::invalid_transition(
            EntityKind::Step,
            self.id,
            self.status,
            action,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> Step {
        let mut step = Step::new(Keyword::When, "I press the button");
        step.start().unwrap();
        step
    }

    #[test]
    fn starts_pending() {
        let step = Step::new(Keyword::Given, "a user");

        assert_eq!(step.status(), StepStatus::Pending);
        assert_eq!(step.keyword(), Keyword::Given);
        assert_eq!(step.name(), "a user");
        assert!(step.started_at().is_none());
        assert_eq!(step.duration(), Elapsed::ZERO);
    }

    #[test]
    fn passes() {
        let mut step = running();
        step.complete_successfully().unwrap();

        assert_eq!(step.status(), StepStatus::Passed);
        assert!(step.is_terminal());
        assert!(step.finished_at() >= step.started_at());
        assert!(step.error_message().is_none());
    }

    #[test]
    fn fails_with_message() {
        let mut step = running();
        step.fail("element not found").unwrap();

        assert_eq!(step.status(), StepStatus::Failed);
        assert_eq!(step.error_message(), Some("element not found"));
    }

    #[test]
    fn rejects_blank_failure_message() {
        let mut step = running();

        assert_eq!(
            step.fail("  "),
            Err(LifecycleError::EmptyFailureMessage { step: step.id() }),
        );
        assert_eq!(step.status(), StepStatus::Running);
    }

    #[test]
    fn cannot_finish_pending() {
        let mut step = Step::new(Keyword::Then, "it works");

        assert!(step.complete_successfully().unwrap_err().is_invalid_transition());
        assert!(step.fail("boom").unwrap_err().is_invalid_transition());
        assert!(step.skip().unwrap_err().is_invalid_transition());
        assert!(step.undefined().unwrap_err().is_invalid_transition());
        assert_eq!(step.status(), StepStatus::Pending);
    }

    #[test]
    fn cannot_start_twice() {
        let mut step = running();

        assert!(step.start().unwrap_err().is_invalid_transition());
    }

    #[test]
    fn terminal_is_immutable() {
        let mut step = running();
        step.skip().unwrap();
        let finished = step.clone();

        assert!(step.start().is_err());
        assert!(step.complete_successfully().is_err());
        assert!(step.fail("late").is_err());
        assert!(step.undefined().is_err());
        assert_eq!(step, finished);
    }
}
