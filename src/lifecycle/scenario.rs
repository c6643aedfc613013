// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! [`Scenario`] entity and derivation of its status from its steps.

use std::{str::FromStr, time::SystemTime};

use crate::{
    error::{EntityKind, LifecycleError, LifecycleResult},
    value::{Elapsed, Keyword, ScenarioId, ScenarioStatus, StepId, StepStatus},
};

use super::Step;

/// Status given to a [`Scenario`] completed without any steps.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EmptyScenarioPolicy {
    /// Vacuous success.
    #[default]
    Passed,

    /// Nothing ran, so nothing passed.
    Skipped,

    /// A scenario without steps is a broken scenario.
    Failed,
}

impl EmptyScenarioPolicy {
    /// Returns the [`ScenarioStatus`] this policy assigns.
    #[must_use]
    pub const fn status(self) -> ScenarioStatus {
        match self {
            Self::Passed => ScenarioStatus::Passed,
            Self::Skipped => ScenarioStatus::Skipped,
            Self::Failed => ScenarioStatus::Failed,
        }
    }
}

impl FromStr for EmptyScenarioPolicy {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passed" => Ok(Self::Passed),
            "skipped" => Ok(Self::Skipped),
            "failed" => Ok(Self::Failed),
            _ => Err("possible options: passed, skipped, failed"),
        }
    }
}

/// Derives a terminal [`ScenarioStatus`] from the statuses of its steps.
///
/// Highest priority wins:
/// 1. any [`StepStatus::Undefined`] gives [`ScenarioStatus::Undefined`];
/// 2. any [`StepStatus::Failed`] gives [`ScenarioStatus::Failed`];
/// 3. no [`StepStatus::Passed`] at all gives [`ScenarioStatus::Skipped`];
/// 4. otherwise [`ScenarioStatus::Passed`].
///
/// Steps that never left [`StepStatus::Pending`] weren't reached, so they
/// count as skipped. No steps at all yields `empty`'s status.
#[must_use]
pub fn derive_status(
    steps: impl IntoIterator<Item = StepStatus>,
    empty: EmptyScenarioPolicy,
) -> ScenarioStatus {
    let (mut total, mut passed, mut failed, mut undefined) = (0, 0, 0, 0);
    for status in steps {
        total += 1;
        match status {
            StepStatus::Passed => passed += 1,
            StepStatus::Failed => failed += 1,
            StepStatus::Undefined => undefined += 1,
            StepStatus::Pending | StepStatus::Running | StepStatus::Skipped => {}
        }
    }

    if total == 0 {
        empty.status()
    } else if undefined > 0 {
        ScenarioStatus::Undefined
    } else if failed > 0 {
        ScenarioStatus::Failed
    } else if passed == 0 {
        ScenarioStatus::Skipped
    } else {
        ScenarioStatus::Passed
    }
}

/// One BDD test case, owning an ordered sequence of [`Step`]s.
///
/// Its terminal status is never set by hand: [`Scenario::complete()`]
/// always derives it with [`derive_status()`].
#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    /// Identifier of this [`Scenario`].
    id: ScenarioId,

    /// Name of this [`Scenario`].
    name: String,

    /// Name of the feature this [`Scenario`] belongs to.
    feature: String,

    /// Tags in declaration order, duplicates kept.
    tags: Vec<String>,

    /// Owned [`Step`]s in execution order.
    steps: Vec<Step>,

    /// Current status.
    status: ScenarioStatus,

    /// Time of the `Pending -> Running` transition.
    started_at: Option<SystemTime>,

    /// Time of completion.
    finished_at: Option<SystemTime>,
}

impl Scenario {
    /// Creates a new [`ScenarioStatus::Pending`] [`Scenario`].
    #[must_use]
    pub fn new<T: Into<String>>(
        name: impl Into<String>,
        feature: impl Into<String>,
        tags: impl IntoIterator<Item = T>,
    ) -> Self {
        Self {
            id: ScenarioId::new(),
            name: name.into(),
            feature: feature.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            steps: Vec::new(),
            status: ScenarioStatus::Pending,
            started_at: None,
            finished_at: None,
        }
    }

    /// Reassembles a [`Scenario`] from its recorded state, keeping the
    /// identifier and timestamps verbatim.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: ScenarioId,
        name: String,
        feature: String,
        tags: Vec<String>,
        steps: Vec<Step>,
        status: ScenarioStatus,
        started_at: Option<SystemTime>,
        finished_at: Option<SystemTime>,
    ) -> Self {
        Self { id, name, feature, tags, steps, status, started_at, finished_at }
    }

    /// Returns the identifier of this [`Scenario`].
    #[must_use]
    pub const fn id(&self) -> ScenarioId {
        self.id
    }

    /// Returns the name of this [`Scenario`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the feature this [`Scenario`] belongs to.
    #[must_use]
    pub fn feature_name(&self) -> &str {
        &self.feature
    }

    /// Returns the tags of this [`Scenario`] in declaration order.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the [`Step`]s of this [`Scenario`] in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the [`Step`] with the given `id`, if it belongs here.
    #[must_use]
    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id() == id)
    }

    /// Returns the current [`ScenarioStatus`].
    #[must_use]
    pub const fn status(&self) -> ScenarioStatus {
        self.status
    }

    /// Returns the time this [`Scenario`] started, if it did.
    #[must_use]
    pub const fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    /// Returns the time this [`Scenario`] completed, if it did.
    #[must_use]
    pub const fn finished_at(&self) -> Option<SystemTime> {
        self.finished_at
    }

    /// Indicates whether this [`Scenario`] is [`ScenarioStatus::Passed`].
    #[must_use]
    pub const fn is_successful(&self) -> bool {
        self.status.is_successful()
    }

    /// Indicates whether this [`Scenario`] is completed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns the time from start to completion, or [`Elapsed::ZERO`]
    /// until completed.
    #[must_use]
    pub fn duration(&self) -> Elapsed {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Elapsed::between(start, end),
            _ => Elapsed::ZERO,
        }
    }

    /// Starts this [`Scenario`].
    ///
    /// # Errors
    ///
    /// If this [`Scenario`] isn't [`ScenarioStatus::Pending`].
    pub fn start(&mut self) -> LifecycleResult<()> {
        if self.status != ScenarioStatus::Pending {
            return Err(self.invalid("start"));
        }
        self.status = ScenarioStatus::Running;
        self.started_at = Some(SystemTime::now());
        Ok(())
    }

    /// Appends a new pending [`Step`] and returns it.
    ///
    /// # Errors
    ///
    /// If this [`Scenario`] is already completed.
    pub fn add_step(
        &mut self,
        keyword: Keyword,
        name: impl Into<String>,
    ) -> LifecycleResult<&mut Step> {
        if self.is_terminal() {
            return Err(self.invalid("add_step"));
        }
        self.steps.push(Step::new(keyword, name));
        let last = self.steps.len() - 1;
        Ok(&mut self.steps[last])
    }

    /// Returns the [`Step`] with the given `id` for driving it.
    ///
    /// # Errors
    ///
    /// If this [`Scenario`] is already completed, or has no such [`Step`].
    pub fn step_mut(&mut self, id: StepId) -> LifecycleResult<&mut Step> {
        if self.is_terminal() {
            return Err(self.invalid("modify_step"));
        }
        let scenario = self.id;
        self.steps
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(LifecycleError::UnknownStep { scenario, step: id })
    }

    /// Completes this [`Scenario`] treating an empty one as passed.
    ///
    /// See [`Scenario::complete_with()`].
    ///
    /// # Errors
    ///
    /// If one of the steps is still running.
    pub fn complete(&mut self) -> LifecycleResult<ScenarioStatus> {
        self.complete_with(EmptyScenarioPolicy::default())
    }

    /// Completes this [`Scenario`], deriving its status from its steps and
    /// stamping the completion time.
    ///
    /// Completing an already completed [`Scenario`] changes nothing and
    /// returns the same status.
    ///
    /// # Errors
    ///
    /// If one of the steps is still running.
    pub fn complete_with(
        &mut self,
        empty: EmptyScenarioPolicy,
    ) -> LifecycleResult<ScenarioStatus> {
        if self.is_terminal() {
            return Ok(self.status);
        }
        if let Some(running) =
            self.steps.iter().find(|s| s.status() == StepStatus::Running)
        {
            return Err(LifecycleError::UnfinishedStep {
                scenario: self.id,
                step: running.id(),
            });
        }

        let now = SystemTime::now();
        _ = self.started_at.get_or_insert(now);
        self.finished_at = Some(now);
        self.status = derive_status(self.steps.iter().map(Step::status), empty);
        Ok(self.status)
    }

    /// Builds an [`LifecycleError::InvalidTransition`] for this [`Scenario`].
    fn invalid(&self, action: &'static str) -> LifecycleError {
        LifecycleError::invalid_transition(
            EntityKind::Scenario,
            self.id,
            self.status,
            action,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_steps(outcomes: &[StepStatus]) -> Scenario {
        let mut sc = Scenario::new("Login", "Auth", ["@smoke"]);
        sc.start().unwrap();
        for outcome in outcomes {
            let step = sc.add_step(Keyword::Given, "a step").unwrap();
            if *outcome == StepStatus::Pending {
                continue;
            }
            step.start().unwrap();
            match outcome {
                StepStatus::Passed => step.complete_successfully().unwrap(),
                StepStatus::Failed => step.fail("boom").unwrap(),
                StepStatus::Skipped => step.skip().unwrap(),
                StepStatus::Undefined => step.undefined().unwrap(),
                StepStatus::Pending | StepStatus::Running => {}
            }
        }
        sc
    }

    #[test]
    fn derivation_law() {
        use ScenarioStatus as Sc;
        use StepStatus as St;

        for (steps, expected) in [
            (vec![St::Passed, St::Passed], Sc::Passed),
            (vec![St::Passed, St::Failed], Sc::Failed),
            (vec![St::Undefined, St::Passed], Sc::Undefined),
            (vec![St::Skipped, St::Skipped], Sc::Skipped),
            (vec![St::Failed, St::Undefined], Sc::Undefined),
            (vec![St::Passed, St::Skipped], Sc::Passed),
            (vec![St::Failed, St::Pending], Sc::Failed),
            (vec![St::Pending], Sc::Skipped),
        ] {
            let mut sc = with_steps(&steps);

            assert_eq!(sc.complete().unwrap(), expected, "{steps:?}");
            assert_eq!(sc.status(), expected);
        }
    }

    #[test]
    fn empty_scenario_follows_policy() {
        assert_eq!(with_steps(&[]).complete().unwrap(), ScenarioStatus::Passed);
        assert_eq!(
            with_steps(&[]).complete_with(EmptyScenarioPolicy::Skipped).unwrap(),
            ScenarioStatus::Skipped,
        );
        assert_eq!(
            with_steps(&[]).complete_with(EmptyScenarioPolicy::Failed).unwrap(),
            ScenarioStatus::Failed,
        );
    }

    #[test]
    fn complete_is_idempotent() {
        let mut sc = with_steps(&[StepStatus::Passed, StepStatus::Failed]);
        let first = sc.complete().unwrap();
        let (started, finished) = (sc.started_at(), sc.finished_at());

        assert_eq!(sc.complete().unwrap(), first);
        assert_eq!(sc.complete_with(EmptyScenarioPolicy::Skipped).unwrap(), first);
        assert_eq!(sc.started_at(), started);
        assert_eq!(sc.finished_at(), finished);
    }

    #[test]
    fn cannot_complete_with_running_step() {
        let mut sc = with_steps(&[StepStatus::Passed]);
        let running = sc.add_step(Keyword::When, "slow").unwrap();
        running.start().unwrap();
        let running = running.id();

        assert_eq!(
            sc.complete(),
            Err(LifecycleError::UnfinishedStep { scenario: sc.id(), step: running }),
        );
        assert_eq!(sc.status(), ScenarioStatus::Running);
    }

    #[test]
    fn frozen_after_complete() {
        let mut sc = with_steps(&[StepStatus::Passed]);
        let step = sc.steps()[0].id();
        sc.complete().unwrap();

        assert!(sc.add_step(Keyword::Then, "late").unwrap_err().is_invalid_transition());
        assert!(sc.step_mut(step).unwrap_err().is_invalid_transition());
        assert!(sc.start().unwrap_err().is_invalid_transition());
    }

    #[test]
    fn steps_may_be_added_while_pending() {
        let mut sc = Scenario::new("Outline", "Catalog", Vec::<String>::new());
        let id = sc.add_step(Keyword::Given, "a product").unwrap().id();

        assert_eq!(sc.step(id).map(Step::name), Some("a product"));
        assert_eq!(
            sc.step_mut(StepId(u64::MAX)).unwrap_err(),
            LifecycleError::UnknownStep { scenario: sc.id(), step: StepId(u64::MAX) },
        );
    }

    #[test]
    fn completing_pending_scenario_stamps_both_times() {
        let mut sc = Scenario::new("Never started", "Catalog", ["@wip", "@wip"]);

        assert_eq!(sc.complete().unwrap(), ScenarioStatus::Passed);
        assert_eq!(sc.started_at(), sc.finished_at());
        assert_eq!(sc.tags(), ["@wip", "@wip"]);
        assert!(sc.is_successful());
    }

    #[test]
    fn policy_parses() {
        assert_eq!("Skipped".parse(), Ok(EmptyScenarioPolicy::Skipped));
        assert!("maybe".parse::<EmptyScenarioPolicy>().is_err());
    }
}
