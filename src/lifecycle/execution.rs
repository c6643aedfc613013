// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! [`Execution`] aggregate root.

use std::{collections::BTreeMap, time::SystemTime};

use crate::{
    error::{EntityKind, LifecycleError, LifecycleResult},
    value::{Elapsed, ExecutionId, ScenarioId},
};

use super::{Scenario, Stats};

/// One end-to-end test run, owning its [`Scenario`]s.
///
/// Every count is computed from the current scenarios on each call, so it
/// can never drift from them. After [`Execution::complete()`] nothing can be
/// added or modified anymore.
#[derive(Clone, Debug, PartialEq)]
pub struct Execution {
    /// Identifier of this [`Execution`].
    id: ExecutionId,

    /// Creation time.
    started_at: SystemTime,

    /// Completion time.
    finished_at: Option<SystemTime>,

    /// Owned [`Scenario`]s in execution order.
    scenarios: Vec<Scenario>,

    /// Free-form metadata.
    metadata: BTreeMap<String, String>,
}

impl Default for Execution {
    fn default() -> Self {
        Self::new()
    }
}

impl Execution {
    /// Creates a new running [`Execution`], stamping its identifier and
    /// start time.
    #[must_use]
    pub fn new() -> Self {
        let now = SystemTime::now();
        Self {
            id: ExecutionId::at(now),
            started_at: now,
            finished_at: None,
            scenarios: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Reassembles an [`Execution`] from its recorded state, keeping the
    /// identifier and timestamps verbatim.
    pub(crate) fn restore(
        id: ExecutionId,
        started_at: SystemTime,
        finished_at: Option<SystemTime>,
        scenarios: Vec<Scenario>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self { id, started_at, finished_at, scenarios, metadata }
    }

    /// Adds a metadata entry, consuming and returning this [`Execution`].
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        drop(self.metadata.insert(key.into(), value.into()));
        self
    }

    /// Sets a metadata entry.
    ///
    /// # Errors
    ///
    /// If this [`Execution`] is already completed.
    pub fn set_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> LifecycleResult<()> {
        self.ensure_open("set_metadata")?;
        drop(self.metadata.insert(key.into(), value.into()));
        Ok(())
    }

    /// Returns the identifier of this [`Execution`].
    #[must_use]
    pub const fn id(&self) -> &ExecutionId {
        &self.id
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Returns the completion time, if completed.
    #[must_use]
    pub const fn finished_at(&self) -> Option<SystemTime> {
        self.finished_at
    }

    /// Indicates whether this [`Execution`] is completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Returns the metadata.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Returns the [`Scenario`]s in execution order.
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Returns the [`Scenario`] with the given `id`, if it belongs here.
    #[must_use]
    pub fn scenario(&self, id: ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|sc| sc.id() == id)
    }

    /// Appends a new pending [`Scenario`] and returns it.
    ///
    /// # Errors
    ///
    /// If this [`Execution`] is already completed.
    pub fn add_scenario<T: Into<String>>(
        &mut self,
        name: impl Into<String>,
        feature: impl Into<String>,
        tags: impl IntoIterator<Item = T>,
    ) -> LifecycleResult<&mut Scenario> {
        self.ensure_open("add_scenario")?;
        self.scenarios.push(Scenario::new(name, feature, tags));
        let last = self.scenarios.len() - 1;
        Ok(&mut self.scenarios[last])
    }

    /// Returns the [`Scenario`] with the given `id` for driving it.
    ///
    /// # Errors
    ///
    /// If this [`Execution`] is already completed, or has no such
    /// [`Scenario`].
    pub fn scenario_mut(&mut self, id: ScenarioId) -> LifecycleResult<&mut Scenario> {
        self.ensure_open("modify_scenario")?;
        self.scenarios
            .iter_mut()
            .find(|sc| sc.id() == id)
            .ok_or(LifecycleError::UnknownScenario { scenario: id })
    }

    /// Completes this [`Execution`], stamping its end time and freezing it.
    ///
    /// Completing an already completed [`Execution`] changes nothing.
    pub fn complete(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(SystemTime::now());
        }
    }

    /// Returns the counts of scenarios and steps by status.
    #[must_use]
    pub fn stats(&self) -> Stats {
        Stats::collect(&self.scenarios)
    }

    /// Returns the number of scenarios.
    #[must_use]
    pub fn total_scenarios(&self) -> usize {
        self.scenarios.len()
    }

    /// Returns the number of passed scenarios.
    #[must_use]
    pub fn passed_scenarios(&self) -> usize {
        self.stats().passed_scenarios
    }

    /// Returns the number of failed scenarios.
    #[must_use]
    pub fn failed_scenarios(&self) -> usize {
        self.stats().failed_scenarios
    }

    /// Returns the number of skipped scenarios.
    #[must_use]
    pub fn skipped_scenarios(&self) -> usize {
        self.stats().skipped_scenarios
    }

    /// Returns the number of steps across all scenarios.
    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.scenarios.iter().map(|sc| sc.steps().len()).sum()
    }

    /// Returns the number of passed steps.
    #[must_use]
    pub fn passed_steps(&self) -> usize {
        self.stats().passed_steps
    }

    /// Returns the number of failed steps.
    #[must_use]
    pub fn failed_steps(&self) -> usize {
        self.stats().failed_steps
    }

    /// Returns the number of skipped steps.
    #[must_use]
    pub fn skipped_steps(&self) -> usize {
        self.stats().skipped_steps
    }

    /// Indicates whether there is at least one [`Scenario`] and every one
    /// of them passed.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        !self.scenarios.is_empty()
            && self.scenarios.iter().all(Scenario::is_successful)
    }

    /// Returns the process exit code of this [`Execution`]: `0` if
    /// [`Execution::is_successful()`], `1` otherwise.
    ///
    /// Reporter and shipper health never affect it.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_successful())
    }

    /// Indicates whether any [`Scenario`] failed or was undefined.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.scenarios.iter().any(|sc| sc.status().is_failure())
    }

    /// Returns the time from start to completion, or [`Elapsed::ZERO`]
    /// until completed.
    #[must_use]
    pub fn duration(&self) -> Elapsed {
        self.finished_at
            .map_or(Elapsed::ZERO, |end| Elapsed::between(self.started_at, end))
    }

    /// Fails if this [`Execution`] is frozen.
    fn ensure_open(&self, action: &'static str) -> LifecycleResult<()> {
        if self.is_completed() {
            return Err(LifecycleError::invalid_transition(
                EntityKind::Execution,
                &self.id,
                "completed",
                action,
            ));
        }
        Ok(())
    }
}
