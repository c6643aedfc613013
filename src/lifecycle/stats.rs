// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Counts of scenarios and steps by status.

use crate::value::{ScenarioStatus, StepStatus};

use super::Scenario;

/// Counts of an [`Execution`]'s scenarios and steps by status.
///
/// Always computed on demand from the current children, never cached.
///
/// [`Execution`]: super::Execution
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Number of scenarios.
    pub total_scenarios: usize,
    /// Number of passed scenarios.
    pub passed_scenarios: usize,
    /// Number of failed scenarios.
    pub failed_scenarios: usize,
    /// Number of skipped scenarios.
    pub skipped_scenarios: usize,
    /// Number of undefined scenarios.
    pub undefined_scenarios: usize,
    /// Number of steps across all scenarios.
    pub total_steps: usize,
    /// Number of passed steps.
    pub passed_steps: usize,
    /// Number of failed steps.
    pub failed_steps: usize,
    /// Number of skipped steps.
    pub skipped_steps: usize,
    /// Number of undefined steps.
    pub undefined_steps: usize,
}

impl Stats {
    /// Tallies the given `scenarios`.
    #[must_use]
    pub fn collect<'a>(scenarios: impl IntoIterator<Item = &'a Scenario>) -> Self {
        let mut stats = Self::default();
        for sc in scenarios {
            stats.record_scenario(sc.status());
            for step in sc.steps() {
                stats.record_step(step.status());
            }
        }
        stats
    }

    /// Records a scenario with the given status.
    pub fn record_scenario(&mut self, status: ScenarioStatus) {
        self.total_scenarios += 1;
        match status {
            ScenarioStatus::Passed => self.passed_scenarios += 1,
            ScenarioStatus::Failed => self.failed_scenarios += 1,
            ScenarioStatus::Skipped => self.skipped_scenarios += 1,
            ScenarioStatus::Undefined => self.undefined_scenarios += 1,
            ScenarioStatus::Pending | ScenarioStatus::Running => {}
        }
    }

    /// Records a step with the given status.
    pub fn record_step(&mut self, status: StepStatus) {
        self.total_steps += 1;
        match status {
            StepStatus::Passed => self.passed_steps += 1,
            StepStatus::Failed => self.failed_steps += 1,
            StepStatus::Skipped => self.skipped_steps += 1,
            StepStatus::Undefined => self.undefined_steps += 1,
            StepStatus::Pending | StepStatus::Running => {}
        }
    }

    /// Indicates whether any scenario failed or was undefined.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed_scenarios > 0 || self.undefined_scenarios > 0
    }
}
