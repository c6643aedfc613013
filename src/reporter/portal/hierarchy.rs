// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Bookkeeping of portal items opened for lifecycle entities.

use std::collections::{HashMap, HashSet};

use crate::value::{ScenarioId, ScenarioStatus, StepId};

use super::client::{ItemId, ItemStatus};

/// Suite item opened for a feature.
#[derive(Debug)]
struct Suite {
    /// Name of the feature.
    feature: String,

    /// Portal item of the suite.
    item: ItemId,

    /// Whether any scenario of the feature failed.
    failed: bool,

    /// Whether any scenario of the feature passed.
    passed: bool,
}

impl Suite {
    /// Aggregated [`ItemStatus`] of the scenarios finished so far.
    const fn status(&self) -> ItemStatus {
        if self.failed {
            ItemStatus::Failed
        } else if self.passed {
            ItemStatus::Passed
        } else {
            ItemStatus::Skipped
        }
    }
}

/// Mapping of launch → suite → test → step to portal items.
///
/// Every open scenario owns a stack of parent items: the test item at the
/// bottom and the nested steps above it. Interleaved scenarios never share a
/// stack, so their steps always land under the right parent.
#[derive(Debug, Default)]
pub(super) struct Hierarchy {
    /// Open launch.
    launch: Option<ItemId>,

    /// Open suites in creation order.
    suites: Vec<Suite>,

    /// Parent stacks of open scenarios.
    stacks: HashMap<ScenarioId, Vec<ItemId>>,

    /// Open step items.
    steps: HashMap<StepId, ItemId>,

    /// Steps already logged as plain messages.
    logged: HashSet<StepId>,
}

impl Hierarchy {
    /// Returns the open launch.
    pub(super) const fn launch(&self) -> Option<&ItemId> {
        self.launch.as_ref()
    }

    /// Registers the opened launch.
    pub(super) fn open_launch(&mut self, launch: ItemId) {
        self.launch = Some(launch);
    }

    /// Removes the open launch, returning it.
    pub(super) fn take_launch(&mut self) -> Option<ItemId> {
        self.launch.take()
    }

    /// Returns the open suite item of a `feature`.
    pub(super) fn suite(&self, feature: &str) -> Option<&ItemId> {
        self.suites.iter().find(|s| s.feature == feature).map(|s| &s.item)
    }

    /// Registers an opened suite item of a `feature`.
    pub(super) fn open_suite(&mut self, feature: &str, item: ItemId) {
        self.suites.push(Suite {
            feature: feature.to_owned(),
            item,
            failed: false,
            passed: false,
        });
    }

    /// Folds the final status of a scenario into its feature's suite.
    pub(super) fn record_outcome(&mut self, feature: &str, status: ScenarioStatus) {
        if let Some(suite) = self.suites.iter_mut().find(|s| s.feature == feature) {
            suite.failed |= status.is_failure();
            suite.passed |= status.is_successful();
        }
    }

    /// Removes every open suite, returning it with its aggregated status.
    pub(super) fn drain_suites(&mut self) -> Vec<(ItemId, ItemStatus)> {
        self.suites
            .drain(..)
            .map(|s| {
                let status = s.status();
                (s.item, status)
            })
            .collect()
    }

    /// Returns the test item of an open scenario.
    pub(super) fn test(&self, scenario: ScenarioId) -> Option<&ItemId> {
        self.stacks.get(&scenario).and_then(|s| s.first())
    }

    /// Registers the opened test item of a scenario as the bottom of its
    /// parent stack.
    pub(super) fn open_test(&mut self, scenario: ScenarioId, item: ItemId) {
        drop(self.stacks.insert(scenario, vec![item]));
    }

    /// Closes an open scenario, returning its test item.
    pub(super) fn close_test(&mut self, scenario: ScenarioId) -> Option<ItemId> {
        let stack = self.stacks.remove(&scenario)?;
        for item in &stack[1..] {
            self.steps.retain(|_, open| open != item);
        }
        stack.into_iter().next()
    }

    /// Removes every open scenario, returning all its open items innermost
    /// first: step items precede the test item holding them.
    pub(super) fn drain_open_items(&mut self) -> Vec<ItemId> {
        let stacks: Vec<_> = self.stacks.drain().map(|(_, s)| s).collect();
        let mut items: Vec<_> = self
            .steps
            .drain()
            .map(|(_, item)| item)
            .filter(|item| !stacks.iter().any(|s| s.contains(item)))
            .collect();
        for stack in &stacks {
            items.extend(stack.iter().skip(1).rev().cloned());
        }
        items.extend(stacks.into_iter().filter_map(|s| s.into_iter().next()));
        items
    }

    /// Returns the innermost open item of a scenario, under which its next
    /// nested step goes.
    pub(super) fn parent(&self, scenario: ScenarioId) -> Option<&ItemId> {
        self.stacks.get(&scenario).and_then(|s| s.last())
    }

    /// Registers an open step item, pushing it onto the scenario's parent
    /// stack if `nest`ed.
    pub(super) fn open_step(
        &mut self,
        scenario: ScenarioId,
        step: StepId,
        item: ItemId,
        nest: bool,
    ) {
        if nest {
            if let Some(stack) = self.stacks.get_mut(&scenario) {
                stack.push(item.clone());
            }
        }
        drop(self.steps.insert(step, item));
    }

    /// Returns the open item of a step.
    pub(super) fn step(&self, step: StepId) -> Option<&ItemId> {
        self.steps.get(&step)
    }

    /// Closes an open step item, removing it from its scenario's parent
    /// stack.
    pub(super) fn close_step(&mut self, scenario: ScenarioId, step: StepId) -> Option<ItemId> {
        let item = self.steps.remove(&step)?;
        if let Some(stack) = self.stacks.get_mut(&scenario) {
            if let Some(pos) = stack.iter().skip(1).position(|open| *open == item) {
                drop(stack.remove(pos + 1));
            }
        }
        Some(item)
    }

    /// Marks a step as logged, returning `false` if it was already.
    pub(super) fn mark_logged(&mut self, step: StepId) -> bool {
        self.logged.insert(step)
    }
}
