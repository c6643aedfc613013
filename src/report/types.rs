// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Serializable shapes of the JSON execution report.

use std::{collections::BTreeMap, time::SystemTime};

use serde::{Deserialize, Serialize};

use crate::{
    value::{time, ExecutionId, Keyword, ScenarioId, ScenarioStatus, StepId, StepStatus},
    Execution, Scenario, Step,
};

/// Report of a whole [`Execution`].
///
/// Counters and durations are derived data: they're rendered from the
/// entities on write and recomputed from the timestamps and statuses on read.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ExecutionReport {
    /// [`Execution::id()`].
    pub execution_id: ExecutionId,

    /// [`Execution::started_at()`].
    #[serde(with = "time::rfc3339")]
    pub start_time: SystemTime,

    /// [`Execution::finished_at()`].
    #[serde(default, with = "time::rfc3339_option")]
    pub end_time: Option<SystemTime>,

    /// [`Execution::duration()`] in seconds.
    pub duration: f64,

    /// [`Execution::total_scenarios()`].
    pub total_scenarios: usize,

    /// [`Execution::passed_scenarios()`].
    pub passed_scenarios: usize,

    /// [`Execution::failed_scenarios()`].
    pub failed_scenarios: usize,

    /// [`Execution::total_steps()`].
    pub total_steps: usize,

    /// [`Execution::passed_steps()`].
    pub passed_steps: usize,

    /// [`Execution::failed_steps()`].
    pub failed_steps: usize,

    /// [`Execution::is_successful()`].
    pub is_successful: bool,

    /// [`Execution::skipped_scenarios()`].
    #[serde(default)]
    pub skipped_scenarios: usize,

    /// [`Execution::skipped_steps()`].
    #[serde(default)]
    pub skipped_steps: usize,

    /// [`Execution::metadata()`].
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Reports of every [`Scenario`] in execution order.
    pub scenarios: Vec<ScenarioReport>,
}

/// Report of a single [`Scenario`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ScenarioReport {
    /// [`Scenario::id()`].
    pub id: ScenarioId,

    /// [`Scenario::name()`].
    pub name: String,

    /// [`Scenario::feature_name()`].
    pub feature_name: String,

    /// [`Scenario::tags()`].
    pub tags: Vec<String>,

    /// [`Scenario::status()`].
    pub status: ScenarioStatus,

    /// [`Scenario::duration()`] in seconds.
    pub duration: f64,

    /// [`Scenario::started_at()`].
    #[serde(default, with = "time::rfc3339_option")]
    pub start_time: Option<SystemTime>,

    /// [`Scenario::finished_at()`].
    #[serde(default, with = "time::rfc3339_option")]
    pub end_time: Option<SystemTime>,

    /// Reports of every [`Step`] in order.
    pub steps: Vec<StepReport>,
}

/// Report of a single [`Step`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StepReport {
    /// [`Step::id()`].
    pub id: StepId,

    /// [`Step::name()`].
    pub name: String,

    /// [`Step::keyword()`].
    pub keyword: Keyword,

    /// [`Step::status()`].
    pub status: StepStatus,

    /// [`Step::duration()`] in seconds.
    pub duration: f64,

    /// [`Step::started_at()`].
    #[serde(default, with = "time::rfc3339_option")]
    pub start_time: Option<SystemTime>,

    /// [`Step::finished_at()`].
    #[serde(default, with = "time::rfc3339_option")]
    pub end_time: Option<SystemTime>,

    /// [`Step::error_message()`], `null` unless failed.
    pub error: Option<String>,
}

impl From<&Execution> for ExecutionReport {
    fn from(ex: &Execution) -> Self {
        let stats = ex.stats();
        Self {
            execution_id: ex.id().clone(),
            start_time: ex.started_at(),
            end_time: ex.finished_at(),
            duration: ex.duration().as_secs_f64(),
            total_scenarios: stats.total_scenarios,
            passed_scenarios: stats.passed_scenarios,
            failed_scenarios: stats.failed_scenarios,
            total_steps: stats.total_steps,
            passed_steps: stats.passed_steps,
            failed_steps: stats.failed_steps,
            is_successful: ex.is_successful(),
            skipped_scenarios: stats.skipped_scenarios,
            skipped_steps: stats.skipped_steps,
            metadata: ex.metadata().clone(),
            scenarios: ex.scenarios().iter().map(ScenarioReport::from).collect(),
        }
    }
}

impl From<&Scenario> for ScenarioReport {
    fn from(sc: &Scenario) -> Self {
        Self {
            id: sc.id(),
            name: sc.name().to_owned(),
            feature_name: sc.feature_name().to_owned(),
            tags: sc.tags().to_vec(),
            status: sc.status(),
            duration: sc.duration().as_secs_f64(),
            start_time: sc.started_at(),
            end_time: sc.finished_at(),
            steps: sc.steps().iter().map(StepReport::from).collect(),
        }
    }
}

impl From<&Step> for StepReport {
    fn from(st: &Step) -> Self {
        Self {
            id: st.id(),
            name: st.name().to_owned(),
            keyword: st.keyword(),
            status: st.status(),
            duration: st.duration().as_secs_f64(),
            start_time: st.started_at(),
            end_time: st.finished_at(),
            error: st.error_message().map(ToOwned::to_owned),
        }
    }
}
