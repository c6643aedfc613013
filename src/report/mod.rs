// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! JSON execution report: the stable contract consumed by dashboards and CI
//! tooling.
//!
//! [`to_json()`] renders an [`Execution`] and [`from_json()`] reads it back.
//! Timestamps carry nanoseconds, so a completed [`Execution`] survives the
//! round trip and re-renders byte for byte.

mod types;

use std::time::SystemTime;

use crate::{
    error::SerializationError,
    lifecycle::{derive_status, EmptyScenarioPolicy},
    value::StepStatus,
    Execution, Scenario, Step,
};

pub use self::types::{ExecutionReport, ScenarioReport, StepReport};

/// Renders the given [`Execution`] as a pretty-printed JSON report.
///
/// # Errors
///
/// Only if [`serde_json`] fails to encode, which doesn't happen for
/// well-formed entities.
pub fn to_json(execution: &Execution) -> Result<String, SerializationError> {
    Ok(serde_json::to_string_pretty(&ExecutionReport::from(execution))?)
}

/// Reads an [`Execution`] back from a JSON report.
///
/// # Errors
///
/// If the `json` is malformed, or describes entities violating their
/// invariants.
pub fn from_json(json: &str) -> Result<Execution, SerializationError> {
    serde_json::from_str::<ExecutionReport>(json)?.into_execution()
}

impl ExecutionReport {
    /// Reassembles the [`Execution`] this report describes.
    ///
    /// # Errors
    ///
    /// With [`SerializationError::Inconsistent`] if the report violates an
    /// invariant of the entities.
    pub fn into_execution(self) -> Result<Execution, SerializationError> {
        ensure_ordered("execution", Some(self.start_time), self.end_time)?;
        let scenarios = self
            .scenarios
            .into_iter()
            .map(ScenarioReport::into_scenario)
            .collect::<Result<_, _>>()?;
        Ok(Execution::restore(
            self.execution_id,
            self.start_time,
            self.end_time,
            scenarios,
            self.metadata,
        ))
    }
}

impl ScenarioReport {
    /// Reassembles the [`Scenario`] this report describes.
    ///
    /// # Errors
    ///
    /// With [`SerializationError::Inconsistent`] if the status contradicts
    /// the steps, or the timestamps are out of order.
    pub fn into_scenario(self) -> Result<Scenario, SerializationError> {
        let what = format!("scenario `{}`", self.name);
        ensure_ordered(&what, self.start_time, self.end_time)?;
        let steps = self
            .steps
            .into_iter()
            .map(StepReport::into_step)
            .collect::<Result<Vec<_>, _>>()?;
        if self.status.is_terminal() && !steps.is_empty() {
            let derived = derive_status(
                steps.iter().map(Step::status),
                EmptyScenarioPolicy::default(),
            );
            if derived != self.status {
                return Err(SerializationError::inconsistent(format!(
                    "{what} is `{}` but its steps give `{derived}`",
                    self.status,
                )));
            }
        }
        Ok(Scenario::restore(
            self.id,
            self.name,
            self.feature_name,
            self.tags,
            steps,
            self.status,
            self.start_time,
            self.end_time,
        ))
    }
}

impl StepReport {
    /// Reassembles the [`Step`] this report describes.
    ///
    /// # Errors
    ///
    /// With [`SerializationError::Inconsistent`] if a failed step has no
    /// error message, or the timestamps are out of order.
    pub fn into_step(self) -> Result<Step, SerializationError> {
        let what = format!("step `{} {}`", self.keyword, self.name);
        ensure_ordered(&what, self.start_time, self.end_time)?;
        let has_error = self.error.as_deref().is_some_and(|e| !e.trim().is_empty());
        if self.status == StepStatus::Failed && !has_error {
            return Err(SerializationError::inconsistent(format!(
                "{what} failed without an error message",
            )));
        }
        Ok(Step::restore(
            self.id,
            self.keyword,
            self.name,
            self.status,
            self.start_time,
            self.end_time,
            self.error,
        ))
    }
}

/// Checks that the `end` of `what` doesn't precede its `start`.
fn ensure_ordered(
    what: &str,
    start: Option<SystemTime>,
    end: Option<SystemTime>,
) -> Result<(), SerializationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(SerializationError::inconsistent(
            format!("{what} ends before it starts"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::value::{Keyword, ScenarioStatus};

    fn finished_execution() -> Execution {
        let mut ex = Execution::new().with_metadata("env", "staging");

        let sc = ex.add_scenario("Login", "Auth", ["@smoke", "@auth"]).unwrap();
        sc.start().unwrap();
        let st = sc.add_step(Keyword::Given, "a user").unwrap();
        st.start().unwrap();
        st.complete_successfully().unwrap();
        let st = sc.add_step(Keyword::Then, "it fails").unwrap();
        st.start().unwrap();
        st.fail("expected 200, got 500").unwrap();
        sc.complete().unwrap();

        let sc = ex.add_scenario("Logout", "Auth", ["@auth"]).unwrap();
        sc.start().unwrap();
        let st = sc.add_step(Keyword::When, "I log out").unwrap();
        st.start().unwrap();
        st.complete_successfully().unwrap();
        sc.complete().unwrap();

        ex.complete();
        ex
    }

    #[test]
    fn renders_schema_fields() {
        let ex = finished_execution();
        let json: Value = serde_json::from_str(&to_json(&ex).unwrap()).unwrap();

        assert_eq!(json["execution_id"], ex.id().as_str());
        assert_eq!(json["total_scenarios"], 2);
        assert_eq!(json["passed_scenarios"], 1);
        assert_eq!(json["failed_scenarios"], 1);
        assert_eq!(json["total_steps"], 3);
        assert_eq!(json["passed_steps"], 2);
        assert_eq!(json["failed_steps"], 1);
        assert_eq!(json["is_successful"], false);
        assert_eq!(json["metadata"]["env"], "staging");
        assert!(json["duration"].is_f64());

        let first = &json["scenarios"][0];
        assert_eq!(first["name"], "Login");
        assert_eq!(first["feature_name"], "Auth");
        assert_eq!(first["tags"], serde_json::json!(["@smoke", "@auth"]));
        assert_eq!(first["status"], "failed");
        assert_eq!(first["steps"][0]["keyword"], "Given");
        assert_eq!(first["steps"][0]["status"], "passed");
        assert_eq!(first["steps"][0]["error"], Value::Null);
        assert_eq!(first["steps"][1]["error"], "expected 200, got 500");
    }

    #[test]
    fn keeps_top_level_field_order() {
        let json = to_json(&finished_execution()).unwrap();
        let position = |key: &str| json.find(&format!("\"{key}\"")).unwrap();

        let keys = [
            "execution_id",
            "start_time",
            "end_time",
            "duration",
            "total_scenarios",
            "passed_scenarios",
            "failed_scenarios",
            "total_steps",
            "passed_steps",
            "failed_steps",
            "is_successful",
        ];
        for pair in keys.windows(2) {
            assert!(position(pair[0]) < position(pair[1]), "{pair:?}");
        }
    }

    #[test]
    fn round_trips_byte_for_byte() {
        let ex = finished_execution();
        let json = to_json(&ex).unwrap();

        let restored = from_json(&json).unwrap();

        assert_eq!(restored, ex);
        assert_eq!(to_json(&restored).unwrap(), json);
    }

    #[test]
    fn renders_unfinished_execution_with_nulls() {
        let mut ex = Execution::new();
        _ = ex.add_scenario("s", "f", ["@t"]).unwrap();
        let json: Value = serde_json::from_str(&to_json(&ex).unwrap()).unwrap();

        assert_eq!(json["end_time"], Value::Null);
        assert_eq!(json["duration"], 0.0);
        assert_eq!(json["scenarios"][0]["status"], "pending");
        assert_eq!(json["scenarios"][0]["start_time"], Value::Null);
    }

    #[test]
    fn rejects_status_contradicting_steps() {
        let mut report = ExecutionReport::from(&finished_execution());
        report.scenarios[0].status = ScenarioStatus::Passed;

        let err = report.into_execution().unwrap_err();

        assert!(matches!(err, SerializationError::Inconsistent { .. }), "{err}");
        assert!(err.to_string().contains("Login"), "{err}");
    }

    #[test]
    fn rejects_failed_step_without_error() {
        let mut report = ExecutionReport::from(&finished_execution());
        report.scenarios[0].steps[1].error = None;

        assert!(report.into_execution().is_err());
    }

    #[test]
    fn rejects_reversed_timestamps() {
        let mut report = ExecutionReport::from(&finished_execution());
        report.end_time = Some(SystemTime::UNIX_EPOCH);

        assert!(report.into_execution().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(from_json("{"), Err(SerializationError::Json(_))));
        assert!(matches!(
            from_json(r#"{"execution_id": "nope"}"#),
            Err(SerializationError::Json(_)),
        ));
    }
}
