// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Statuses of lifecycle entities.

use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};

/// Status of a [`Step`].
///
/// [`Pending`] and [`Running`] are the only non-terminal statuses.
///
/// [`Pending`]: StepStatus::Pending
/// [`Running`]: StepStatus::Running
/// [`Step`]: crate::Step
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Created, not started yet.
    #[default]
    #[display("pending")]
    Pending,

    /// Started, not finished yet.
    #[display("running")]
    Running,

    /// Finished successfully.
    #[display("passed")]
    Passed,

    /// Finished with an error.
    #[display("failed")]
    Failed,

    /// Not executed.
    #[display("skipped")]
    Skipped,

    /// No step definition matched.
    #[display("undefined")]
    Undefined,
}

impl StepStatus {
    /// Indicates whether no further transition is allowed from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

/// Status of a [`Scenario`].
///
/// Once a [`Scenario`] has steps, its terminal status is always derived from
/// them by [`Scenario::complete()`].
///
/// [`Scenario`]: crate::Scenario
/// [`Scenario::complete()`]: crate::Scenario::complete
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Created, not started yet.
    #[default]
    #[display("pending")]
    Pending,

    /// Started, not completed yet.
    #[display("running")]
    Running,

    /// Every executed step passed.
    #[display("passed")]
    Passed,

    /// At least one step failed.
    #[display("failed")]
    Failed,

    /// Every step was skipped.
    #[display("skipped")]
    Skipped,

    /// At least one step had no matching definition.
    #[display("undefined")]
    Undefined,
}

impl ScenarioStatus {
    /// Indicates whether no further transition is allowed from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    /// Indicates whether this status counts as a success.
    #[must_use]
    pub const fn is_successful(self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Indicates whether this status counts as a failure of the run.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminality() {
        use StepStatus as S;

        for s in [S::Pending, S::Running] {
            assert!(!s.is_terminal(), "{s}");
        }
        for s in [S::Passed, S::Failed, S::Skipped, S::Undefined] {
            assert!(s.is_terminal(), "{s}");
        }
        assert!(!ScenarioStatus::Running.is_terminal());
        assert!(ScenarioStatus::Skipped.is_terminal());
    }

    #[test]
    fn only_passed_is_successful() {
        assert!(ScenarioStatus::Passed.is_successful());
        assert!(!ScenarioStatus::Skipped.is_successful());
        assert!(ScenarioStatus::Undefined.is_failure());
        assert!(!ScenarioStatus::Skipped.is_failure());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&StepStatus::Undefined).unwrap(), "\"undefined\"");
        assert_eq!(
            serde_json::from_str::<ScenarioStatus>("\"failed\"").unwrap(),
            ScenarioStatus::Failed,
        );
        assert_eq!(ScenarioStatus::Passed.to_string(), "passed");
    }
}
