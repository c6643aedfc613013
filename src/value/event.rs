// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Names of lifecycle events.

use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};

/// Lifecycle event broadcast to every [`Reporter`] and recorded into every
/// [`Shipper`].
///
/// [`Reporter`]: crate::Reporter
/// [`Shipper`]: crate::Shipper
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// [`Execution`] started.
    ///
    /// [`Execution`]: crate::Execution
    #[display("start_execution")]
    StartExecution,

    /// [`Execution`] completed.
    ///
    /// [`Execution`]: crate::Execution
    #[display("end_execution")]
    EndExecution,

    /// [`Scenario`] started.
    ///
    /// [`Scenario`]: crate::Scenario
    #[display("start_scenario")]
    StartScenario,

    /// [`Scenario`] completed.
    ///
    /// [`Scenario`]: crate::Scenario
    #[display("end_scenario")]
    EndScenario,

    /// [`Step`] started.
    ///
    /// [`Step`]: crate::Step
    #[display("start_step")]
    StartStep,

    /// [`Step`] reached a terminal status.
    ///
    /// [`Step`]: crate::Step
    #[display("end_step")]
    EndStep,

    /// [`Artifact`] attached.
    ///
    /// [`Artifact`]: crate::Artifact
    #[display("attach")]
    Attach,
}
