// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Immutable value objects shared by the lifecycle entities, the reporters
//! and the shippers.
//!
//! - [`id`]: [`ExecutionId`], [`ScenarioId`] and [`StepId`]
//! - [`elapsed`]: [`Elapsed`] durations and their renderings
//! - [`status`]: [`StepStatus`] and [`ScenarioStatus`]
//! - [`keyword`]: Gherkin step [`Keyword`]s
//! - [`event`]: names of the [`LifecycleEvent`]s broadcast to reporters
//! - [`time`]: RFC 3339 timestamp formatting

pub mod elapsed;
pub mod event;
pub mod id;
pub mod keyword;
pub mod status;
pub mod time;

pub use self::{
    elapsed::Elapsed,
    event::LifecycleEvent,
    id::{ExecutionId, ScenarioId, StepId},
    keyword::Keyword,
    status::{ScenarioStatus, StepStatus},
};
