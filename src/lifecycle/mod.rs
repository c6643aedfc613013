// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Lifecycle entities: [`Execution`] owns [`Scenario`]s, which own
//! [`Step`]s.
//!
//! A single driver mutates one [`Execution`]. Parallel workers, if any, must
//! each own a disjoint [`Scenario`] subtree.

pub mod execution;
pub mod scenario;
pub mod stats;
pub mod step;

pub use self::{
    execution::Execution,
    scenario::{derive_status, EmptyScenarioPolicy, Scenario},
    stats::Stats,
    step::Step,
};
