// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Destinations receiving lifecycle events for live and structured
//! reporting.
//!
//! - [`coordinator`]: fans every event out to all [`Reporter`]s, isolating
//!   failures
//! - [`console`]: live terminal output
//! - [`json`]: JSON execution report file
//! - [`portal`]: third-party test-management system

pub mod console;
pub mod coordinator;
pub mod json;
pub mod portal;

use async_trait::async_trait;

use crate::{Artifact, Execution, Scenario, Step};

#[doc(inline)]
pub use self::{
    console::ConsoleReporter,
    coordinator::Coordinator,
    json::JsonReporter,
    portal::PortalReporter,
};

/// Destination of lifecycle events.
///
/// The [`Coordinator`] calls a [`Reporter`] sequentially, so it always sees
/// `start_scenario` before `end_scenario` of the same [`Scenario`].
///
/// Implementations must tolerate the same snapshot being delivered more
/// than once (for example a duplicate `end_step` on retry) without
/// corrupting their state. Returned errors and panics are caught by the
/// [`Coordinator`] and never reach the driver.
#[async_trait]
pub trait Reporter: Send {
    /// Identity of this [`Reporter`] used in logs.
    fn name(&self) -> &str;

    /// Handles the start of an [`Execution`].
    async fn start_execution(&mut self, execution: &Execution) -> anyhow::Result<()>;

    /// Handles the completion of an [`Execution`].
    async fn end_execution(&mut self, execution: &Execution) -> anyhow::Result<()>;

    /// Handles the start of a [`Scenario`].
    async fn start_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()>;

    /// Handles the completion of a [`Scenario`].
    async fn end_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()>;

    /// Handles the start of a [`Step`] of the given [`Scenario`].
    async fn start_step(&mut self, scenario: &Scenario, step: &Step) -> anyhow::Result<()>;

    /// Handles a [`Step`] of the given [`Scenario`] reaching a terminal
    /// status.
    async fn end_step(&mut self, scenario: &Scenario, step: &Step) -> anyhow::Result<()>;

    /// Handles an [`Artifact`] attached to a [`Scenario`] or one of its
    /// [`Step`]s. Ignored by default.
    async fn attach(
        &mut self,
        scenario: &Scenario,
        step: Option<&Step>,
        artifact: &Artifact,
    ) -> anyhow::Result<()> {
        _ = (scenario, step, artifact);
        Ok(())
    }
}
