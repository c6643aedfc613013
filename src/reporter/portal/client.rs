// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Port to a third-party test-management system.

use std::{collections::BTreeMap, time::SystemTime};

use async_trait::async_trait;
use derive_more::with_trait::{Display, From, Into};
use mime::Mime;

use crate::value::{ScenarioStatus, StepStatus};

/// Identifier the portal assigned to a launch or an item.
#[derive(Clone, Debug, Display, Eq, From, Hash, Into, PartialEq)]
pub struct ItemId(pub String);

/// Kind of a portal item.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ItemKind {
    /// Feature.
    #[display("suite")]
    Suite,

    /// Scenario, or a step reported as a flat test.
    #[display("test")]
    Test,

    /// Nested step.
    #[display("step")]
    Step,
}

/// Final status of a portal item.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ItemStatus {
    /// Passed.
    #[display("passed")]
    Passed,

    /// Failed, including undefined steps.
    #[display("failed")]
    Failed,

    /// Skipped.
    #[display("skipped")]
    Skipped,

    /// Never reached a terminal status.
    #[display("interrupted")]
    Interrupted,
}

impl From<StepStatus> for ItemStatus {
    fn from(status: StepStatus) -> Self {
        match status {
            StepStatus::Passed => Self::Passed,
            StepStatus::Failed | StepStatus::Undefined => Self::Failed,
            StepStatus::Skipped => Self::Skipped,
            StepStatus::Pending | StepStatus::Running => Self::Interrupted,
        }
    }
}

impl From<ScenarioStatus> for ItemStatus {
    fn from(status: ScenarioStatus) -> Self {
        match status {
            ScenarioStatus::Passed => Self::Passed,
            ScenarioStatus::Failed | ScenarioStatus::Undefined => Self::Failed,
            ScenarioStatus::Skipped => Self::Skipped,
            ScenarioStatus::Pending | ScenarioStatus::Running => Self::Interrupted,
        }
    }
}

/// Severity of a portal log entry.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum LogLevel {
    /// Informational.
    #[display("info")]
    Info,

    /// Warning.
    #[display("warn")]
    Warn,

    /// Error.
    #[display("error")]
    Error,
}

/// Request to open a launch.
#[derive(Clone, Copy, Debug)]
pub struct NewLaunch<'a> {
    /// Name of the launch.
    pub name: &'a str,

    /// Time the execution started.
    pub start_time: SystemTime,

    /// Execution metadata as launch attributes.
    pub attributes: &'a BTreeMap<String, String>,
}

/// Request to open an item.
#[derive(Clone, Copy, Debug)]
pub struct NewItem<'a> {
    /// Launch the item belongs to.
    pub launch: &'a ItemId,

    /// Parent item, if any.
    pub parent: Option<&'a ItemId>,

    /// Display name.
    pub name: &'a str,

    /// Kind of the item.
    pub kind: ItemKind,

    /// Start time.
    pub start_time: SystemTime,

    /// Tags as item attributes.
    pub tags: &'a [String],

    /// Whether the item counts in the launch statistics.
    pub has_stats: bool,
}

/// Binary payload of a log entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    /// File name.
    pub name: String,

    /// Content type.
    pub mime: Mime,

    /// Content, possibly cut at the size cap.
    pub data: Vec<u8>,

    /// Whether `data` was cut at the size cap.
    pub truncated: bool,
}

/// Log entry attached to an item.
#[derive(Clone, Debug)]
pub struct LogEntry {
    /// Time of the entry.
    pub time: SystemTime,

    /// Severity.
    pub level: LogLevel,

    /// Text of the entry.
    pub message: String,

    /// Optional binary payload.
    pub attachment: Option<Attachment>,
}

/// Client of a third-party test-management portal.
///
/// Mirrors the launch → suite → test → step hierarchy such portals expose.
#[async_trait]
pub trait PortalClient: Send {
    /// Opens a new launch and returns its identifier.
    async fn start_launch(&mut self, launch: NewLaunch<'_>) -> anyhow::Result<ItemId>;

    /// Opens a new item and returns its identifier.
    async fn start_item(&mut self, item: NewItem<'_>) -> anyhow::Result<ItemId>;

    /// Closes an item with the given final status.
    async fn finish_item(
        &mut self,
        item: &ItemId,
        status: ItemStatus,
        end_time: SystemTime,
    ) -> anyhow::Result<()>;

    /// Attaches a log entry to an item.
    async fn log(&mut self, item: &ItemId, entry: LogEntry) -> anyhow::Result<()>;

    /// Closes a launch.
    async fn finish_launch(&mut self, launch: &ItemId, end_time: SystemTime) -> anyhow::Result<()>;
}

#[async_trait]
impl<C: PortalClient + ?Sized> PortalClient for Box<C> {
    async fn start_launch(&mut self, launch: NewLaunch<'_>) -> anyhow::Result<ItemId> {
        (**self).start_launch(launch).await
    }

    async fn start_item(&mut self, item: NewItem<'_>) -> anyhow::Result<ItemId> {
        (**self).start_item(item).await
    }

    async fn finish_item(
        &mut self,
        item: &ItemId,
        status: ItemStatus,
        end_time: SystemTime,
    ) -> anyhow::Result<()> {
        (**self).finish_item(item, status, end_time).await
    }

    async fn log(&mut self, item: &ItemId, entry: LogEntry) -> anyhow::Result<()> {
        (**self).log(item, entry).await
    }

    async fn finish_launch(&mut self, launch: &ItemId, end_time: SystemTime) -> anyhow::Result<()> {
        (**self).finish_launch(launch, end_time).await
    }
}
