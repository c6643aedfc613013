// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Structured log records shipped to external sinks.

use std::{collections::BTreeMap, time::SystemTime};

use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};

use crate::value::{time, ExecutionId, LifecycleEvent};

/// Severity of a [`LogRecord`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Detailed progress.
    #[display("debug")]
    Debug,

    /// Lifecycle progress.
    #[display("info")]
    Info,

    /// Recoverable problem.
    #[display("warn")]
    Warn,

    /// Failure.
    #[display("error")]
    Error,
}

/// Single structured log record.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LogRecord {
    /// Time the record was made.
    #[serde(with = "time::rfc3339")]
    pub timestamp: SystemTime,

    /// Severity.
    pub level: Level,

    /// Lifecycle event the record describes, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<LifecycleEvent>,

    /// Human-readable text.
    pub message: String,

    /// [`Execution`] the record belongs to.
    ///
    /// [`Execution`]: crate::Execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<ExecutionId>,

    /// Name of the [`Scenario`] the record belongs to.
    ///
    /// [`Scenario`]: crate::Scenario
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,

    /// Name of the [`Step`] the record belongs to.
    ///
    /// [`Step`]: crate::Step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,

    /// Additional structured fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Creates a new [`LogRecord`] stamped with the current time.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            event: None,
            message: message.into(),
            execution_id: None,
            scenario: None,
            step: None,
            fields: BTreeMap::new(),
        }
    }

    /// Sets the [`LifecycleEvent`] of this [`LogRecord`].
    #[must_use]
    pub fn event(mut self, event: LifecycleEvent) -> Self {
        self.event = Some(event);
        self
    }

    /// Sets the [`ExecutionId`] of this [`LogRecord`].
    #[must_use]
    pub fn execution(mut self, id: &ExecutionId) -> Self {
        self.execution_id = Some(id.clone());
        self
    }

    /// Sets the scenario name of this [`LogRecord`].
    #[must_use]
    pub fn scenario(mut self, name: impl Into<String>) -> Self {
        self.scenario = Some(name.into());
        self
    }

    /// Sets the step name of this [`LogRecord`].
    #[must_use]
    pub fn step(mut self, name: impl Into<String>) -> Self {
        self.step = Some(name.into());
        self
    }

    /// Adds a structured field to this [`LogRecord`].
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        drop(self.fields.insert(key.into(), value.into()));
        self
    }
}
