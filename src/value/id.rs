// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Identifiers of lifecycle entities.

use std::{
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
    time::SystemTime,
};

use derive_more::with_trait::{Display, Error};
use serde::{Deserialize, Serialize};

/// Identifier of an [`Execution`].
///
/// Always has the form `exec_<YYYYMMDDTHHMMSSZ>_<suffix>`, where the middle
/// segment is the UTC creation time with second precision and the suffix is
/// random lowercase hex. The timestamp is always recoverable through
/// [`ExecutionId::timestamp()`].
///
/// [`Execution`]: crate::Execution
#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(into = "String", try_from = "String")]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Prefix of every [`ExecutionId`].
    const PREFIX: &'static str = "exec_";

    /// Generates a new [`ExecutionId`] stamped with the current time.
    #[must_use]
    pub fn generate() -> Self {
        Self::at(SystemTime::now())
    }

    /// Generates a new [`ExecutionId`] stamped with the given time and a
    /// random suffix.
    #[must_use]
    pub fn at(at: SystemTime) -> Self {
        Self::from_parts(at, &format!("{:08x}", rand::random::<u32>()))
    }

    /// Builds an [`ExecutionId`] from its parts.
    fn from_parts(at: SystemTime, suffix: &str) -> Self {
        let compact: String = humantime::format_rfc3339_seconds(at)
            .to_string()
            .chars()
            .filter(|c| !matches!(c, '-' | ':'))
            .collect();
        Self(format!("{}{compact}_{suffix}", Self::PREFIX))
    }

    /// Returns the UTC creation time encoded in this [`ExecutionId`], with
    /// second precision.
    #[must_use]
    pub fn timestamp(&self) -> SystemTime {
        Self::split(&self.0)
            .and_then(|(stamp, _)| expand_timestamp(stamp))
            .unwrap_or_else(|| {
                unreachable!(
                    "the only ways to construct `ExecutionId` validate its \
                     format, so it always contains a parseable timestamp",
                )
            })
    }

    /// Returns the random suffix of this [`ExecutionId`].
    #[must_use]
    pub fn suffix(&self) -> &str {
        self.0.rsplit_once('_').map_or("", |(_, suffix)| suffix)
    }

    /// Returns this [`ExecutionId`] as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits a raw identifier into its timestamp and suffix segments.
    fn split(raw: &str) -> Option<(&str, &str)> {
        raw.strip_prefix(Self::PREFIX)?.rsplit_once('_')
    }
}

/// Turns a compact `YYYYMMDDTHHMMSSZ` stamp back into a [`SystemTime`].
fn expand_timestamp(stamp: &str) -> Option<SystemTime> {
    let bytes = stamp.as_bytes();
    let well_formed = bytes.len() == 16
        && bytes[8] == b'T'
        && bytes[15] == b'Z'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 8 || i == 15 || b.is_ascii_digit());
    if !well_formed {
        return None;
    }
    let rfc3339 = format!(
        "{}-{}-{}T{}:{}:{}Z",
        &stamp[0..4],
        &stamp[4..6],
        &stamp[6..8],
        &stamp[9..11],
        &stamp[11..13],
        &stamp[13..15],
    );
    humantime::parse_rfc3339(&rfc3339).ok()
}

/// Error of parsing an [`ExecutionId`].
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("malformed execution id `{raw}`: expected `exec_<YYYYMMDDTHHMMSSZ>_<suffix>`")]
pub struct ParseExecutionIdError {
    /// Raw input that failed to parse.
    pub raw: String,
}

impl FromStr for ExecutionId {
    type Err = ParseExecutionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = Self::split(s).is_some_and(|(stamp, suffix)| {
            !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_alphanumeric())
                && expand_timestamp(stamp).is_some()
        });
        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(ParseExecutionIdError { raw: s.to_owned() })
        }
    }
}

impl AsRef<str> for ExecutionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExecutionId {
    type Error = ParseExecutionIdError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<ExecutionId> for String {
    fn from(id: ExecutionId) -> Self {
        id.0
    }
}

/// Identifier of a [`Scenario`], unique within the process.
///
/// [`Scenario`]: crate::Scenario
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(transparent)]
pub struct ScenarioId(pub u64);

impl ScenarioId {
    /// Creates a new unique [`ScenarioId`].
    #[must_use]
    pub fn new() -> Self {
        /// [`AtomicU64`] ID.
        static ID: AtomicU64 = AtomicU64::new(0);

        Self(ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ScenarioId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a [`Step`], unique within the process.
///
/// [`Step`]: crate::Step
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(transparent)]
pub struct StepId(pub u64);

impl StepId {
    /// Creates a new unique [`StepId`].
    #[must_use]
    pub fn new() -> Self {
        /// [`AtomicU64`] ID.
        static ID: AtomicU64 = AtomicU64::new(0);

        Self(ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}
