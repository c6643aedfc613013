// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! RFC 3339 timestamps with nanosecond precision.
//!
//! Nanosecond precision keeps a [`SystemTime`] intact through a
//! format-then-parse cycle, so reports re-serialize byte for byte.

use std::time::SystemTime;

use serde::{de, Deserialize as _, Deserializer, Serializer};

/// Formats `at` as an RFC 3339 UTC timestamp with nanoseconds.
#[must_use]
pub fn format(at: SystemTime) -> String {
    humantime::format_rfc3339_nanos(at).to_string()
}

/// Parses an RFC 3339 UTC timestamp.
///
/// # Errors
///
/// If `s` isn't a valid RFC 3339 timestamp.
pub fn parse(s: &str) -> Result<SystemTime, humantime::TimestampError> {
    humantime::parse_rfc3339(s)
}

/// [`serde`] adapter for a [`SystemTime`] field.
pub mod rfc3339 {
    use super::*;

    /// Serializes `at` as an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Propagates errors of the `serializer`.
    pub fn serialize<S: Serializer>(
        at: &SystemTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*at))
    }

    /// Deserializes an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// If the value isn't a string or isn't a valid timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<SystemTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }
}

/// [`serde`] adapter for an optional [`SystemTime`] field, rendered as an
/// explicit `null` when absent.
pub mod rfc3339_option {
    use super::*;

    /// Serializes `at` as an RFC 3339 string or `null`.
    ///
    /// # Errors
    ///
    /// Propagates errors of the `serializer`.
    pub fn serialize<S: Serializer>(
        at: &Option<SystemTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match at {
            Some(at) => serializer.serialize_some(&format(*at)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an RFC 3339 string or `null`.
    ///
    /// # Errors
    ///
    /// If the value is neither `null` nor a valid timestamp string.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SystemTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw).map_err(de::Error::custom))
            .transpose()
    }
}
