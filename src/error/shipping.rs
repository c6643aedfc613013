// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Errors of delivering a batch of log records to a [`Sink`].
//!
//! They are retried per [`RetryPolicy`] and degrade to the local fallback on
//! exhaustion, so never reach the test driver.
//!
//! [`RetryPolicy`]: crate::shipper::RetryPolicy
//! [`Sink`]: crate::shipper::Sink

use std::{io, time::Duration};

use derive_more::with_trait::{Display, Error};

/// Error of a single delivery attempt.
#[derive(Debug, Display, Error)]
pub enum ShippingError {
    /// Sink didn't answer within the bounded timeout.
    #[display("sink `{sink}` timed out after {}", humantime::format_duration(*timeout))]
    Timeout {
        /// Name of the sink.
        #[error(not(source))]
        sink: String,

        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// Sink refused or failed to accept the batch.
    #[display("sink `{sink}` rejected batch: {message}")]
    Rejected {
        /// Name of the sink.
        #[error(not(source))]
        sink: String,

        /// Rendered cause.
        #[error(not(source))]
        message: String,
    },

    /// Record couldn't be encoded.
    #[display("failed to encode log record: {_0}")]
    Encode(serde_json::Error),

    /// I/O error of a local sink or fallback.
    #[display("I/O error: {_0}")]
    Io(io::Error),
}

impl ShippingError {
    /// Creates a [`ShippingError::Rejected`] from an error of a sink.
    #[must_use]
    pub fn rejected(sink: impl Into<String>, cause: &anyhow::Error) -> Self {
        Self::Rejected {
            sink: sink.into(),
            message: format!("{cause:#}"),
        }
    }

    /// Returns true if this is a [`ShippingError::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<io::Error> for ShippingError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ShippingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_renders_human_duration() {
        let err = ShippingError::Timeout {
            sink: "signoz".into(),
            timeout: Duration::from_millis(1500),
        };

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "sink `signoz` timed out after 1s 500ms");
    }

    #[test]
    fn io_keeps_source() {
        use std::error::Error as _;

        let err = ShippingError::from(io::Error::new(io::ErrorKind::Other, "disk full"));

        assert!(!err.is_timeout());
        assert!(err.source().is_some());
    }
}
