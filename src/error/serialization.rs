// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Errors of rendering or reading the JSON execution report.

use derive_more::with_trait::{Display, Error};

/// Error of the execution report serialization contract.
///
/// Rendering is total over well-formed entities, so seeing this on the
/// writing side means a programmer error.
#[derive(Debug, Display, Error)]
pub enum SerializationError {
    /// JSON encoding or decoding failed.
    #[display("malformed execution report: {_0}")]
    Json(serde_json::Error),

    /// Report decoded, but doesn't describe valid entities.
    #[display("inconsistent execution report: {reason}")]
    Inconsistent {
        /// What's wrong.
        #[error(not(source))]
        reason: String,
    },
}

impl SerializationError {
    /// Creates a new [`SerializationError::Inconsistent`].
    #[must_use]
    pub fn inconsistent(reason: impl Into<String>) -> Self {
        Self::Inconsistent { reason: reason.into() }
    }
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_json_errors() {
        let err: SerializationError = serde_json::from_str::<u8>("[").unwrap_err().into();

        assert!(err.to_string().starts_with("malformed execution report"));
    }
}
