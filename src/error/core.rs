// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Umbrella error type for fallible operations surfaced to the caller.
//!
//! Only errors that would corrupt reported results live here. Reporter and
//! shipping failures are isolated at their boundaries instead.

use std::io;

use derive_more::with_trait::{Display, Error as StdError};

use super::{ConfigError, LifecycleError, SerializationError};

/// Top-level error of this crate.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// Lifecycle method called from a wrong state.
    #[display("Lifecycle error: {_0}")]
    Lifecycle(LifecycleError),

    /// Execution report can't be rendered or read.
    #[display("Serialization error: {_0}")]
    Serialization(SerializationError),

    /// Invalid composition of reporters or shippers.
    #[display("Configuration error: {_0}")]
    Config(ConfigError),

    /// I/O error while persisting a report.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl From<LifecycleError> for Error {
    fn from(err: LifecycleError) -> Self {
        Self::Lifecycle(err)
    }
}

impl From<SerializationError> for Error {
    fn from(err: SerializationError) -> Self {
        Self::Serialization(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
