// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Configuration and composition errors.
//!
//! These are the only errors the [`Coordinator`] surfaces itself.
//!
//! [`Coordinator`]: crate::Coordinator

use derive_more::with_trait::{Display, Error};

/// Error of composing reporters or shippers from configuration.
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum ConfigError {
    /// [`Coordinator`] built without any reporter.
    ///
    /// [`Coordinator`]: crate::Coordinator
    #[display("at least one reporter must be configured")]
    NoReporters,

    /// `portal` mode requested without a client to talk to.
    #[display("`portal` report mode requires a portal client")]
    MissingPortalClient,

    /// `json` mode requested without an output path.
    #[display("`json` report mode requires an output path")]
    MissingJsonPath,

    /// Batch size of zero.
    #[display("batch size must be positive")]
    InvalidBatchSize,

    /// Backoff that would shrink between attempts.
    #[display("backoff multiplier must be at least 1.0, got {multiplier}")]
    InvalidBackoff {
        /// Configured multiplier.
        multiplier: f64,
    },

    /// Zero duration where a positive one is required.
    #[display("`{option}` must be positive")]
    ZeroDuration {
        /// Name of the option.
        #[error(not(source))]
        option: &'static str,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
