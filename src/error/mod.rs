// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Error types, organized by the boundary they belong to.
//!
//! - [`lifecycle`]: [`LifecycleError`], a driver called a lifecycle method
//!   from the wrong state; always propagated
//! - [`serialization`]: [`SerializationError`], the report contract was
//!   violated; always propagated
//! - [`reporter`]: [`ReporterError`], one reporter's callback failed;
//!   isolated by the [`Coordinator`]
//! - [`shipping`]: [`ShippingError`], a sink delivery failed; retried,
//!   then degraded to the fallback
//! - [`config`]: [`ConfigError`], invalid composition
//! - [`core`]: the umbrella [`Error`]
//!
//! [`Coordinator`]: crate::Coordinator

pub mod config;
pub mod core;
pub mod lifecycle;
pub mod reporter;
pub mod serialization;
pub mod shipping;
pub mod utilities;

pub use self::{
    config::{ConfigError, ConfigResult},
    core::{Error, Result},
    lifecycle::{EntityKind, LifecycleError, LifecycleResult},
    reporter::{FailureKind, ReporterError},
    serialization::SerializationError,
    shipping::ShippingError,
    utilities::panic_message,
};
