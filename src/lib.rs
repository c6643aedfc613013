// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lifecycle model and multi-destination reporting of BDD test executions.
//!
//! A test runner drives a [`Session`], which applies every transition to the
//! [`Execution`], [`Scenario`] and [`Step`] state machines, and then
//! broadcasts it:
//! - to every [`Reporter`] through the [`Coordinator`], which isolates a
//!   failing or panicking reporter from the others and from the run;
//! - to every [`Shipper`] as a structured [`LogRecord`], batched and retried
//!   with exponential backoff, falling back to a local file once retries are
//!   exhausted.
//!
//! Once the [`Execution`] completes, the [`JsonReporter`] writes its JSON
//! report, which [`report::from_json()`] reads back into an equivalent
//! [`Execution`].
//!
//! [`JsonReporter`]: reporter::JsonReporter
//! [`LogRecord`]: shipper::LogRecord

#![deny(nonstandard_style, trivial_casts, trivial_numeric_casts)]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::missing_docs_in_private_items,
    clippy::print_stderr,
    clippy::str_to_string,
    clippy::unwrap_used,
    future_incompatible,
    let_underscore_drop,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_must_use,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod artifact;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod report;
pub mod reporter;
pub mod session;
pub mod shipper;
pub mod value;

#[doc(inline)]
pub use self::{
    artifact::{Artifact, ArtifactKind},
    config::{ReportingConfig, ShipperConfig},
    error::{Error, Result},
    lifecycle::{EmptyScenarioPolicy, Execution, Scenario, Stats, Step},
    logging::Logger,
    reporter::{Coordinator, Reporter},
    session::Session,
    shipper::Shipper,
};
