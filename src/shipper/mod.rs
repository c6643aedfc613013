// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Shipping structured lifecycle logs to external sinks.
//!
//! - [`record`]: the [`LogRecord`] being shipped
//! - [`sink`]: [`Sink`]s receiving batches and the local [`Fallback`]
//! - [`retry`]: exponential backoff schedule
//! - [`batch`]: [`BatchShipper`] buffering, retrying and falling back
//! - [`set`]: [`ShipperSet`] driving several [`Shipper`]s independently

pub mod batch;
pub mod record;
pub mod retry;
pub mod set;
pub mod sink;

use async_trait::async_trait;

#[doc(inline)]
pub use self::{
    batch::BatchShipper,
    record::{Level, LogRecord},
    retry::RetryPolicy,
    set::ShipperSet,
    sink::{Fallback, JsonLinesFile, Sink},
};

/// Outcome of handing records to a [`Shipper`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FlushOutcome {
    /// Nothing to deliver.
    Empty,

    /// Records were buffered, waiting for a flush.
    Buffered {
        /// Number of records waiting in the buffer.
        pending: usize,
    },

    /// Records were accepted by the [`Sink`].
    Shipped {
        /// Number of delivered records.
        records: usize,

        /// Number of attempts it took.
        attempts: u32,
    },

    /// [`Sink`] gave up, so records went to the [`Fallback`].
    FellBack {
        /// Number of records written to the [`Fallback`].
        records: usize,
    },

    /// Neither the [`Sink`] nor the [`Fallback`] took the records.
    Lost {
        /// Number of lost records.
        records: usize,
    },
}

impl FlushOutcome {
    /// Indicates whether the records didn't make it anywhere.
    #[must_use]
    pub const fn is_lost(self) -> bool {
        matches!(self, Self::Lost { .. })
    }
}

/// Buffered asynchronous delivery of [`LogRecord`]s to an external system.
///
/// A [`Shipper`] never raises: delivery problems are retried, written to a
/// local fallback, and reported through the returned [`FlushOutcome`].
#[async_trait]
pub trait Shipper: Send + Sync {
    /// Identity of this [`Shipper`] used in logs.
    fn name(&self) -> &str;

    /// Buffers a `record`, flushing if the batch is full.
    async fn ship(&self, record: LogRecord) -> FlushOutcome;

    /// Delivers everything buffered so far.
    async fn flush(&self) -> FlushOutcome;

    /// Delivers everything buffered so far within a bounded time, writing
    /// what couldn't be delivered to the fallback. Records shipped after
    /// closing go straight to the fallback.
    async fn close(&self) -> FlushOutcome;
}
