// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Driving several [`Shipper`]s independently of each other.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::{future, FutureExt as _};

use crate::{error::panic_message, logging::Logger};

use super::{FlushOutcome, LogRecord, Shipper};

/// Set of [`Shipper`]s fed with the same [`LogRecord`]s.
///
/// Every operation runs on all [`Shipper`]s concurrently, so a slow or
/// failing one never holds back another. A panicking [`Shipper`] is
/// isolated and reported as [`FlushOutcome::Lost`]. An empty set is valid
/// and does nothing.
#[derive(Clone, Default)]
pub struct ShipperSet {
    /// Registered [`Shipper`]s.
    shippers: Vec<Arc<dyn Shipper>>,

    /// [`Logger`] for isolated panics.
    logger: Logger,
}

impl std::fmt::Debug for ShipperSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.shippers.iter().map(|s| s.name())).finish()
    }
}

impl ShipperSet {
    /// Creates a new [`ShipperSet`].
    #[must_use]
    pub fn new(shippers: Vec<Arc<dyn Shipper>>, logger: Logger) -> Self {
        Self { shippers, logger }
    }

    /// Adds a [`Shipper`] to this set.
    #[must_use]
    pub fn with(mut self, shipper: Arc<dyn Shipper>) -> Self {
        self.shippers.push(shipper);
        self
    }

    /// Returns the number of [`Shipper`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shippers.len()
    }

    /// Indicates whether this set has no [`Shipper`]s.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shippers.is_empty()
    }

    /// Hands the `record` to every [`Shipper`].
    pub async fn ship(&self, record: &LogRecord) -> Vec<FlushOutcome> {
        self.each("ship", |s| s.ship(record.clone())).await
    }

    /// Flushes every [`Shipper`].
    pub async fn flush(&self) -> Vec<FlushOutcome> {
        self.each("flush", |s| s.flush()).await
    }

    /// Closes every [`Shipper`].
    pub async fn close(&self) -> Vec<FlushOutcome> {
        self.each("close", |s| s.close()).await
    }

    /// Runs `op` on every [`Shipper`] concurrently, isolating panics.
    async fn each<'s, Op>(&'s self, event: &'static str, op: Op) -> Vec<FlushOutcome>
    where
        Op: Fn(&'s dyn Shipper) -> future::BoxFuture<'s, FlushOutcome>,
    {
        future::join_all(self.shippers.iter().map(|s| {
            let name = s.name();
            AssertUnwindSafe(op(s.as_ref())).catch_unwind().map(move |caught| {
                let caught = caught
                    .map_err(|panic| format!("panicked: {}", panic_message(panic.as_ref())));
                self.logger
                    .isolate(name, event, caught)
                    .unwrap_or(FlushOutcome::Lost { records: 0 })
            })
        }))
        .await
    }
}
