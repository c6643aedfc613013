// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Batching [`Shipper`] with retry, timeouts and a local fallback.

use std::{
    mem,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{sync::Notify, task::JoinHandle, time::Instant};

use crate::{
    config::ShipperConfig,
    error::{ConfigResult, ShippingError},
    logging::Logger,
};

use super::{Fallback, FlushOutcome, JsonLinesFile, LogRecord, RetryPolicy, Shipper, Sink};

/// [`Shipper`] buffering [`LogRecord`]s into batches for a [`Sink`].
///
/// # Delivery
///
/// [`Shipper::ship()`] only appends to the buffer. Delivery happens on a
/// background flusher, spawned with the first shipped record, which flushes
/// once the batch reaches the configured size and every flush interval.
/// [`Shipper::flush()`] and [`Shipper::close()`] deliver in the caller's
/// task. Each send is bounded by a timeout and retried with exponential
/// backoff. Once the retries are exhausted the batch is written to the
/// [`Fallback`] exactly once and delivery goes on with the next batch.
///
/// # Teardown
///
/// [`Shipper::close()`] is bounded by the close timeout, whatever it didn't
/// deliver goes to the [`Fallback`]. Records still buffered when the
/// [`BatchShipper`] is dropped are written to the [`Fallback`] as well, so
/// no record is silently lost on any exit path.
pub struct BatchShipper<S: Sink, F: Fallback = JsonLinesFile> {
    /// State shared with the background flusher.
    shared: Arc<Shared<S, F>>,

    /// Wakes the background flusher.
    wake: Arc<Notify>,

    /// Period of time-based flushes.
    flush_interval: Duration,

    /// Background flusher, spawned with the first shipped record.
    flusher: OnceLock<JoinHandle<()>>,
}

/// Delivery state of a [`BatchShipper`].
struct Shared<S: Sink, F: Fallback> {
    /// Name used in logs.
    name: String,

    /// [`Sink`] to deliver to.
    sink: S,

    /// Where undeliverable batches go.
    fallback: F,

    /// Number of records triggering a flush.
    batch_size: usize,

    /// Retry schedule of a batch.
    policy: RetryPolicy,

    /// Bound of a single send.
    send_timeout: Duration,

    /// Bound of delivering on close.
    close_timeout: Duration,

    /// Records waiting for a flush.
    buffer: Mutex<Vec<LogRecord>>,

    /// Serializes deliveries, so batches reach the [`Sink`] in order.
    delivery: tokio::sync::Mutex<()>,

    /// Whether [`Shipper::close()`] was called.
    closed: AtomicBool,

    /// [`Logger`] for delivery problems.
    logger: Logger,
}

impl<S: Sink, F: Fallback> std::fmt::Debug for BatchShipper<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchShipper")
            .field("name", &self.shared.name)
            .field("batch_size", &self.shared.batch_size)
            .field("policy", &self.shared.policy)
            .field("flush_interval", &self.flush_interval)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl<S: Sink, F: Fallback> BatchShipper<S, F> {
    /// Creates a new [`BatchShipper`] delivering to the `sink`.
    ///
    /// # Errors
    ///
    /// If the `config` is invalid.
    pub fn new(
        sink: S,
        fallback: F,
        config: &ShipperConfig,
        logger: Logger,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let shared = Shared {
            name: sink.name().to_owned(),
            sink,
            fallback,
            batch_size: config.batch_size,
            policy: config.retry_policy(),
            send_timeout: config.send_timeout,
            close_timeout: config.close_timeout,
            buffer: Mutex::new(Vec::new()),
            delivery: tokio::sync::Mutex::new(()),
            closed: AtomicBool::new(false),
            logger,
        };
        Ok(Self {
            shared: Arc::new(shared),
            wake: Arc::new(Notify::new()),
            flush_interval: config.flush_interval,
            flusher: OnceLock::new(),
        })
    }

    /// Returns the underlying [`Sink`].
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.shared.sink
    }

    /// Returns the [`Fallback`].
    #[must_use]
    pub fn fallback(&self) -> &F {
        &self.shared.fallback
    }

    /// Returns the number of buffered records.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.buffer().len()
    }

    /// Returns the period of time-based flushes.
    #[must_use]
    pub const fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Indicates whether this [`BatchShipper`] is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Time-based flush: delivers whatever is buffered.
    pub async fn tick(&self) -> FlushOutcome {
        self.shared.flush().await
    }
}

impl<S, F> BatchShipper<S, F>
where
    S: Sink + 'static,
    F: Fallback + 'static,
{
    /// Spawns the background flusher, unless it's running already.
    fn start_flusher(&self) {
        _ = self.flusher.get_or_init(|| {
            tokio::spawn(flush_in_background(
                Arc::downgrade(&self.shared),
                Arc::clone(&self.wake),
                self.flush_interval,
            ))
        });
    }
}

/// Flushes on every wake-up and at least once per `period`, until the
/// [`BatchShipper`] is closed or dropped.
async fn flush_in_background<S: Sink, F: Fallback>(
    weak: Weak<Shared<S, F>>,
    wake: Arc<Notify>,
    period: Duration,
) {
    loop {
        _ = tokio::time::timeout(period, wake.notified()).await;
        let Some(shared) = weak.upgrade() else { break };
        if shared.is_closed() {
            break;
        }
        _ = shared.flush().await;
    }
}

impl<S: Sink, F: Fallback> Shared<S, F> {
    /// Indicates whether [`Shipper::close()`] was called.
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Locks the buffer, tolerating poisoning.
    fn buffer(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes everything buffered so far.
    fn take(&self) -> Vec<LogRecord> {
        mem::take(&mut *self.buffer())
    }

    /// Appends the `record`, returning the number of buffered records, or
    /// hands the `record` back if already closed.
    fn push(&self, record: LogRecord) -> Result<usize, LogRecord> {
        let mut buffer = self.buffer();
        if self.is_closed() {
            return Err(record);
        }
        buffer.push(record);
        Ok(buffer.len())
    }

    /// Marks this as closed, so no record is buffered anymore.
    fn mark_closed(&self) {
        let _buffer = self.buffer();
        self.closed.store(true, Ordering::Release);
    }

    /// Delivers everything buffered so far.
    async fn flush(&self) -> FlushOutcome {
        let _delivery = self.delivery.lock().await;
        let batch = self.take();
        if batch.is_empty() {
            return FlushOutcome::Empty;
        }
        self.deliver(&batch).await
    }

    /// Delivers everything buffered so far before the close deadline,
    /// falling back with whatever didn't make it.
    async fn close(&self) -> FlushOutcome {
        self.mark_closed();

        let deadline = Instant::now() + self.close_timeout;
        let Ok(_delivery) = tokio::time::timeout_at(deadline, self.delivery.lock()).await
        else {
            return self.abandon(self.take());
        };
        let batch = self.take();
        if batch.is_empty() {
            return FlushOutcome::Empty;
        }
        match tokio::time::timeout_at(deadline, self.deliver(&batch)).await {
            Ok(outcome) => outcome,
            Err(_) => self.abandon(batch),
        }
    }

    /// Sends the `batch` once, bounded by the send timeout.
    async fn attempt(&self, batch: &[LogRecord]) -> Result<(), ShippingError> {
        match tokio::time::timeout(self.send_timeout, self.sink.send(batch)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ShippingError::rejected(&self.name, &e)),
            Err(_) => Err(ShippingError::Timeout {
                sink: self.name.clone(),
                timeout: self.send_timeout,
            }),
        }
    }

    /// Delivers the `batch` with retries, falling back once they're
    /// exhausted.
    async fn deliver(&self, batch: &[LogRecord]) -> FlushOutcome {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.attempt(batch).await {
                Ok(()) => {
                    return FlushOutcome::Shipped { records: batch.len(), attempts: attempt };
                }
                Err(e) => e,
            };
            if attempt >= self.policy.attempts() {
                self.logger.in_scope(|| {
                    tracing::warn!(
                        shipper = %self.name,
                        attempts = attempt,
                        error = %err,
                        "giving up on batch of {} records",
                        batch.len(),
                    );
                });
                return self.fall_back(batch);
            }
            let delay = self.policy.backoff(attempt);
            self.logger.in_scope(|| {
                tracing::debug!(
                    shipper = %self.name,
                    attempt,
                    error = %err,
                    "retrying in {}",
                    humantime::format_duration(delay),
                );
            });
            tokio::time::sleep(delay).await;
        }
    }

    /// Writes what the close deadline left undelivered to the [`Fallback`].
    fn abandon(&self, batch: Vec<LogRecord>) -> FlushOutcome {
        if batch.is_empty() {
            return FlushOutcome::Empty;
        }
        self.logger.in_scope(|| {
            tracing::warn!(
                shipper = %self.name,
                timeout = %humantime::format_duration(self.close_timeout),
                "close timed out, writing {} records to fallback",
                batch.len(),
            );
        });
        self.fall_back(&batch)
    }

    /// Writes the `batch` to the [`Fallback`].
    fn fall_back(&self, batch: &[LogRecord]) -> FlushOutcome {
        match self.fallback.append(batch) {
            Ok(()) => FlushOutcome::FellBack { records: batch.len() },
            Err(e) => {
                let err = ShippingError::from(e);
                self.logger.in_scope(|| {
                    tracing::error!(
                        shipper = %self.name,
                        error = %err,
                        "lost {} records, fallback failed",
                        batch.len(),
                    );
                });
                FlushOutcome::Lost { records: batch.len() }
            }
        }
    }
}

#[async_trait]
impl<S, F> Shipper for BatchShipper<S, F>
where
    S: Sink + 'static,
    F: Fallback + 'static,
{
    fn name(&self) -> &str {
        &self.shared.name
    }

    async fn ship(&self, record: LogRecord) -> FlushOutcome {
        let pending = match self.shared.push(record) {
            Ok(pending) => pending,
            Err(record) => return self.shared.fall_back(&[record]),
        };
        self.start_flusher();
        if pending >= self.shared.batch_size {
            self.wake.notify_one();
        }
        FlushOutcome::Buffered { pending }
    }

    async fn flush(&self) -> FlushOutcome {
        self.shared.flush().await
    }

    async fn close(&self) -> FlushOutcome {
        let outcome = self.shared.close().await;
        self.wake.notify_one();
        outcome
    }
}

impl<S: Sink, F: Fallback> Drop for BatchShipper<S, F> {
    fn drop(&mut self) {
        self.wake.notify_one();
    }
}

impl<S: Sink, F: Fallback> Drop for Shared<S, F> {
    fn drop(&mut self) {
        let leftover = mem::take(
            self.buffer.get_mut().unwrap_or_else(PoisonError::into_inner),
        );
        if leftover.is_empty() {
            return;
        }
        if let Err(e) = self.fallback.append(&leftover) {
            self.logger.in_scope(|| {
                tracing::error!(
                    shipper = %self.name,
                    error = %e,
                    "lost {} records on drop, fallback failed",
                    leftover.len(),
                );
            });
        }
    }
}
