// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Explicitly constructed logger threaded through constructors.
//!
//! The library never installs a global [`tracing`] subscriber. Components
//! receive a [`Logger`] and emit their events inside its scope.

use std::fmt;

use tracing::{level_filters::LevelFilter, subscriber::NoSubscriber, Dispatch};
use tracing_subscriber::fmt::MakeWriter;

/// Handle to a [`tracing`] [`Dispatch`] that components log into.
///
/// Cheap to clone: clones share the same subscriber.
#[derive(Clone)]
pub struct Logger {
    /// [`Dispatch`] every event of this [`Logger`] goes to.
    dispatch: Dispatch,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Logger {
    /// Wraps an existing [`Dispatch`].
    #[must_use]
    pub const fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Creates a [`Logger`] printing events up to `level` to stderr.
    #[must_use]
    pub fn stderr(level: LevelFilter) -> Self {
        Self::with_writer(level, std::io::stderr)
    }

    /// Creates a [`Logger`] formatting events up to `level` into the given
    /// [`MakeWriter`].
    #[must_use]
    pub fn with_writer<W>(level: LevelFilter, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .finish();
        Self::new(Dispatch::new(subscriber))
    }

    /// Creates a [`Logger`] discarding every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Dispatch::new(NoSubscriber::default()))
    }

    /// Runs `f` with this [`Logger`] as the current dispatcher.
    pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Logs the failure of an isolated `component` while handling `event`,
    /// and hands the `outcome` back unchanged.
    pub fn isolate<T, E: fmt::Display>(
        &self,
        component: &str,
        event: impl fmt::Display,
        outcome: Result<T, E>,
    ) -> Result<T, E> {
        if let Err(e) = &outcome {
            self.in_scope(|| {
                tracing::warn!(
                    component,
                    event = %event,
                    error = %e,
                    "isolated failure, continuing",
                );
            });
        }
        outcome
    }
}
