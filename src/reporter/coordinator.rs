// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Broadcasting lifecycle events to multiple [`Reporter`]s with failure
//! isolation.

use std::panic::AssertUnwindSafe;

use futures::FutureExt as _;

use crate::{
    error::{ConfigError, ConfigResult, ReporterError},
    logging::Logger,
    value::LifecycleEvent,
    Artifact, Execution, Scenario, Step,
};

use super::Reporter;

/// Registered [`Reporter`] with its failure count.
struct Slot {
    /// The [`Reporter`] itself.
    reporter: Box<dyn Reporter>,

    /// Number of callbacks of this [`Reporter`] that failed.
    failures: usize,
}

/// Single lifecycle call to be delivered to every [`Reporter`].
#[derive(Clone, Copy)]
enum Call<'a> {
    StartExecution(&'a Execution),
    EndExecution(&'a Execution),
    StartScenario(&'a Scenario),
    EndScenario(&'a Scenario),
    StartStep(&'a Scenario, &'a Step),
    EndStep(&'a Scenario, &'a Step),
    Attach(&'a Scenario, Option<&'a Step>, &'a Artifact),
}

impl Call<'_> {
    /// Returns the [`LifecycleEvent`] of this [`Call`].
    const fn event(self) -> LifecycleEvent {
        match self {
            Self::StartExecution(_) => LifecycleEvent::StartExecution,
            Self::EndExecution(_) => LifecycleEvent::EndExecution,
            Self::StartScenario(_) => LifecycleEvent::StartScenario,
            Self::EndScenario(_) => LifecycleEvent::EndScenario,
            Self::StartStep(..) => LifecycleEvent::StartStep,
            Self::EndStep(..) => LifecycleEvent::EndStep,
            Self::Attach(..) => LifecycleEvent::Attach,
        }
    }

    /// Delivers this [`Call`] to the given `reporter`.
    async fn deliver(self, reporter: &mut dyn Reporter) -> anyhow::Result<()> {
        match self {
            Self::StartExecution(ex) => reporter.start_execution(ex).await,
            Self::EndExecution(ex) => reporter.end_execution(ex).await,
            Self::StartScenario(sc) => reporter.start_scenario(sc).await,
            Self::EndScenario(sc) => reporter.end_scenario(sc).await,
            Self::StartStep(sc, st) => reporter.start_step(sc, st).await,
            Self::EndStep(sc, st) => reporter.end_step(sc, st).await,
            Self::Attach(sc, st, a) => reporter.attach(sc, st, a).await,
        }
    }
}

/// Fan-out of lifecycle events to an ordered list of [`Reporter`]s.
///
/// # Failure isolation
///
/// Each event is delivered to every [`Reporter`] in registration order.
/// An error or a panic of one [`Reporter`] is caught, logged with its name
/// and the event, and delivery continues with the next one. Failures are
/// handed back as data and never raised, so reporter health can't affect
/// the run's outcome.
///
/// # Ordering
///
/// Delivery is sequential and awaited in the caller's task, which keeps the
/// per-reporter event order. Callers wanting to keep the driver unblocked may
/// move the [`Coordinator`] into a task of their own.
pub struct Coordinator {
    /// Registered [`Reporter`]s in delivery order.
    reporters: Vec<Slot>,

    /// [`Logger`] failures are reported into.
    logger: Logger,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("reporters", &self.reporter_names())
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Creates a new [`Coordinator`] over the given `reporters`.
    ///
    /// # Errors
    ///
    /// With [`ConfigError::NoReporters`] if `reporters` is empty.
    pub fn new(
        reporters: Vec<Box<dyn Reporter>>,
        logger: Logger,
    ) -> ConfigResult<Self> {
        if reporters.is_empty() {
            return Err(ConfigError::NoReporters);
        }
        let reporters = reporters
            .into_iter()
            .map(|reporter| Slot { reporter, failures: 0 })
            .collect();
        Ok(Self { reporters, logger })
    }

    /// Returns the names of the registered [`Reporter`]s in delivery order.
    #[must_use]
    pub fn reporter_names(&self) -> Vec<&str> {
        self.reporters.iter().map(|s| s.reporter.name()).collect()
    }

    /// Returns how many callbacks of the named [`Reporter`] failed.
    #[must_use]
    pub fn failures(&self, reporter: &str) -> usize {
        self.reporters
            .iter()
            .filter(|s| s.reporter.name() == reporter)
            .map(|s| s.failures)
            .sum()
    }

    /// Returns how many callbacks failed across all [`Reporter`]s.
    #[must_use]
    pub fn total_failures(&self) -> usize {
        self.reporters.iter().map(|s| s.failures).sum()
    }

    /// Broadcasts the start of an [`Execution`].
    pub async fn start_execution(&mut self, execution: &Execution) -> Vec<ReporterError> {
        self.dispatch(Call::StartExecution(execution)).await
    }

    /// Broadcasts the completion of an [`Execution`].
    pub async fn end_execution(&mut self, execution: &Execution) -> Vec<ReporterError> {
        self.dispatch(Call::EndExecution(execution)).await
    }

    /// Broadcasts the start of a [`Scenario`].
    pub async fn start_scenario(&mut self, scenario: &Scenario) -> Vec<ReporterError> {
        self.dispatch(Call::StartScenario(scenario)).await
    }

    /// Broadcasts the completion of a [`Scenario`].
    pub async fn end_scenario(&mut self, scenario: &Scenario) -> Vec<ReporterError> {
        self.dispatch(Call::EndScenario(scenario)).await
    }

    /// Broadcasts the start of a [`Step`].
    pub async fn start_step(&mut self, scenario: &Scenario, step: &Step) -> Vec<ReporterError> {
        self.dispatch(Call::StartStep(scenario, step)).await
    }

    /// Broadcasts a [`Step`] reaching a terminal status.
    pub async fn end_step(&mut self, scenario: &Scenario, step: &Step) -> Vec<ReporterError> {
        self.dispatch(Call::EndStep(scenario, step)).await
    }

    /// Broadcasts an [`Artifact`] attached to a [`Scenario`] or [`Step`].
    pub async fn attach(
        &mut self,
        scenario: &Scenario,
        step: Option<&Step>,
        artifact: &Artifact,
    ) -> Vec<ReporterError> {
        self.dispatch(Call::Attach(scenario, step, artifact)).await
    }

    /// Delivers the `call` to every [`Reporter`] in order, collecting
    /// isolated failures.
    async fn dispatch(&mut self, call: Call<'_>) -> Vec<ReporterError> {
        let event = call.event();
        let mut failed = Vec::new();
        for slot in &mut self.reporters {
            let caught = AssertUnwindSafe(call.deliver(slot.reporter.as_mut()))
                .catch_unwind()
                .await;
            let name = slot.reporter.name();
            let outcome = match caught {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(ReporterError::failed(name, event, &e)),
                Err(panic) => Err(ReporterError::panicked(name, event, panic.as_ref())),
            };
            if let Err(e) = self.logger.isolate(name, event, outcome) {
                slot.failures += 1;
                failed.push(e);
            }
        }
        failed
    }
}
