// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Driving an [`Execution`] while reporting and shipping every transition.

use std::iter;

use crate::{
    error::{EntityKind, LifecycleError, LifecycleResult, ReporterError},
    lifecycle::EmptyScenarioPolicy,
    reporter::Coordinator,
    shipper::{Level, LogRecord, ShipperSet},
    value::{Keyword, LifecycleEvent, ScenarioId, ScenarioStatus, StepId, StepStatus},
    Artifact, Execution, Scenario, Step,
};

/// Entry point of a test runner: owns the [`Execution`] being driven and
/// fans every transition out to the [`Coordinator`] and the
/// [`ShipperSet`].
///
/// Every method first applies the transition to the entity, propagating a
/// [`LifecycleError`] if it's invalid, and only then notifies reporters and
/// shippers, so they always observe a consistent snapshot. Reporter and
/// shipper failures never surface here.
///
/// # Example
///
/// ```rust
/// # use bdd_lifecycle::{
/// #     logging::Logger, reporter::ConsoleReporter, reporter::console::Coloring,
/// #     shipper::ShipperSet, value::Keyword, Coordinator, Reporter, Session,
/// # };
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let console: Box<dyn Reporter> =
///     Box::new(ConsoleReporter::new(Vec::new(), Coloring::Never));
/// let coordinator = Coordinator::new(vec![console], Logger::disabled())?;
/// let mut session = Session::register(coordinator, ShipperSet::default());
///
/// session.start_execution().await?;
/// let sc = session.start_scenario("Login", "Auth", ["@smoke"]).await?;
/// let st = session.start_step(sc, Keyword::Given, "a registered user").await?;
/// session.pass_step(sc, st).await?;
/// _ = session.end_scenario(sc).await?;
/// let execution = session.finish().await?;
///
/// assert_eq!(execution.exit_code(), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    /// [`Execution`] being driven.
    execution: Execution,

    /// Reporters fan-out.
    coordinator: Coordinator,

    /// Log shippers.
    shippers: ShipperSet,

    /// Status of scenarios ended without steps.
    empty_scenario: EmptyScenarioPolicy,

    /// Whether `start_execution` was broadcast.
    started: bool,
}

impl Session {
    /// Registers the `coordinator` and `shippers` for a new [`Execution`].
    #[must_use]
    pub fn register(coordinator: Coordinator, shippers: ShipperSet) -> Self {
        Self {
            execution: Execution::new(),
            coordinator,
            shippers,
            empty_scenario: EmptyScenarioPolicy::default(),
            started: false,
        }
    }

    /// Sets the [`EmptyScenarioPolicy`] scenarios are ended with.
    #[must_use]
    pub const fn with_empty_scenario_policy(mut self, policy: EmptyScenarioPolicy) -> Self {
        self.empty_scenario = policy;
        self
    }

    /// Adds a metadata entry to the [`Execution`].
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.execution = self.execution.with_metadata(key, value);
        self
    }

    /// Returns the [`Execution`] being driven.
    #[must_use]
    pub const fn execution(&self) -> &Execution {
        &self.execution
    }

    /// Returns the [`Coordinator`], to inspect reporter health.
    #[must_use]
    pub const fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Broadcasts the start of the [`Execution`].
    ///
    /// # Errors
    ///
    /// If already started.
    pub async fn start_execution(&mut self) -> LifecycleResult<()> {
        if self.started {
            return Err(self.invalid_execution("running", "start_execution"));
        }
        self.started = true;
        let failed = self.coordinator.start_execution(&self.execution).await;
        let record = self.record(Level::Info, LifecycleEvent::StartExecution, "execution started");
        self.emit(record, failed).await;
        Ok(())
    }

    /// Adds a new [`Scenario`], starts it and broadcasts its start.
    ///
    /// # Errors
    ///
    /// If the [`Execution`] isn't started or is already finished.
    pub async fn start_scenario<T: Into<String>>(
        &mut self,
        name: impl Into<String>,
        feature: impl Into<String>,
        tags: impl IntoIterator<Item = T>,
    ) -> LifecycleResult<ScenarioId> {
        self.ensure_started("start_scenario")?;
        let sc = self.execution.add_scenario(name, feature, tags)?;
        sc.start()?;
        let id = sc.id();

        let scenario = scenario_of(&self.execution, id)?;
        let failed = self.coordinator.start_scenario(scenario).await;
        let record = self
            .record(Level::Info, LifecycleEvent::StartScenario, "scenario started")
            .scenario(scenario.name())
            .field("feature", scenario.feature_name());
        self.emit(record, failed).await;
        Ok(id)
    }

    /// Adds a pending [`Step`] to a [`Scenario`] without starting it.
    ///
    /// # Errors
    ///
    /// If the [`Scenario`] is unknown or already ended.
    pub fn declare_step(
        &mut self,
        scenario: ScenarioId,
        keyword: Keyword,
        name: impl Into<String>,
    ) -> LifecycleResult<StepId> {
        Ok(self.execution.scenario_mut(scenario)?.add_step(keyword, name)?.id())
    }

    /// Adds a new [`Step`] to a [`Scenario`], starts it and broadcasts its
    /// start.
    ///
    /// # Errors
    ///
    /// If the [`Scenario`] is unknown or already ended.
    pub async fn start_step(
        &mut self,
        scenario: ScenarioId,
        keyword: Keyword,
        name: impl Into<String>,
    ) -> LifecycleResult<StepId> {
        let step = self.declare_step(scenario, keyword, name)?;
        self.begin_step(scenario, step).await?;
        Ok(step)
    }

    /// Starts a previously declared [`Step`] and broadcasts its start.
    ///
    /// # Errors
    ///
    /// If the [`Step`] is unknown or not pending.
    pub async fn begin_step(&mut self, scenario: ScenarioId, step: StepId) -> LifecycleResult<()> {
        self.execution.scenario_mut(scenario)?.step_mut(step)?.start()?;

        let (sc, st) = step_of(&self.execution, scenario, step)?;
        let failed = self.coordinator.start_step(sc, st).await;
        let record = self
            .record(Level::Debug, LifecycleEvent::StartStep, "step started")
            .scenario(sc.name())
            .step(format!("{} {}", st.keyword(), st.name()));
        self.emit(record, failed).await;
        Ok(())
    }

    /// Marks a running [`Step`] as passed.
    ///
    /// # Errors
    ///
    /// If the [`Step`] is unknown or not running.
    pub async fn pass_step(&mut self, scenario: ScenarioId, step: StepId) -> LifecycleResult<()> {
        self.end_step(scenario, step, Step::complete_successfully).await
    }

    /// Marks a running [`Step`] as failed with the given error `message`.
    ///
    /// # Errors
    ///
    /// If the [`Step`] is unknown or not running, or the `message` is
    /// blank.
    pub async fn fail_step(
        &mut self,
        scenario: ScenarioId,
        step: StepId,
        message: impl Into<String>,
    ) -> LifecycleResult<()> {
        let message = message.into();
        self.end_step(scenario, step, move |st| st.fail(message)).await
    }

    /// Marks a running [`Step`] as skipped.
    ///
    /// # Errors
    ///
    /// If the [`Step`] is unknown or not running.
    pub async fn skip_step(&mut self, scenario: ScenarioId, step: StepId) -> LifecycleResult<()> {
        self.end_step(scenario, step, Step::skip).await
    }

    /// Marks a running [`Step`] as undefined.
    ///
    /// # Errors
    ///
    /// If the [`Step`] is unknown or not running.
    pub async fn undefined_step(
        &mut self,
        scenario: ScenarioId,
        step: StepId,
    ) -> LifecycleResult<()> {
        self.end_step(scenario, step, Step::undefined).await
    }

    /// Ends a [`Scenario`], deriving its status from its steps, and
    /// broadcasts its end.
    ///
    /// # Errors
    ///
    /// If the [`Scenario`] is unknown, or one of its steps is still
    /// running.
    pub async fn end_scenario(&mut self, scenario: ScenarioId) -> LifecycleResult<ScenarioStatus> {
        let status = self
            .execution
            .scenario_mut(scenario)?
            .complete_with(self.empty_scenario)?;

        let sc = scenario_of(&self.execution, scenario)?;
        let failed = self.coordinator.end_scenario(sc).await;
        let level = if status.is_failure() { Level::Warn } else { Level::Info };
        let record = self
            .record(level, LifecycleEvent::EndScenario, format!("scenario {status}"))
            .scenario(sc.name())
            .field("duration", sc.duration().as_secs_f64());
        self.emit(record, failed).await;
        Ok(status)
    }

    /// Broadcasts an [`Artifact`] attached to a [`Scenario`] or one of its
    /// [`Step`]s.
    ///
    /// # Errors
    ///
    /// If the [`Scenario`] or [`Step`] is unknown.
    pub async fn attach(
        &mut self,
        scenario: ScenarioId,
        step: Option<StepId>,
        artifact: &Artifact,
    ) -> LifecycleResult<()> {
        let sc = scenario_of(&self.execution, scenario)?;
        let st = step
            .map(|id| sc.step(id).ok_or(LifecycleError::UnknownStep { scenario, step: id }))
            .transpose()?;
        let failed = self.coordinator.attach(sc, st, artifact).await;
        let mut record = self
            .record(Level::Info, LifecycleEvent::Attach, format!("attached {}", artifact.kind))
            .scenario(sc.name())
            .field("path", artifact.path.display().to_string());
        if let Some(st) = st {
            record = record.step(format!("{} {}", st.keyword(), st.name()));
        }
        self.emit(record, failed).await;
        Ok(())
    }

    /// Completes the [`Execution`], broadcasts its end, closes every shipper
    /// and returns the final [`Execution`].
    ///
    /// Scenarios never ended keep their non-terminal status.
    ///
    /// # Errors
    ///
    /// If the [`Execution`] wasn't started.
    pub async fn finish(mut self) -> LifecycleResult<Execution> {
        self.ensure_started("finish")?;
        self.execution.complete();

        let failed = self.coordinator.end_execution(&self.execution).await;
        let stats = self.execution.stats();
        let level = if self.execution.is_successful() { Level::Info } else { Level::Warn };
        let record = self
            .record(level, LifecycleEvent::EndExecution, "execution finished")
            .field("total_scenarios", stats.total_scenarios)
            .field("passed_scenarios", stats.passed_scenarios)
            .field("failed_scenarios", stats.failed_scenarios)
            .field("is_successful", self.execution.is_successful())
            .field("duration", self.execution.duration().as_secs_f64());
        self.emit(record, failed).await;
        drop(self.shippers.close().await);

        Ok(self.execution)
    }

    /// Applies a terminal transition to a [`Step`] and broadcasts its end.
    async fn end_step(
        &mut self,
        scenario: ScenarioId,
        step: StepId,
        transition: impl FnOnce(&mut Step) -> LifecycleResult<()>,
    ) -> LifecycleResult<()> {
        transition(self.execution.scenario_mut(scenario)?.step_mut(step)?)?;

        let (sc, st) = step_of(&self.execution, scenario, step)?;
        let failed = self.coordinator.end_step(sc, st).await;
        let level = match st.status() {
            StepStatus::Failed => Level::Error,
            StepStatus::Undefined => Level::Warn,
            StepStatus::Pending
            | StepStatus::Running
            | StepStatus::Passed
            | StepStatus::Skipped => Level::Info,
        };
        let mut record = self
            .record(level, LifecycleEvent::EndStep, format!("step {}", st.status()))
            .scenario(sc.name())
            .step(format!("{} {}", st.keyword(), st.name()))
            .field("duration", st.duration().as_secs_f64());
        if let Some(error) = st.error_message() {
            record = record.field("error", error);
        }
        self.emit(record, failed).await;
        Ok(())
    }

    /// Ships the `record` along with a warning per isolated reporter
    /// failure.
    async fn emit(&self, record: LogRecord, failed: Vec<ReporterError>) {
        let warnings = failed.into_iter().map(|e| {
            self.record(Level::Warn, e.event, e.to_string())
                .field("reporter", e.reporter)
                .field("failure", e.kind.to_string())
        });
        for record in iter::once(record).chain(warnings) {
            drop(self.shippers.ship(&record).await);
        }
    }

    /// Starts a [`LogRecord`] about the [`Execution`].
    fn record(&self, level: Level, event: LifecycleEvent, message: impl Into<String>) -> LogRecord {
        LogRecord::new(level, message).event(event).execution(self.execution.id())
    }

    /// Rejects the `action` unless the [`Execution`] was started.
    fn ensure_started(&self, action: &'static str) -> LifecycleResult<()> {
        if self.started {
            Ok(())
        } else {
            Err(self.invalid_execution("pending", action))
        }
    }

    /// Builds the error of an `action` not allowed while the [`Execution`]
    /// is in the `from` state.
    fn invalid_execution(&self, from: &str, action: &'static str) -> LifecycleError {
        LifecycleError::invalid_transition(EntityKind::Execution, self.execution.id(), from, action)
    }
}

/// Looks up a [`Scenario`] of the `execution`.
fn scenario_of(execution: &Execution, id: ScenarioId) -> LifecycleResult<&Scenario> {
    execution
        .scenario(id)
        .ok_or(LifecycleError::UnknownScenario { scenario: id })
}

/// Looks up a [`Step`] along with its [`Scenario`].
fn step_of(
    execution: &Execution,
    scenario: ScenarioId,
    step: StepId,
) -> LifecycleResult<(&Scenario, &Step)> {
    let sc = scenario_of(execution, scenario)?;
    let st = sc.step(step).ok_or(LifecycleError::UnknownStep { scenario, step })?;
    Ok((sc, st))
}
