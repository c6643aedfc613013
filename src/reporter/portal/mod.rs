// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! [`Reporter`] mirroring an execution into a third-party test-management
//! portal.
//!
//! - [`client`]: the [`PortalClient`] port the portal is driven through
//! - [`hierarchy`]: launch → suite → test → step bookkeeping
//! - [`attachment`]: size-capped artifact uploads

pub mod attachment;
pub mod client;
mod hierarchy;

use std::{str::FromStr, time::SystemTime};

use async_trait::async_trait;
use smart_default::SmartDefault;

use crate::{
    logging::Logger,
    value::{ScenarioId, StepStatus},
    Artifact, Execution, Reporter, Scenario, Step,
};

use self::{attachment::Loaded, hierarchy::Hierarchy};

pub use self::{
    attachment::OversizedAttachment,
    client::{
        Attachment, ItemId, ItemKind, ItemStatus, LogEntry, LogLevel, NewItem,
        NewLaunch, PortalClient,
    },
};

/// How [`Step`]s are mapped onto portal items.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NestingMode {
    /// Log entries under the scenario's test item. Fewest API calls.
    Message,

    /// Test items of their own, siblings of the scenario under its suite.
    Flat,

    /// Step items nested under the scenario's test item. Most detail.
    #[default]
    Nested,
}

impl FromStr for NestingMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "message" => Ok(Self::Message),
            "flat" => Ok(Self::Flat),
            "nested" => Ok(Self::Nested),
            _ => Err("possible options: message, flat, nested"),
        }
    }
}

/// Options of a [`PortalReporter`].
#[derive(Clone, Debug, SmartDefault)]
pub struct PortalOptions {
    /// Name of the launch.
    #[default = "BDD execution"]
    pub launch_name: String,

    /// How [`Step`]s are mapped onto portal items.
    pub nesting: NestingMode,

    /// Maximum size of an uploaded attachment in bytes.
    #[default(10 * 1024 * 1024)]
    pub attachment_cap: u64,

    /// What to do with attachments exceeding [`PortalOptions::attachment_cap`].
    pub oversized: OversizedAttachment,
}

/// [`Reporter`] mirroring the lifecycle into a launch of a test-management
/// portal.
///
/// Features become suites (opened lazily, closed when the [`Execution`]
/// ends), scenarios become tests, and steps are mapped according to the
/// [`NestingMode`]. Attachments that can't be read or exceed the cap are
/// logged and left out, never failing the report.
#[derive(Debug)]
pub struct PortalReporter<C> {
    /// [`PortalClient`] driving the portal.
    client: C,

    /// Options of this [`PortalReporter`].
    options: PortalOptions,

    /// Items opened so far.
    hierarchy: Hierarchy,

    /// [`Logger`] for non-fatal problems.
    logger: Logger,
}

impl<C: PortalClient> PortalReporter<C> {
    /// Creates a new [`PortalReporter`].
    #[must_use]
    pub fn new(client: C, options: PortalOptions, logger: Logger) -> Self {
        Self { client, options, hierarchy: Hierarchy::default(), logger }
    }

    /// Returns the underlying [`PortalClient`].
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Returns the open launch, failing if there is none.
    fn launch(&self) -> anyhow::Result<ItemId> {
        self.hierarchy
            .launch()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no launch is open"))
    }

    /// Returns the suite of the `scenario`'s feature, opening it if needed.
    async fn suite(&mut self, scenario: &Scenario, launch: &ItemId) -> anyhow::Result<ItemId> {
        if let Some(suite) = self.hierarchy.suite(scenario.feature_name()) {
            return Ok(suite.clone());
        }
        let suite = self
            .client
            .start_item(NewItem {
                launch,
                parent: None,
                name: scenario.feature_name(),
                kind: ItemKind::Suite,
                start_time: scenario.started_at().unwrap_or_else(SystemTime::now),
                tags: &[],
                has_stats: true,
            })
            .await?;
        self.hierarchy.open_suite(scenario.feature_name(), suite.clone());
        Ok(suite)
    }

    /// Logs a `warning` about the given `artifact`.
    fn warn(&self, artifact: &Artifact, warning: &str) {
        self.logger.in_scope(|| {
            tracing::warn!(
                reporter = "portal",
                artifact = %artifact.path.display(),
                "{warning}",
            );
        });
    }

    /// Logs the terminal `step` as a plain message under its scenario.
    async fn log_step(&mut self, scenario: &Scenario, step: &Step) -> anyhow::Result<()> {
        let Some(test) = self.hierarchy.test(scenario.id()).cloned() else {
            return Ok(());
        };
        if !self.hierarchy.mark_logged(step.id()) {
            return Ok(());
        }
        let mut message = format!("{} {}: {}", step.keyword(), step.name(), step.status());
        if let Some(error) = step.error_message() {
            message = format!("{message}\n{error}");
        }
        let level = match step.status() {
            StepStatus::Failed | StepStatus::Undefined => LogLevel::Error,
            StepStatus::Skipped => LogLevel::Warn,
            StepStatus::Pending | StepStatus::Running | StepStatus::Passed => LogLevel::Info,
        };
        self.client
            .log(
                &test,
                LogEntry {
                    time: step.finished_at().unwrap_or_else(SystemTime::now),
                    level,
                    message,
                    attachment: None,
                },
            )
            .await
    }

    /// Closes the step and test items of scenarios that never ended.
    async fn interrupt_open_tests(&mut self, at: SystemTime) -> anyhow::Result<()> {
        let mut first_err = None;
        for item in self.hierarchy.drain_open_items() {
            if let Err(e) = self.client.finish_item(&item, ItemStatus::Interrupted, at).await {
                _ = first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Returns the item an artifact of the given entities is attached to.
    fn attachment_target(&self, scenario: ScenarioId, step: Option<&Step>) -> Option<ItemId> {
        step.and_then(|st| self.hierarchy.step(st.id()))
            .or_else(|| self.hierarchy.test(scenario))
            .cloned()
    }
}

#[async_trait]
impl<C: PortalClient> Reporter for PortalReporter<C> {
    fn name(&self) -> &str {
        "portal"
    }

    async fn start_execution(&mut self, execution: &Execution) -> anyhow::Result<()> {
        if self.hierarchy.launch().is_some() {
            return Ok(());
        }
        let launch = self
            .client
            .start_launch(NewLaunch {
                name: &self.options.launch_name,
                start_time: execution.started_at(),
                attributes: execution.metadata(),
            })
            .await?;
        self.hierarchy.open_launch(launch);
        Ok(())
    }

    async fn end_execution(&mut self, execution: &Execution) -> anyhow::Result<()> {
        let Some(launch) = self.hierarchy.take_launch() else {
            return Ok(());
        };
        let at = execution.finished_at().unwrap_or_else(SystemTime::now);

        let mut first_err = self.interrupt_open_tests(at).await.err();
        for (suite, status) in self.hierarchy.drain_suites() {
            if let Err(e) = self.client.finish_item(&suite, status, at).await {
                _ = first_err.get_or_insert(e);
            }
        }
        if let Err(e) = self.client.finish_launch(&launch, at).await {
            _ = first_err.get_or_insert(e);
        }
        first_err.map_or(Ok(()), Err)
    }

    async fn start_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        if self.hierarchy.test(scenario.id()).is_some() {
            return Ok(());
        }
        let launch = self.launch()?;
        let suite = self.suite(scenario, &launch).await?;
        let test = self
            .client
            .start_item(NewItem {
                launch: &launch,
                parent: Some(&suite),
                name: scenario.name(),
                kind: ItemKind::Test,
                start_time: scenario.started_at().unwrap_or_else(SystemTime::now),
                tags: scenario.tags(),
                has_stats: true,
            })
            .await?;
        self.hierarchy.open_test(scenario.id(), test);
        Ok(())
    }

    async fn end_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        let Some(test) = self.hierarchy.close_test(scenario.id()) else {
            return Ok(());
        };
        self.hierarchy.record_outcome(scenario.feature_name(), scenario.status());
        self.client
            .finish_item(
                &test,
                scenario.status().into(),
                scenario.finished_at().unwrap_or_else(SystemTime::now),
            )
            .await
    }

    async fn start_step(&mut self, scenario: &Scenario, step: &Step) -> anyhow::Result<()> {
        let nest = match self.options.nesting {
            NestingMode::Message => return Ok(()),
            NestingMode::Flat => false,
            NestingMode::Nested => true,
        };
        if self.hierarchy.step(step.id()).is_some() {
            return Ok(());
        }
        let launch = self.launch()?;
        let (parent, kind, name) = if nest {
            let parent = self.hierarchy.parent(scenario.id()).cloned().ok_or_else(|| {
                anyhow::anyhow!("scenario `{}` isn't open", scenario.name())
            })?;
            (parent, ItemKind::Step, format!("{} {}", step.keyword(), step.name()))
        } else {
            let parent = self.suite(scenario, &launch).await?;
            let name = format!("{}: {} {}", scenario.name(), step.keyword(), step.name());
            (parent, ItemKind::Test, name)
        };
        let tags: &[String] = if nest { &[] } else { scenario.tags() };
        let item = self
            .client
            .start_item(NewItem {
                launch: &launch,
                parent: Some(&parent),
                name: &name,
                kind,
                start_time: step.started_at().unwrap_or_else(SystemTime::now),
                tags,
                has_stats: !nest,
            })
            .await?;
        self.hierarchy.open_step(scenario.id(), step.id(), item, nest);
        Ok(())
    }

    async fn end_step(&mut self, scenario: &Scenario, step: &Step) -> anyhow::Result<()> {
        if self.options.nesting == NestingMode::Message {
            return self.log_step(scenario, step).await;
        }
        let Some(item) = self.hierarchy.close_step(scenario.id(), step.id()) else {
            return Ok(());
        };
        let at = step.finished_at().unwrap_or_else(SystemTime::now);
        if let Some(error) = step.error_message() {
            self.client
                .log(
                    &item,
                    LogEntry {
                        time: at,
                        level: LogLevel::Error,
                        message: error.to_owned(),
                        attachment: None,
                    },
                )
                .await?;
        }
        self.client.finish_item(&item, step.status().into(), at).await
    }

    async fn attach(
        &mut self,
        scenario: &Scenario,
        step: Option<&Step>,
        artifact: &Artifact,
    ) -> anyhow::Result<()> {
        let Some(target) = self.attachment_target(scenario.id(), step) else {
            self.warn(artifact, "no open item to attach to, skipping");
            return Ok(());
        };
        let loaded = attachment::load(
            artifact,
            self.options.attachment_cap,
            self.options.oversized,
        );
        let attachment = match loaded {
            Ok(Loaded::Ready(a)) => a,
            Ok(Loaded::Skipped { size }) => {
                self.warn(
                    artifact,
                    &format!(
                        "attachment of {size} bytes exceeds the {} bytes cap, skipping",
                        self.options.attachment_cap,
                    ),
                );
                return Ok(());
            }
            Err(e) => {
                self.warn(artifact, &format!("failed to read attachment, skipping: {e}"));
                return Ok(());
            }
        };
        if attachment.truncated {
            self.warn(
                artifact,
                &format!(
                    "attachment exceeds the {} bytes cap, truncating",
                    self.options.attachment_cap,
                ),
            );
        }
        let message = format!("{}: {}", artifact.kind, artifact.display_name());
        self.client
            .log(
                &target,
                LogEntry {
                    time: SystemTime::now(),
                    level: LogLevel::Info,
                    message,
                    attachment: Some(attachment),
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::{Arc, Mutex}};

    use tracing::level_filters::LevelFilter;

    use super::*;
    use crate::{logging::capture::Capture, value::Keyword, ArtifactKind};

    /// Call recorded by [`FakePortal`].
    #[derive(Clone, Debug, PartialEq)]
    enum Recorded {
        Launch(String),
        Item { id: String, parent: Option<String>, kind: ItemKind, name: String },
        Finish(String, ItemStatus),
        Log { item: String, level: LogLevel, message: String, bytes: Option<usize> },
        FinishLaunch(String),
    }

    #[derive(Clone, Default)]
    struct FakePortal {
        calls: Arc<Mutex<Vec<Recorded>>>,
        next: Arc<Mutex<usize>>,
    }

    impl FakePortal {
        fn calls(&self) -> Vec<Recorded> {
            self.calls.lock().unwrap().clone()
        }

        fn fresh_id(&self, prefix: &str) -> ItemId {
            let mut next = self.next.lock().unwrap();
            *next += 1;
            ItemId(format!("{prefix}{next}"))
        }
    }

    #[async_trait]
    impl PortalClient for FakePortal {
        async fn start_launch(&mut self, launch: NewLaunch<'_>) -> anyhow::Result<ItemId> {
            let id = self.fresh_id("launch");
            self.calls.lock().unwrap().push(Recorded::Launch(launch.name.into()));
            Ok(id)
        }

        async fn start_item(&mut self, item: NewItem<'_>) -> anyhow::Result<ItemId> {
            let id = self.fresh_id(&item.kind.to_string());
            self.calls.lock().unwrap().push(Recorded::Item {
                id: id.0.clone(),
                parent: item.parent.map(|p| p.0.clone()),
                kind: item.kind,
                name: item.name.into(),
            });
            Ok(id)
        }

        async fn finish_item(
            &mut self,
            item: &ItemId,
            status: ItemStatus,
            _: SystemTime,
        ) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Recorded::Finish(item.0.clone(), status));
            Ok(())
        }

        async fn log(&mut self, item: &ItemId, entry: LogEntry) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Recorded::Log {
                item: item.0.clone(),
                level: entry.level,
                message: entry.message,
                bytes: entry.attachment.map(|a| a.data.len()),
            });
            Ok(())
        }

        async fn finish_launch(&mut self, launch: &ItemId, _: SystemTime) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Recorded::FinishLaunch(launch.0.clone()));
            Ok(())
        }
    }

    fn reporter(nesting: NestingMode) -> (FakePortal, PortalReporter<FakePortal>) {
        let portal = FakePortal::default();
        let options = PortalOptions { nesting, ..PortalOptions::default() };
        (portal.clone(), PortalReporter::new(portal, options, Logger::disabled()))
    }

    /// Drives one scenario with a passing and a failing step.
    async fn drive(r: &mut PortalReporter<FakePortal>) -> Execution {
        let mut ex = Execution::new();
        r.start_execution(&ex).await.unwrap();

        let sc = ex.add_scenario("Login", "Auth", ["@smoke"]).unwrap();
        sc.start().unwrap();
        let snapshot = sc.clone();
        r.start_scenario(&snapshot).await.unwrap();

        for (kw, name, fail) in [(Keyword::Given, "a user", false), (Keyword::Then, "it works", true)] {
            let step = sc.add_step(kw, name).unwrap();
            step.start().unwrap();
            let started = step.clone();
            r.start_step(&snapshot, &started).await.unwrap();
            if fail {
                step.fail("boom").unwrap();
            } else {
                step.complete_successfully().unwrap();
            }
            let ended = step.clone();
            r.end_step(&snapshot, &ended).await.unwrap();
            r.end_step(&snapshot, &ended).await.unwrap();
        }
        sc.complete().unwrap();
        let done = sc.clone();
        r.end_scenario(&done).await.unwrap();
        r.end_scenario(&done).await.unwrap();

        ex.complete();
        r.end_execution(&ex).await.unwrap();
        r.end_execution(&ex).await.unwrap();
        ex
    }

    fn item(id: &str, parent: Option<&str>, kind: ItemKind, name: &str) -> Recorded {
        Recorded::Item {
            id: id.into(),
            parent: parent.map(Into::into),
            kind,
            name: name.into(),
        }
    }

    #[tokio::test]
    async fn nests_steps_under_scenario() {
        let (portal, mut r) = reporter(NestingMode::Nested);

        _ = drive(&mut r).await;

        assert_eq!(
            portal.calls(),
            [
                Recorded::Launch("BDD execution".into()),
                item("suite2", None, ItemKind::Suite, "Auth"),
                item("test3", Some("suite2"), ItemKind::Test, "Login"),
                item("step4", Some("test3"), ItemKind::Step, "Given a user"),
                Recorded::Finish("step4".into(), ItemStatus::Passed),
                item("step5", Some("test3"), ItemKind::Step, "Then it works"),
                Recorded::Log {
                    item: "step5".into(),
                    level: LogLevel::Error,
                    message: "boom".into(),
                    bytes: None,
                },
                Recorded::Finish("step5".into(), ItemStatus::Failed),
                Recorded::Finish("test3".into(), ItemStatus::Failed),
                Recorded::Finish("suite2".into(), ItemStatus::Failed),
                Recorded::FinishLaunch("launch1".into()),
            ],
        );
    }

    #[tokio::test]
    async fn flattens_steps_into_suite() {
        let (portal, mut r) = reporter(NestingMode::Flat);

        _ = drive(&mut r).await;

        let calls = portal.calls();
        assert!(calls.contains(&item("test4", Some("suite2"), ItemKind::Test, "Login: Given a user")));
        assert!(calls.contains(&item("test5", Some("suite2"), ItemKind::Test, "Login: Then it works")));
        assert!(calls.contains(&Recorded::Finish("test5".into(), ItemStatus::Failed)));
    }

    #[tokio::test]
    async fn logs_steps_as_messages() {
        let (portal, mut r) = reporter(NestingMode::Message);

        _ = drive(&mut r).await;

        let calls = portal.calls();
        assert!(!calls.iter().any(|c| matches!(c, Recorded::Item { kind: ItemKind::Step, .. })));
        let logs: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                Recorded::Log { item, level, message, .. } => Some((item.as_str(), *level, message.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            logs,
            [
                ("test3", LogLevel::Info, "Given a user: passed"),
                ("test3", LogLevel::Error, "Then it works: failed\nboom"),
            ],
        );
    }

    #[tokio::test]
    async fn fails_scenario_without_launch() {
        let (_, mut r) = reporter(NestingMode::Nested);

        let err = r.start_scenario(&Scenario::new("s", "f", ["@t"])).await.unwrap_err();

        assert!(err.to_string().contains("no launch"), "{err}");
    }

    #[tokio::test]
    async fn interrupts_abandoned_scenarios() {
        let (portal, mut r) = reporter(NestingMode::Nested);
        let mut ex = Execution::new();
        r.start_execution(&ex).await.unwrap();
        let sc = ex.add_scenario("s", "f", ["@t"]).unwrap().clone();
        r.start_scenario(&sc).await.unwrap();
        ex.complete();

        r.end_execution(&ex).await.unwrap();

        let calls = portal.calls();
        assert!(calls.contains(&Recorded::Finish("test3".into(), ItemStatus::Interrupted)));
        assert!(calls.contains(&Recorded::Finish("suite2".into(), ItemStatus::Skipped)));
    }

    #[tokio::test]
    async fn interrupts_steps_of_abandoned_scenarios() {
        for (nesting, step_item) in [(NestingMode::Nested, "step4"), (NestingMode::Flat, "test4")] {
            let (portal, mut r) = reporter(nesting);
            let mut ex = Execution::new();
            r.start_execution(&ex).await.unwrap();
            let sc = ex.add_scenario("s", "f", ["@t"]).unwrap();
            sc.start().unwrap();
            let snapshot = sc.clone();
            r.start_scenario(&snapshot).await.unwrap();
            let step = sc.add_step(Keyword::Given, "a hang").unwrap();
            step.start().unwrap();
            let running = step.clone();
            r.start_step(&snapshot, &running).await.unwrap();

            r.end_execution(&ex).await.unwrap();

            let calls = portal.calls();
            let finished = |item: &str| {
                calls
                    .iter()
                    .position(|c| *c == Recorded::Finish(item.into(), ItemStatus::Interrupted))
            };
            let step_at = finished(step_item).unwrap_or_else(|| panic!("{nesting:?}: {calls:?}"));
            let test_at = finished("test3").unwrap_or_else(|| panic!("{nesting:?}: {calls:?}"));
            assert!(step_at < test_at, "{nesting:?}: {calls:?}");
        }
    }

    #[tokio::test]
    async fn uploads_capped_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.log");
        let big = dir.path().join("big.png");
        fs::write(&small, "hello").unwrap();
        fs::write(&big, vec![0u8; 64]).unwrap();

        let portal = FakePortal::default();
        let capture = Capture::default();
        let options = PortalOptions {
            attachment_cap: 16,
            oversized: OversizedAttachment::Skip,
            ..PortalOptions::default()
        };
        let mut r = PortalReporter::new(
            portal.clone(),
            options,
            Logger::with_writer(LevelFilter::WARN, capture.clone()),
        );
        let ex = Execution::new();
        r.start_execution(&ex).await.unwrap();
        let sc = Scenario::new("s", "f", ["@t"]);
        r.start_scenario(&sc).await.unwrap();

        r.attach(&sc, None, &Artifact::new(ArtifactKind::Log, &small)).await.unwrap();
        r.attach(&sc, None, &Artifact::new(ArtifactKind::Screenshot, &big)).await.unwrap();
        r.attach(&sc, None, &Artifact::new(ArtifactKind::Video, dir.path().join("gone.webm")))
            .await
            .unwrap();

        let uploads: Vec<_> = portal
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Recorded::Log { message, bytes, .. } => Some((message, bytes)),
                _ => None,
            })
            .collect();
        assert_eq!(uploads, [("log: small.log".to_owned(), Some(5))]);
        let logs = capture.contents();
        assert!(logs.contains("exceeds the 16 bytes cap, skipping"), "{logs}");
        assert!(logs.contains("failed to read attachment"), "{logs}");
    }

    #[tokio::test]
    async fn truncates_oversized_attachments_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let big = dir.path().join("trace.zip");
        fs::write(&big, vec![1u8; 64]).unwrap();
        let (portal, mut r) = reporter(NestingMode::Nested);
        r.options.attachment_cap = 10;
        r.options.oversized = OversizedAttachment::Truncate;
        let ex = Execution::new();
        r.start_execution(&ex).await.unwrap();
        let sc = Scenario::new("s", "f", ["@t"]);
        r.start_scenario(&sc).await.unwrap();

        r.attach(&sc, None, &Artifact::new(ArtifactKind::Trace, &big)).await.unwrap();

        assert!(portal.calls().iter().any(|c| matches!(
            c,
            Recorded::Log { bytes: Some(10), .. },
        )));
    }

    #[test]
    fn parses_nesting_mode() {
        assert_eq!("Flat".parse::<NestingMode>(), Ok(NestingMode::Flat));
        assert!("deep".parse::<NestingMode>().is_err());
    }
}
