// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Live human-readable terminal [`Reporter`].

mod styles;

use std::{collections::HashSet, io};

use async_trait::async_trait;
use itertools::Itertools as _;

use crate::{
    value::{ExecutionId, ScenarioId, StepId, StepStatus},
    Artifact, Execution, Reporter, Scenario, Step,
};

pub use self::styles::{Coloring, Styles};

/// Live terminal [`Reporter`] printing every step as it finishes and a
/// summary once the [`Execution`] completes.
///
/// Repeated `end_step`, `end_scenario` and `end_execution` calls for an
/// already printed entity are ignored.
#[derive(Debug)]
pub struct ConsoleReporter<Out: io::Write = io::Stdout> {
    /// [`io::Write`] implementor to print into.
    output: Out,

    /// [`Styles`] for terminal output.
    styles: Styles,

    /// Feature of the last printed [`Scenario`].
    feature: Option<String>,

    /// [`Step`]s already printed.
    printed_steps: HashSet<StepId>,

    /// [`Scenario`]s already summarized.
    ended_scenarios: HashSet<ScenarioId>,

    /// [`Execution`]s already summarized.
    ended_executions: HashSet<ExecutionId>,
}

impl ConsoleReporter {
    /// Creates a new [`ConsoleReporter`] printing to [`io::Stdout`].
    #[must_use]
    pub fn stdout(coloring: Coloring) -> Self {
        Self::new(io::stdout(), coloring)
    }
}

impl<Out: io::Write> ConsoleReporter<Out> {
    /// Creates a new [`ConsoleReporter`] printing to the given `output`.
    #[must_use]
    pub fn new(output: Out, coloring: Coloring) -> Self {
        Self {
            output,
            styles: Styles::new(coloring),
            feature: None,
            printed_steps: HashSet::new(),
            ended_scenarios: HashSet::new(),
            ended_executions: HashSet::new(),
        }
    }

    /// Returns the underlying output.
    #[must_use]
    pub const fn output(&self) -> &Out {
        &self.output
    }

    /// Unwraps the underlying output.
    #[must_use]
    pub fn into_inner(self) -> Out {
        self.output
    }

    /// Glyph printed in front of a [`Step`] with the given status.
    const fn glyph(status: StepStatus) -> &'static str {
        match status {
            StepStatus::Passed => "✔",
            StepStatus::Failed => "✘",
            StepStatus::Undefined => "?",
            StepStatus::Pending | StepStatus::Running | StepStatus::Skipped => "-",
        }
    }

    /// Renders the counters of a summary line, like
    /// `3 scenarios (2 passed, 1 failed)`.
    fn counters(&self, noun: &str, total: usize, parts: &[(usize, &str)]) -> String {
        let parts = parts
            .iter()
            .copied()
            .filter(|(n, _)| *n > 0)
            .map(|(n, what)| {
                let text = format!("{n} {what}");
                match what {
                    "passed" => self.styles.ok(text),
                    "failed" | "undefined" => self.styles.err(text),
                    _ => self.styles.skipped(text),
                }
            })
            .join(", ");
        let plural = if total == 1 { "" } else { "s" };
        if parts.is_empty() {
            format!("{total} {noun}{plural}")
        } else {
            format!("{total} {noun}{plural} ({parts})")
        }
    }
}

#[async_trait]
impl<Out: io::Write + Send> Reporter for ConsoleReporter<Out> {
    fn name(&self) -> &str {
        "console"
    }

    async fn start_execution(&mut self, execution: &Execution) -> anyhow::Result<()> {
        writeln!(
            self.output,
            "{}",
            self.styles.bold(format!("Execution {}", execution.id())),
        )?;
        Ok(())
    }

    async fn end_execution(&mut self, execution: &Execution) -> anyhow::Result<()> {
        if !self.ended_executions.insert(execution.id().clone()) {
            return Ok(());
        }
        let stats = execution.stats();
        let scenarios = self.counters(
            "scenario",
            stats.total_scenarios,
            &[
                (stats.passed_scenarios, "passed"),
                (stats.failed_scenarios, "failed"),
                (stats.skipped_scenarios, "skipped"),
                (stats.undefined_scenarios, "undefined"),
            ],
        );
        let steps = self.counters(
            "step",
            stats.total_steps,
            &[
                (stats.passed_steps, "passed"),
                (stats.failed_steps, "failed"),
                (stats.skipped_steps, "skipped"),
                (stats.undefined_steps, "undefined"),
            ],
        );
        let verdict = if execution.is_successful() {
            self.styles.ok("SUCCESS")
        } else {
            self.styles.err("FAILURE")
        };
        writeln!(
            self.output,
            "{}\n{scenarios}\n{steps}\nFinished in {}: {verdict}",
            self.styles.bold(self.styles.header("[Summary]")),
            execution.duration(),
        )?;
        self.output.flush()?;
        Ok(())
    }

    async fn start_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        if self.feature.as_deref() != Some(scenario.feature_name()) {
            self.feature = Some(scenario.feature_name().to_owned());
            writeln!(
                self.output,
                "{}",
                self.styles.header(format!("Feature: {}", scenario.feature_name())),
            )?;
        }
        let tags = scenario.tags().iter().join(" ");
        writeln!(
            self.output,
            "  {}{}{tags}",
            self.styles.bold(format!("Scenario: {}", scenario.name())),
            if tags.is_empty() { "" } else { "  " },
        )?;
        Ok(())
    }

    async fn end_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        if !self.ended_scenarios.insert(scenario.id()) {
            return Ok(());
        }
        writeln!(
            self.output,
            "  {}",
            self.styles.scenario(
                scenario.status(),
                format!("→ {} ({})", scenario.status(), scenario.duration().short()),
            ),
        )?;
        self.output.flush()?;
        Ok(())
    }

    async fn start_step(&mut self, _: &Scenario, _: &Step) -> anyhow::Result<()> {
        Ok(())
    }

    async fn end_step(&mut self, _: &Scenario, step: &Step) -> anyhow::Result<()> {
        if !self.printed_steps.insert(step.id()) {
            return Ok(());
        }
        let line = format!(
            "{} {} {} ({})",
            Self::glyph(step.status()),
            step.keyword(),
            step.name(),
            step.duration().short(),
        );
        writeln!(self.output, "    {}", self.styles.step(step.status(), line))?;
        if let Some(error) = step.error_message() {
            for line in error.lines() {
                writeln!(self.output, "      {}", self.styles.err(line))?;
            }
        }
        Ok(())
    }

    async fn attach(
        &mut self,
        _: &Scenario,
        _: Option<&Step>,
        artifact: &Artifact,
    ) -> anyhow::Result<()> {
        writeln!(
            self.output,
            "    {}",
            self.styles.skipped(format!(
                "attached {} {} ({})",
                artifact.kind,
                artifact.display_name(),
                artifact.path.display(),
            )),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{value::Keyword, ArtifactKind};

    fn reporter() -> ConsoleReporter<Vec<u8>> {
        ConsoleReporter::new(Vec::new(), Coloring::Never)
    }

    fn printed(r: &ConsoleReporter<Vec<u8>>) -> String {
        String::from_utf8_lossy(r.output()).into_owned()
    }

    #[tokio::test]
    async fn prints_steps_with_glyphs() {
        let mut r = reporter();
        let mut scenario = Scenario::new("Login", "Auth", ["@smoke"]);
        scenario.start().unwrap();
        let ok = scenario.add_step(Keyword::Given, "a user").unwrap();
        ok.start().unwrap();
        ok.complete_successfully().unwrap();
        let ok = ok.clone();
        let bad = scenario.add_step(Keyword::Then, "it works").unwrap();
        bad.start().unwrap();
        bad.fail("expected 1\nfound 2").unwrap();
        let bad = bad.clone();
        scenario.complete().unwrap();

        r.start_scenario(&scenario).await.unwrap();
        r.end_step(&scenario, &ok).await.unwrap();
        r.end_step(&scenario, &bad).await.unwrap();
        r.end_scenario(&scenario).await.unwrap();

        let out = printed(&r);
        assert!(out.starts_with("Feature: Auth\n  Scenario: Login  @smoke\n"), "{out}");
        assert!(out.contains("    ✔ Given a user (0.0s)\n"), "{out}");
        assert!(out.contains("    ✘ Then it works (0.0s)\n      expected 1\n      found 2\n"), "{out}");
        assert!(out.contains("  → failed ("), "{out}");
    }

    #[tokio::test]
    async fn ignores_repeated_end_calls() {
        let mut r = reporter();
        let mut scenario = Scenario::new("s", "f", ["@t"]);
        let step = scenario.add_step(Keyword::When, "x").unwrap();
        step.start().unwrap();
        step.skip().unwrap();
        let step = step.clone();
        scenario.complete().unwrap();

        r.end_step(&scenario, &step).await.unwrap();
        r.end_step(&scenario, &step).await.unwrap();
        r.end_scenario(&scenario).await.unwrap();
        r.end_scenario(&scenario).await.unwrap();

        let out = printed(&r);
        assert_eq!(out.matches("- When x").count(), 1, "{out}");
        assert_eq!(out.matches("→ skipped").count(), 1, "{out}");
    }

    #[tokio::test]
    async fn prints_feature_header_once() {
        let mut r = reporter();

        r.start_scenario(&Scenario::new("a", "F", Vec::<String>::new())).await.unwrap();
        r.start_scenario(&Scenario::new("b", "F", Vec::<String>::new())).await.unwrap();
        r.start_scenario(&Scenario::new("c", "G", Vec::<String>::new())).await.unwrap();

        let out = printed(&r);
        assert_eq!(out.matches("Feature: F").count(), 1, "{out}");
        assert!(out.contains("  Scenario: c\n"), "{out}");
    }

    #[tokio::test]
    async fn summarizes_execution() {
        let mut r = reporter();
        let mut execution = Execution::new();
        let sc = execution.add_scenario("s", "f", ["@t"]).unwrap();
        let step = sc.add_step(Keyword::Given, "x").unwrap();
        step.start().unwrap();
        step.complete_successfully().unwrap();
        sc.complete().unwrap();
        execution.complete();

        r.end_execution(&execution).await.unwrap();
        r.end_execution(&execution).await.unwrap();

        let out = printed(&r);
        assert_eq!(out.matches("[Summary]").count(), 1, "{out}");
        assert!(out.contains("1 scenario (1 passed)\n1 step (1 passed)\n"), "{out}");
        assert!(out.contains(": SUCCESS"), "{out}");
    }

    #[tokio::test]
    async fn mentions_attachments() {
        let mut r = reporter();
        let scenario = Scenario::new("s", "f", ["@t"]);
        let artifact = Artifact::new(ArtifactKind::Screenshot, "shots/login.png");

        r.attach(&scenario, None, &artifact).await.unwrap();

        assert!(printed(&r).contains("attached screenshot login.png (shots/login.png)"));
    }
}
