// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! [`Reporter`] writing the JSON execution report.

use std::{fs, io, path::PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;

use crate::{report, value::ExecutionId, Execution, Reporter, Scenario, Step};

/// Where a [`JsonReporter`] puts the report.
#[derive(Debug)]
enum Destination<Out> {
    /// File, created along with its parent directories.
    Path(PathBuf),

    /// Arbitrary [`io::Write`] implementor.
    Writer(Out),
}

/// [`Reporter`] rendering the whole [`Execution`] as a [JSON report] once
/// it completes.
///
/// Intermediate events are ignored: the report is a snapshot of the final
/// state. A repeated `end_execution` for an already written [`Execution`]
/// is ignored too.
///
/// [JSON report]: crate::report
#[derive(Debug)]
pub struct JsonReporter<Out = io::Sink> {
    /// Where to write the report.
    destination: Destination<Out>,

    /// [`Execution`] whose report was written already.
    written: Option<ExecutionId>,
}

impl JsonReporter {
    /// Creates a new [`JsonReporter`] writing the report into a file at the
    /// given `path`.
    #[must_use]
    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self { destination: Destination::Path(path.into()), written: None }
    }
}

impl<Out: io::Write> JsonReporter<Out> {
    /// Creates a new [`JsonReporter`] writing the report into the given
    /// `output`.
    #[must_use]
    pub const fn new(output: Out) -> Self {
        Self { destination: Destination::Writer(output), written: None }
    }

    /// Returns the underlying output, if writing into one.
    #[must_use]
    pub const fn output(&self) -> Option<&Out> {
        match &self.destination {
            Destination::Writer(out) => Some(out),
            Destination::Path(_) => None,
        }
    }
}

#[async_trait]
impl<Out: io::Write + Send> Reporter for JsonReporter<Out> {
    fn name(&self) -> &str {
        "json"
    }

    async fn start_execution(&mut self, _: &Execution) -> anyhow::Result<()> {
        Ok(())
    }

    async fn end_execution(&mut self, execution: &Execution) -> anyhow::Result<()> {
        if self.written.as_ref() == Some(execution.id()) {
            return Ok(());
        }
        let json = report::to_json(execution)?;
        match &mut self.destination {
            Destination::Path(path) => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    fs::create_dir_all(dir).with_context(|| {
                        format!("failed to create `{}` directory", dir.display())
                    })?;
                }
                fs::write(&*path, json).with_context(|| {
                    format!("failed to write report to `{}`", path.display())
                })?;
            }
            Destination::Writer(out) => {
                out.write_all(json.as_bytes())?;
                out.flush()?;
            }
        }
        self.written = Some(execution.id().clone());
        Ok(())
    }

    async fn start_scenario(&mut self, _: &Scenario) -> anyhow::Result<()> {
        Ok(())
    }

    async fn end_scenario(&mut self, _: &Scenario) -> anyhow::Result<()> {
        Ok(())
    }

    async fn start_step(&mut self, _: &Scenario, _: &Step) -> anyhow::Result<()> {
        Ok(())
    }

    async fn end_step(&mut self, _: &Scenario, _: &Step) -> anyhow::Result<()> {
        Ok(())
    }
}
