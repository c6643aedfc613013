// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Destinations of shipped [`LogRecord`] batches.

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write as _},
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;

use super::LogRecord;

/// External system receiving batches of [`LogRecord`]s.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Identity of this [`Sink`] used in logs and errors.
    fn name(&self) -> &str;

    /// Delivers a whole `batch`.
    ///
    /// # Errors
    ///
    /// If the `batch` wasn't accepted. It may be offered again.
    async fn send(&self, batch: &[LogRecord]) -> anyhow::Result<()>;
}

/// Local last-resort store for batches a [`Sink`] couldn't take.
///
/// Synchronous, so it's usable while dropping.
pub trait Fallback: Send + Sync {
    /// Appends a whole `batch`.
    ///
    /// # Errors
    ///
    /// If the `batch` couldn't be stored.
    fn append(&self, batch: &[LogRecord]) -> io::Result<()>;
}

/// File of newline-delimited JSON [`LogRecord`]s, appended to.
///
/// Works both as a [`Sink`] and as a [`Fallback`].
#[derive(Debug)]
pub struct JsonLinesFile {
    /// Location of the file.
    path: PathBuf,

    /// Serializes appends from concurrent callers.
    lock: Mutex<()>,
}

impl JsonLinesFile {
    /// Creates a new [`JsonLinesFile`] at the given `path`. Nothing is
    /// touched on disk until the first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// Returns the location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every [`LogRecord`] stored in the file so far.
    ///
    /// # Errors
    ///
    /// If the file can't be read or holds a malformed line.
    pub fn read_all(&self) -> io::Result<Vec<LogRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(io::Error::from))
            .collect()
    }
}

impl Fallback for JsonLinesFile {
    fn append(&self, batch: &[LogRecord]) -> io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut out = BufWriter::new(file);
        for record in batch {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()
    }
}

#[async_trait]
impl Sink for JsonLinesFile {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn send(&self, batch: &[LogRecord]) -> anyhow::Result<()> {
        self.append(batch)?;
        Ok(())
    }
}
