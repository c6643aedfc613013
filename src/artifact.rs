// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Files produced alongside a run (screenshots, videos, traces, logs).
//!
//! Producers hand over a path and metadata only. Reading the file is left to
//! the reporters that upload it.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use derive_more::with_trait::Display;
use mime::Mime;

/// Kind of an [`Artifact`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ArtifactKind {
    /// Page screenshot.
    #[display("screenshot")]
    Screenshot,

    /// Screen recording.
    #[display("video")]
    Video,

    /// Browser trace archive.
    #[display("trace")]
    Trace,

    /// Plain text log.
    #[display("log")]
    Log,
}

impl FromStr for ArtifactKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "screenshot" => Ok(Self::Screenshot),
            "video" => Ok(Self::Video),
            "trace" => Ok(Self::Trace),
            "log" => Ok(Self::Log),
            _ => Err("possible options: screenshot, video, trace, log"),
        }
    }
}

/// File attached to a [`Scenario`] or one of its [`Step`]s.
///
/// [`Scenario`]: crate::Scenario
/// [`Step`]: crate::Step
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifact {
    /// Location of the file.
    pub path: PathBuf,

    /// What the file contains.
    pub kind: ArtifactKind,

    /// Optional display name, defaults to the file name.
    pub name: Option<String>,
}

impl Artifact {
    /// Creates a new unnamed [`Artifact`].
    #[must_use]
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), kind, name: None }
    }

    /// Sets the display name of this [`Artifact`].
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the display name: the explicit one, or the file name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map_or_else(|| self.kind.to_string(), |n| n.to_string_lossy().into_owned())
        })
    }

    /// Infers the [`Mime`] type from the file extension, falling back to
    /// the [`ArtifactKind`].
    #[must_use]
    pub fn mime(&self) -> Mime {
        let by_extension = extension(&self.path).and_then(|ext| match ext.as_str() {
            "png" => Some(mime::IMAGE_PNG),
            "jpg" | "jpeg" => Some(mime::IMAGE_JPEG),
            "webm" => parse_mime("video/webm"),
            "mp4" => parse_mime("video/mp4"),
            "zip" => parse_mime("application/zip"),
            "json" => Some(mime::APPLICATION_JSON),
            "log" | "txt" => Some(mime::TEXT_PLAIN_UTF_8),
            _ => None,
        });
        by_extension.unwrap_or_else(|| match self.kind {
            ArtifactKind::Screenshot => mime::IMAGE_PNG,
            ArtifactKind::Log => mime::TEXT_PLAIN_UTF_8,
            ArtifactKind::Video | ArtifactKind::Trace => mime::APPLICATION_OCTET_STREAM,
        })
    }
}

/// Returns the lowercase extension of the `path`.
fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase())
}

/// Parses a well-known [`Mime`] literal.
fn parse_mime(raw: &str) -> Option<Mime> {
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_mime_from_extension() {
        assert_eq!(Artifact::new(ArtifactKind::Screenshot, "a/shot.JPG").mime(), mime::IMAGE_JPEG);
        assert_eq!(Artifact::new(ArtifactKind::Video, "rec.webm").mime().essence_str(), "video/webm");
        assert_eq!(Artifact::new(ArtifactKind::Trace, "trace.zip").mime().essence_str(), "application/zip");
    }

    #[test]
    fn falls_back_to_kind() {
        assert_eq!(Artifact::new(ArtifactKind::Screenshot, "shot").mime(), mime::IMAGE_PNG);
        assert_eq!(Artifact::new(ArtifactKind::Trace, "trace.bin").mime(), mime::APPLICATION_OCTET_STREAM);
    }

    #[test]
    fn display_name() {
        assert_eq!(Artifact::new(ArtifactKind::Log, "/tmp/console.log").display_name(), "console.log");
        assert_eq!(Artifact::new(ArtifactKind::Log, "/").display_name(), "log");
        assert_eq!(
            Artifact::new(ArtifactKind::Video, "v.mp4").named("checkout run").display_name(),
            "checkout run",
        );
    }

    #[test]
    fn kind_parses() {
        assert_eq!("Video".parse(), Ok(ArtifactKind::Video));
        assert!("gif".parse::<ArtifactKind>().is_err());
    }
}
