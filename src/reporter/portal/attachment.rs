// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Loading [`Artifact`]s as size-capped portal attachments.

use std::{
    fs::{self, File},
    io::{self, Read as _},
    str::FromStr,
};

use crate::Artifact;

use super::client::Attachment;

/// What to do with an [`Artifact`] exceeding the size cap.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OversizedAttachment {
    /// Upload only its leading bytes up to the cap.
    Truncate,

    /// Don't upload it at all.
    #[default]
    Skip,
}

impl FromStr for OversizedAttachment {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "truncate" => Ok(Self::Truncate),
            "skip" => Ok(Self::Skip),
            _ => Err("possible options: truncate, skip"),
        }
    }
}

/// Outcome of loading an [`Artifact`].
#[derive(Debug)]
pub(super) enum Loaded {
    /// Loaded, possibly truncated.
    Ready(Attachment),

    /// Exceeds the cap and was left out.
    Skipped {
        /// Actual size of the file in bytes.
        size: u64,
    },
}

/// Reads the file of the `artifact`, applying the `cap` in bytes with the
/// given `policy`.
pub(super) fn load(
    artifact: &Artifact,
    cap: u64,
    policy: OversizedAttachment,
) -> io::Result<Loaded> {
    let size = fs::metadata(&artifact.path)?.len();
    let oversized = size > cap;
    if oversized && policy == OversizedAttachment::Skip {
        return Ok(Loaded::Skipped { size });
    }

    let mut data = Vec::new();
    _ = File::open(&artifact.path)?.take(cap).read_to_end(&mut data)?;
    Ok(Loaded::Ready(Attachment {
        name: artifact.display_name(),
        mime: artifact.mime(),
        data,
        truncated: oversized,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArtifactKind;

    fn artifact_of(size: usize) -> (tempfile::TempDir, Artifact) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        fs::write(&path, vec![7u8; size]).unwrap();
        (dir, Artifact::new(ArtifactKind::Screenshot, path))
    }

    #[test]
    fn loads_within_cap() {
        let (_dir, artifact) = artifact_of(10);

        let Loaded::Ready(a) = load(&artifact, 10, OversizedAttachment::Skip).unwrap() else {
            panic!("expected attachment");
        };
        assert_eq!(a.data.len(), 10);
        assert!(!a.truncated);
        assert_eq!(a.name, "shot.png");
        assert_eq!(a.mime, mime::IMAGE_PNG);
    }

    #[test]
    fn truncates_oversized() {
        let (_dir, artifact) = artifact_of(64);

        let Loaded::Ready(a) = load(&artifact, 16, OversizedAttachment::Truncate).unwrap() else {
            panic!("expected attachment");
        };
        assert_eq!(a.data.len(), 16);
        assert!(a.truncated);
    }

    #[test]
    fn skips_oversized() {
        let (_dir, artifact) = artifact_of(64);

        assert!(matches!(
            load(&artifact, 16, OversizedAttachment::Skip).unwrap(),
            Loaded::Skipped { size: 64 },
        ));
    }

    #[test]
    fn fails_on_missing_file() {
        let artifact = Artifact::new(ArtifactKind::Log, "/definitely/not/here.log");

        assert!(load(&artifact, 16, OversizedAttachment::Skip).is_err());
    }
}
