// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for saved recordings

use crate::constants::RECORDING_FILE_PREFIX;
use crate::media::formats::extension_for;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// File name for a recording finished at `timestamp`
///
/// `camera_feed_2024-05-01T12-30-45-123Z.webm`: ISO-8601 UTC with `:` and
/// `.` replaced by `-`.
pub fn recording_file_name(format_name: &str, timestamp: DateTime<Utc>) -> String {
    let stamp = timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!(
        "{}{}.{}",
        RECORDING_FILE_PREFIX,
        stamp,
        extension_for(format_name)
    )
}

/// The directory recordings are downloaded into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloads {
    dir: PathBuf,
}

impl Downloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `fragments` one after another into `name`
    ///
    /// Creates the directory if needed. Returns the full path of the file.
    pub fn save(&self, name: &str, fragments: &[Bytes]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);

        let mut file = File::create(&path)?;
        let mut written = 0usize;
        for fragment in fragments {
            file.write_all(fragment)?;
            written += fragment.len();
        }
        file.flush()?;

        debug!(fragments = fragments.len(), "Fragments written");
        info!(path = %path.display(), bytes = written, "Recording saved");
        Ok(path)
    }
}
