//! Output directory housekeeping
//!
//! ffmpeg writes `live.m3u8` plus `live_00000.ts`, `live_00001.ts`, ... into one
//! flat directory. The supervisor clears them before every launch and reports
//! their freshness on every status call. Nothing here is cached: the external
//! process mutates the directory behind our back.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tokio::fs;

pub const PLAYLIST_NAME: &str = "live.m3u8";
pub const SEGMENT_PREFIX: &str = "live_";
pub const SEGMENT_EXTENSION: &str = ".ts";
/// ffmpeg `-hls_segment_filename` pattern producing names accepted by [`is_segment_name`]
pub const SEGMENT_TEMPLATE: &str = "live_%05d.ts";

/// Scratch file ffmpeg may leave next to the playlist while rewriting it
const PLAYLIST_SCRATCH_NAME: &str = "live.m3u8.tmp";

#[must_use]
pub fn is_playlist_name(name: &str) -> bool {
    name == PLAYLIST_NAME
}

/// `live_` + one or more digits + `.ts`
#[must_use]
pub fn is_segment_name(name: &str) -> bool {
    name.strip_prefix(SEGMENT_PREFIX)
        .and_then(|rest| rest.strip_suffix(SEGMENT_EXTENSION))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Anything a relay run produces in the output directory.
#[must_use]
pub fn is_artifact_name(name: &str) -> bool {
    is_playlist_name(name) || is_segment_name(name) || name == PLAYLIST_SCRATCH_NAME
}

/// Freshness of the relay output, as seen right now
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactReport {
    pub playlist_exists: bool,
    /// Seconds since the playlist was last written, one decimal
    pub playlist_age_seconds: Option<f64>,
    pub segment_count: usize,
}

/// Owns the relay output directory
#[derive(Debug, Clone)]
pub struct OutputHousekeeper {
    dir: PathBuf,
}

impl OutputHousekeeper {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn playlist_path(&self) -> PathBuf {
        self.dir.join(PLAYLIST_NAME)
    }

    #[must_use]
    pub fn segment_template_path(&self) -> PathBuf {
        self.dir.join(SEGMENT_TEMPLATE)
    }

    /// Delete every relay artifact, creating the directory if needed.
    ///
    /// Files that disappear between listing and removal are not errors; the
    /// previous ffmpeg may still be deleting its own segments.
    pub async fn purge(&self) -> io::Result<usize> {
        fs::create_dir_all(&self.dir).await?;

        let mut removed = 0;
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_artifact_name(name) {
                continue;
            }
            match entry.file_type().await {
                Ok(ft) if ft.is_file() => {}
                _ => continue,
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(dir = %self.dir.display(), removed, "Purged relay output");
        Ok(removed)
    }

    /// Inspect the output directory. A missing directory reads as empty.
    pub async fn inspect(&self) -> ArtifactReport {
        let mut report = ArtifactReport::default();

        if let Ok(meta) = fs::metadata(self.playlist_path()).await {
            if meta.is_file() {
                report.playlist_exists = true;
                report.playlist_age_seconds = meta.modified().ok().map(age_seconds);
            }
        }

        if let Ok(mut entries) = fs::read_dir(&self.dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if !entry.file_name().to_str().is_some_and(is_segment_name) {
                    continue;
                }
                // Same rule as purge: only regular files count
                if entry.file_type().await.is_ok_and(|ft| ft.is_file()) {
                    report.segment_count += 1;
                }
            }
        }

        report
    }
}

fn age_seconds(modified: SystemTime) -> f64 {
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default()
        .as_secs_f64();
    (age * 10.0).round() / 10.0
}
