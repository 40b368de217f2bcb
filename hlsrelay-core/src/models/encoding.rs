//! Encoding parameters handed to the relay supervisor

use serde::{Deserialize, Serialize};

/// Smallest playlist window the relay will ever advertise.
pub const MIN_LIST_SIZE: u32 = 15;

/// How the external process treats the incoming media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeMode {
    /// Decode and re-encode to H.264/AAC with the configured bitrates
    #[default]
    Reencode,
    /// Remux the source streams untouched
    Copy,
}

/// Where the playlist window length comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSize {
    /// Segment count given directly
    Explicit(u32),
    /// Derived from a buffer duration in minutes
    FromBuffer { minutes: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingParams {
    pub hls_time: u32,
    pub list_size: ListSize,
    pub threads: u32,
    pub video_bitrate: String,
    pub audio_bitrate: String,
    pub preset: String,
    pub mode: TranscodeMode,
}

impl EncodingParams {
    /// Number of segments kept in the playlist, never below [`MIN_LIST_SIZE`].
    #[must_use]
    pub fn effective_list_size(&self) -> u32 {
        let requested = match self.list_size {
            ListSize::Explicit(n) => n,
            ListSize::FromBuffer { minutes } => minutes
                .saturating_mul(60)
                .checked_div(self.hls_time)
                .unwrap_or(0),
        };
        requested.max(MIN_LIST_SIZE)
    }

    /// Seconds of media covered by the playlist window.
    #[must_use]
    pub fn effective_buffer_seconds(&self) -> u32 {
        self.effective_list_size().saturating_mul(self.hls_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(hls_time: u32, list_size: ListSize) -> EncodingParams {
        EncodingParams {
            hls_time,
            list_size,
            threads: 0,
            video_bitrate: "2500k".to_string(),
            audio_bitrate: "128k".to_string(),
            preset: "veryfast".to_string(),
            mode: TranscodeMode::Reencode,
        }
    }

    #[test]
    fn test_list_size_from_buffer() {
        let p = params(4, ListSize::FromBuffer { minutes: 2 });
        assert_eq!(p.effective_list_size(), 30);
        assert_eq!(p.effective_buffer_seconds(), 120);
    }

    #[test]
    fn test_list_size_floor() {
        let p = params(10, ListSize::FromBuffer { minutes: 1 });
        assert_eq!(p.effective_list_size(), 15);
        assert_eq!(p.effective_buffer_seconds(), 150);
    }

    #[test]
    fn test_list_size_rounds_down() {
        // 3 minutes / 7s segments = 25.7
        let p = params(7, ListSize::FromBuffer { minutes: 3 });
        assert_eq!(p.effective_list_size(), 25);
    }

    #[test]
    fn test_explicit_list_size() {
        assert_eq!(params(4, ListSize::Explicit(42)).effective_list_size(), 42);
        assert_eq!(params(4, ListSize::Explicit(3)).effective_list_size(), MIN_LIST_SIZE);
    }

    #[test]
    fn test_zero_segment_duration_uses_floor() {
        let p = params(0, ListSize::FromBuffer { minutes: 5 });
        assert_eq!(p.effective_list_size(), MIN_LIST_SIZE);
    }
}
