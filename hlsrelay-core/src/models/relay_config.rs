//! Relay configuration
//!
//! The persisted, user-editable description of what to relay and how. Two
//! source schemas live behind one `source_mode` discriminator:
//! - `single`: one `source_url` plus encoding controls
//! - `catalog`: an ordered list of channels and the id of the active one
//!
//! Both are consumed through [`RelayProfile`], so the supervisor never needs
//! to know which schema produced its source.

use serde::{Deserialize, Serialize};

use crate::models::encoding::{EncodingParams, ListSize, TranscodeMode};
use crate::validation::{
    check_http_url, check_range, check_required, ValidationError, ValidationResult,
    BUFFER_MINUTES_RANGE, FFMPEG_THREADS_RANGE, HLS_LIST_SIZE_RANGE, HLS_TIME_RANGE,
    PLAYER_DELAY_RANGE,
};

pub const DEFAULT_SOURCE_URL: &str = "http://161.248.38.40:8000/play/a06v/index.m3u8";

/// Which schema supplies the relay source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    Single,
    Catalog,
}

/// One entry of the channel catalog
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Resolves what the relay should ingest and how to encode it.
pub trait RelayProfile {
    /// URL of the live source the relay should ingest.
    fn resolve_source(&self) -> ValidationResult<String>;

    /// Encoding parameters for the external process.
    fn encoding(&self) -> EncodingParams;

    /// Full check run before anything is launched. Defaults to the source
    /// check alone.
    fn validate(&self) -> ValidationResult<()> {
        self.resolve_source().map(|_| ())
    }
}

/// Persisted relay configuration
///
/// Unknown keys are ignored and missing keys fall back to [`Default`], so a
/// partial JSON document always deserializes onto the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub source_mode: SourceMode,
    pub source_url: String,
    pub channels: Vec<Channel>,
    pub active_channel_id: String,
    pub hls_time: u32,
    pub buffer_minutes: u32,
    pub hls_list_size: Option<u32>,
    pub ffmpeg_threads: u32,
    pub player_delay_seconds: u32,
    pub video_bitrate: String,
    pub audio_bitrate: String,
    pub preset: String,
    pub transcode_mode: TranscodeMode,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            source_mode: SourceMode::Single,
            source_url: DEFAULT_SOURCE_URL.to_string(),
            channels: Vec::new(),
            active_channel_id: String::new(),
            hls_time: 4,
            buffer_minutes: 2,
            hls_list_size: None,
            ffmpeg_threads: 0,
            player_delay_seconds: 75,
            video_bitrate: "2500k".to_string(),
            audio_bitrate: "128k".to_string(),
            preset: "veryfast".to_string(),
            transcode_mode: TranscodeMode::Reencode,
        }
    }
}

impl RelayConfig {
    /// The catalog entry selected by `active_channel_id`, if any.
    #[must_use]
    pub fn active_channel(&self) -> Option<&Channel> {
        self.channels
            .iter()
            .find(|c| c.id == self.active_channel_id)
    }

    fn resolve_catalog_source(&self) -> ValidationResult<String> {
        if self.channels.is_empty() {
            return Err(ValidationError::new("channels", "must not be empty"));
        }

        for (idx, channel) in self.channels.iter().enumerate() {
            check_required(&format!("channels[{idx}].id"), &channel.id)?;
            if self.channels[..idx].iter().any(|c| c.id == channel.id) {
                return Err(ValidationError::new(
                    format!("channels[{idx}].id"),
                    format!("duplicates channel id `{}`", channel.id),
                ));
            }
            check_http_url(&format!("channels[{idx}].url"), &channel.url)?;
        }

        let active = self.active_channel().ok_or_else(|| {
            ValidationError::new(
                "active_channel_id",
                format!("`{}` does not match any channel", self.active_channel_id),
            )
        })?;

        Ok(active.url.trim().to_string())
    }
}

impl RelayProfile for RelayConfig {
    fn resolve_source(&self) -> ValidationResult<String> {
        match self.source_mode {
            SourceMode::Single => {
                check_http_url("source_url", &self.source_url)?;
                Ok(self.source_url.trim().to_string())
            }
            SourceMode::Catalog => self.resolve_catalog_source(),
        }
    }

    /// Validate the whole configuration, returning the first violation.
    ///
    /// Order: source shape, numeric ranges, required strings.
    fn validate(&self) -> ValidationResult<()> {
        self.resolve_source()?;

        check_range("hls_time", self.hls_time, &HLS_TIME_RANGE)?;
        check_range("buffer_minutes", self.buffer_minutes, &BUFFER_MINUTES_RANGE)?;
        if let Some(list_size) = self.hls_list_size {
            check_range("hls_list_size", list_size, &HLS_LIST_SIZE_RANGE)?;
        }
        check_range("ffmpeg_threads", self.ffmpeg_threads, &FFMPEG_THREADS_RANGE)?;
        check_range(
            "player_delay_seconds",
            self.player_delay_seconds,
            &PLAYER_DELAY_RANGE,
        )?;

        check_required("video_bitrate", &self.video_bitrate)?;
        check_required("audio_bitrate", &self.audio_bitrate)?;
        check_required("preset", &self.preset)?;

        Ok(())
    }

    fn encoding(&self) -> EncodingParams {
        let list_size = match self.hls_list_size {
            Some(n) => ListSize::Explicit(n),
            None => ListSize::FromBuffer {
                minutes: self.buffer_minutes,
            },
        };

        EncodingParams {
            hls_time: self.hls_time,
            list_size,
            threads: self.ffmpeg_threads,
            video_bitrate: self.video_bitrate.trim().to_string(),
            audio_bitrate: self.audio_bitrate.trim().to_string(),
            preset: self.preset.trim().to_string(),
            mode: self.transcode_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::catalog_config;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RelayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_overlays_defaults() {
        let cfg: RelayConfig =
            serde_json::from_str(r#"{"hls_time": 6, "unknown_field": true}"#).unwrap();
        assert_eq!(cfg.hls_time, 6);
        assert_eq!(cfg.buffer_minutes, 2);
        assert_eq!(cfg.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(cfg.transcode_mode, TranscodeMode::Reencode);
    }

    #[test]
    fn test_rejects_non_http_source() {
        let cfg = RelayConfig {
            source_url: "rtsp://camera.local/stream".to_string(),
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.field, "source_url");
        assert_eq!(err.to_string(), "source_url must be http/https");
    }

    #[test]
    fn test_rejects_each_out_of_range_field() {
        let cases: Vec<(&str, RelayConfig)> = vec![
            ("hls_time", RelayConfig { hls_time: 1, ..Default::default() }),
            ("hls_time", RelayConfig { hls_time: 11, ..Default::default() }),
            ("buffer_minutes", RelayConfig { buffer_minutes: 0, ..Default::default() }),
            ("buffer_minutes", RelayConfig { buffer_minutes: 11, ..Default::default() }),
            ("hls_list_size", RelayConfig { hls_list_size: Some(14), ..Default::default() }),
            ("hls_list_size", RelayConfig { hls_list_size: Some(601), ..Default::default() }),
            ("ffmpeg_threads", RelayConfig { ffmpeg_threads: 17, ..Default::default() }),
            ("player_delay_seconds", RelayConfig { player_delay_seconds: 19, ..Default::default() }),
            ("player_delay_seconds", RelayConfig { player_delay_seconds: 241, ..Default::default() }),
        ];

        for (field, cfg) in cases {
            let err = cfg.validate().unwrap_err();
            assert_eq!(err.field, field, "unexpected error: {err}");
        }
    }

    #[test]
    fn test_rejects_blank_strings() {
        let cfg = RelayConfig {
            audio_bitrate: " ".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.validate().unwrap_err().to_string(), "audio_bitrate is required");
    }

    #[test]
    fn test_source_checked_before_ranges() {
        let cfg = RelayConfig {
            source_url: "ftp://x".to_string(),
            hls_time: 99,
            ..Default::default()
        };
        assert_eq!(cfg.validate().unwrap_err().field, "source_url");
    }

    #[test]
    fn test_catalog_resolves_active_channel() {
        let cfg = catalog_config("news");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.resolve_source().unwrap(), "http://example.com/news.m3u8");
    }

    #[test]
    fn test_catalog_rejects_unknown_active_channel() {
        let cfg = catalog_config("missing");
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.field, "active_channel_id");
    }

    #[test]
    fn test_catalog_rejects_empty_catalog() {
        let cfg = RelayConfig {
            channels: Vec::new(),
            ..catalog_config("news")
        };
        assert_eq!(cfg.validate().unwrap_err().field, "channels");
    }

    #[test]
    fn test_catalog_rejects_duplicate_ids() {
        let mut cfg = catalog_config("news");
        let dup = cfg.channels[0].clone();
        cfg.channels.push(dup);
        assert_eq!(cfg.validate().unwrap_err().field, "channels[2].id");
    }

    #[test]
    fn test_catalog_mode_ignores_single_source_url() {
        let cfg = RelayConfig {
            source_url: "not-a-url".to_string(),
            ..catalog_config("sports")
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_encoding_uses_explicit_list_size() {
        let cfg = RelayConfig {
            hls_list_size: Some(40),
            ..Default::default()
        };
        assert_eq!(cfg.encoding().list_size, ListSize::Explicit(40));
        assert_eq!(cfg.encoding().effective_list_size(), 40);

        let derived = RelayConfig::default().encoding();
        assert_eq!(derived.list_size, ListSize::FromBuffer { minutes: 2 });
        assert_eq!(derived.effective_list_size(), 30);
    }
}
