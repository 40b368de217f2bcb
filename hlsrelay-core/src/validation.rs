//! Field-level validation helpers
//!
//! Shared by the relay configuration model and the server settings. Each helper
//! checks one constraint and reports the offending field by name so callers can
//! surface the first violation verbatim.

use std::ops::RangeInclusive;

use url::Url;

// ============================================================================
// Canonical validation limits
// ============================================================================

/// Segment duration in seconds
pub const HLS_TIME_RANGE: RangeInclusive<u32> = 2..=10;
/// Playlist buffer window in minutes
pub const BUFFER_MINUTES_RANGE: RangeInclusive<u32> = 1..=10;
/// Explicit playlist length in segments
pub const HLS_LIST_SIZE_RANGE: RangeInclusive<u32> = 15..=600;
/// ffmpeg worker threads (0 lets ffmpeg decide)
pub const FFMPEG_THREADS_RANGE: RangeInclusive<u32> = 0..=16;
/// Player-side live sync delay in seconds
pub const PLAYER_DELAY_RANGE: RangeInclusive<u32> = 20..=240;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validation result
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check that `value` lies inside the closed `range`.
pub fn check_range(field: &str, value: u32, range: &RangeInclusive<u32>) -> ValidationResult<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("must be between {} and {}", range.start(), range.end()),
        ))
    }
}

/// Check that a string field has visible content.
pub fn check_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "is required"))
    } else {
        Ok(())
    }
}

/// Parse `value` as an absolute http(s) URL with a host.
pub fn check_http_url(field: &str, value: &str) -> ValidationResult<Url> {
    check_required(field, value)?;

    let url = Url::parse(value.trim())
        .map_err(|e| ValidationError::new(field, format!("is not a valid URL: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(ValidationError::new(field, "must be http/https")),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::new(field, "must include a host"));
    }

    Ok(url)
}
