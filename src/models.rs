//! Data structures shared across airwatch
//!
//! - **Renditions**: candidate media streams produced by a resolver
//! - **Playback**: the request handed to a receiver and its start position
//! - **Position**: one answer from the receiver's `/scrub` endpoint

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Rendition Models
// =============================================================================

/// One candidate encoding of a media source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    /// Resolver-specific identifier (e.g. "22", "hls-720p")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
    /// Container extension ("mp4", "webm", ...)
    pub ext: String,
    /// Audio codec, when the source declares one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acodec: Option<String>,
    /// Total bitrate in kbit/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Direct media URL
    pub url: String,
}

impl Rendition {
    /// Create a rendition with only the required fields set
    pub fn new(ext: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            format_id: None,
            ext: ext.into(),
            acodec: None,
            bitrate: None,
            width: None,
            height: None,
            url: url.into(),
        }
    }

    pub fn with_acodec(mut self, acodec: impl Into<String>) -> Self {
        self.acodec = Some(acodec.into());
        self
    }

    pub fn with_bitrate(mut self, bitrate: f64) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Value of a ranking key, if this rendition carries it
    pub fn rank_value(&self, key: RankKey) -> Option<f64> {
        match key {
            RankKey::Bitrate => self.bitrate,
            RankKey::Width => self.width.map(f64::from),
            RankKey::Height => self.height.map(f64::from),
        }
    }

    /// Format dimensions as "1280x720" or "?"
    pub fn format_size(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            (Some(w), None) => format!("{}x?", w),
            (None, Some(h)) => format!("?x{}", h),
            (None, None) => "?".to_string(),
        }
    }
}

impl fmt::Display for Rendition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<10} {:<5} {:<12} {:>9} {:<10}",
            self.format_id.as_deref().unwrap_or("-"),
            self.ext,
            self.acodec.as_deref().unwrap_or("-"),
            self.bitrate
                .map(|b| format!("{:.0}k", b))
                .unwrap_or_else(|| "?".to_string()),
            self.format_size()
        )
    }
}

/// Field used to rank renditions against each other, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankKey {
    Bitrate,
    Width,
    Height,
}

impl RankKey {
    /// Keys in the order they are considered
    pub const PRIORITY: [RankKey; 3] = [RankKey::Bitrate, RankKey::Width, RankKey::Height];
}

impl fmt::Display for RankKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankKey::Bitrate => write!(f, "bitrate"),
            RankKey::Width => write!(f, "width"),
            RankKey::Height => write!(f, "height"),
        }
    }
}

// =============================================================================
// Playback Models
// =============================================================================

/// Fraction sent when playback should begin at the start. The receiver
/// treats exactly 0 as "unset".
pub const MIN_START_FRACTION: f64 = 0.0001;

/// Where playback should begin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StartPosition {
    /// From the beginning of the media
    #[default]
    Beginning,
    /// Fraction of the media in (0, 1), sent with the play request
    Fraction(f64),
    /// Absolute offset in seconds, applied with a seek once playback runs
    Timestamp(u64),
}

impl StartPosition {
    /// Parse a start argument.
    ///
    /// Accepts `hh:mm:ss` / `mm:ss` timestamps, fractions such as `0.33`,
    /// and `0` / empty for the beginning.
    pub fn parse(s: &str) -> Result<Self, &'static str> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(StartPosition::Beginning);
        }

        if s.contains(':') {
            return parse_timestamp(s)
                .map(StartPosition::Timestamp)
                .ok_or("Invalid timestamp (expected hh:mm:ss or mm:ss)");
        }

        let value: f64 = s
            .parse()
            .map_err(|_| "Invalid start position (expected hh:mm:ss or a fraction like 0.25)")?;

        if value == 0.0 {
            return Ok(StartPosition::Beginning);
        }
        if !s.contains('.') {
            return Err("Invalid start position (expected hh:mm:ss or a fraction like 0.25)");
        }
        if !(0.0..1.0).contains(&value) {
            return Err("Start fraction must be between 0 and 1");
        }
        Ok(StartPosition::Fraction(value))
    }

    /// Fraction to send in the play request
    pub fn play_fraction(&self) -> f64 {
        match self {
            // Anything smaller would go on the wire as 0.0000
            StartPosition::Fraction(f) => f.max(MIN_START_FRACTION),
            StartPosition::Beginning | StartPosition::Timestamp(_) => MIN_START_FRACTION,
        }
    }

    /// Seek target to issue after playback starts, if any
    pub fn deferred_seek(&self) -> Option<u64> {
        match self {
            StartPosition::Timestamp(secs) => Some(*secs),
            _ => None,
        }
    }
}

/// Parse `hh:mm:ss` or `mm:ss` into seconds. Values that overflow are rejected.
fn parse_timestamp(s: &str) -> Option<u64> {
    let parts: Vec<u64> = s
        .split(':')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    let (hours, mins, secs) = match parts.as_slice() {
        [m, sec] => (0, *m, *sec),
        [h, m, sec] => (*h, *m, *sec),
        _ => return None,
    };
    hours
        .checked_mul(3600)?
        .checked_add(mins.checked_mul(60)?)?
        .checked_add(secs)
}

/// Everything needed to start one playback on one receiver
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    /// Receiver host or IP address
    pub host: String,
    /// Direct media URL the receiver will fetch
    pub url: String,
    pub start: StartPosition,
}

impl PlaybackRequest {
    pub fn new(host: impl Into<String>, url: impl Into<String>, start: StartPosition) -> Self {
        Self {
            host: host.into(),
            url: url.into(),
            start,
        }
    }
}

// =============================================================================
// Position Models
// =============================================================================

/// Result of one `/scrub` poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionSample {
    /// Receiver is playing media
    Playing {
        fraction: f64,
        position: f64,
        duration: f64,
    },
    /// Nothing is playing, or the answer could not be interpreted
    Idle,
}

impl PositionSample {
    /// Parse a `/scrub` body.
    ///
    /// Format:
    /// ```text
    /// duration: 5400.000000
    /// position: 12.503000
    /// ```
    /// Missing fields, unparseable numbers and a zero duration all yield `Idle`.
    pub fn parse_scrub(body: &str) -> Self {
        let mut position = None;
        let mut duration = None;

        for line in body.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let Ok(value) = value.trim().parse::<f64>() else {
                continue;
            };
            match key.trim() {
                "position" => position = Some(value),
                "duration" => duration = Some(value),
                _ => {}
            }
        }

        match (position, duration) {
            (Some(position), Some(duration))
                if duration.is_finite() && position.is_finite() && duration > 0.0 =>
            {
                PositionSample::Playing {
                    fraction: position / duration,
                    position,
                    duration,
                }
            }
            _ => PositionSample::Idle,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PositionSample::Playing { .. })
    }
}

// =============================================================================
// Time Formatting
// =============================================================================

/// Format seconds as `h:mm:ss` when at least an hour, else `mm:ss`
pub fn format_time(seconds: u64) -> String {
    let (hours, minutes, secs) = split_time(seconds);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Format `elapsed / total`, using the long form for both once the total
/// reaches an hour so the two columns line up
pub fn format_progress(current: u64, total: u64) -> String {
    if total >= 3600 {
        let (h, m, s) = split_time(current);
        format!("{}:{:02}:{:02} / {}", h, m, s, format_time(total))
    } else {
        format!("{} / {}", format_time(current), format_time(total))
    }
}

fn split_time(seconds: u64) -> (u64, u64, u64) {
    let minutes = seconds / 60;
    (minutes / 60, minutes % 60, seconds % 60)
}
