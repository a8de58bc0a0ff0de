//! Currently-playing track and playback progress.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpotifyTrack {
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub timestamps: Option<Timestamps>,
    pub song: String,
    pub artist: String,
    #[serde(default)]
    pub album_art_url: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
}

/// Playback window in unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Timestamps {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackProgress {
    pub elapsed_ms: i64,
    pub duration_ms: i64,
}

impl TrackProgress {
    /// Fraction played, in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        (self.elapsed_ms as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
    }
}

impl SpotifyTrack {
    /// Playback progress at `now_ms`. `None` when the track carries no
    /// usable timestamps.
    pub fn progress_at(&self, now_ms: i64) -> Option<TrackProgress> {
        let ts = self.timestamps?;
        let duration_ms = ts.end.checked_sub(ts.start)?;
        if duration_ms <= 0 {
            return None;
        }
        let elapsed_ms = now_ms.saturating_sub(ts.start).clamp(0, duration_ms);
        Some(TrackProgress {
            elapsed_ms,
            duration_ms,
        })
    }
}

/// Render milliseconds as `m:ss`.
pub fn format_clock(ms: i64) -> String {
    let seconds = ms.max(0) / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
