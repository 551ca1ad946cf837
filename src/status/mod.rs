//! Rendering playback into status text, and deciding when to republish

use std::time::Duration;

use crate::models::PlaybackSnapshot;

pub const PLAY_GLYPH: &str = "▶";
pub const PAUSE_GLYPH: &str = "⏸";

pub const DEFAULT_IDLE_CLEAR: Duration = Duration::from_secs(120);

/// Turns snapshots into the canonical status string.
#[derive(Debug, Clone)]
pub struct StatusRenderer {
    label: String,
    idle_clear: Duration,
}

impl StatusRenderer {
    pub fn new(label: impl Into<String>, idle_clear: Duration) -> Self {
        Self {
            label: label.into(),
            idle_clear,
        }
    }

    /// Render a snapshot.
    ///
    /// A paused track whose provider timestamp is older than the idle-clear
    /// threshold renders as the empty string, which clears the status.
    pub fn render(&self, snapshot: &PlaybackSnapshot) -> String {
        let paused_for = snapshot.observed_at - snapshot.provider_timestamp;
        if !snapshot.is_playing && paused_for > self.idle_clear.as_secs_f64() {
            return String::new();
        }

        let glyph = if snapshot.is_playing {
            PLAY_GLYPH
        } else {
            PAUSE_GLYPH
        };
        format!(
            "{}: {}{} - {}",
            self.label, glyph, snapshot.primary_artist, snapshot.title
        )
    }
}

/// Plain string inequality. Identical renders never republish.
pub fn should_publish(previous: &str, candidate: &str) -> bool {
    previous != candidate
}
