//! Data models for playback state

mod playback;

pub use playback::*;

/// Current wall-clock time in fractional unix seconds
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
