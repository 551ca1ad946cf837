//! Remote services: the playback provider and the status sink

pub mod client;
mod player;
mod status;

use async_trait::async_trait;

use crate::error::{FetchError, PublishError};
use crate::models::PlaybackSnapshot;

pub use player::SpotifyPlayer;
pub use status::VkStatus;

/// Where playback state comes from
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    /// Current playback, or `None` when no device is active.
    async fn fetch_current(&self) -> Result<Option<PlaybackSnapshot>, FetchError>;
}

/// Where the rendered status goes
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn publish(&self, text: &str) -> Result<(), PublishError>;
}
