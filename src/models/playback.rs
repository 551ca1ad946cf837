//! Playback models

use serde::Deserialize;

use crate::error::FetchError;

/// What the provider says is playing, as of one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub title: String,
    pub primary_artist: String,
    /// Provider's playback timestamp, unix seconds
    pub provider_timestamp: f64,
    pub is_playing: bool,
    /// Local time the snapshot was taken, unix seconds
    pub observed_at: f64,
}

/// `GET /me/player` response (only the fields we use)
#[derive(Debug, Deserialize)]
pub struct PlayerResponse {
    pub is_playing: bool,
    /// Milliseconds since the epoch
    pub timestamp: i64,
    pub item: Option<PlayerItem>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerItem {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
pub struct Artist {
    pub name: String,
}

impl PlayerResponse {
    /// Convert to a snapshot. `None` when nothing identifiable is loaded
    /// (adverts and other items come back with `item: null`).
    pub fn into_snapshot(self, observed_at: f64) -> Result<Option<PlaybackSnapshot>, FetchError> {
        let Some(item) = self.item else {
            return Ok(None);
        };
        let primary_artist = item
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .ok_or_else(|| FetchError::Malformed("track has no artists".into()))?;

        Ok(Some(PlaybackSnapshot {
            title: item.name,
            primary_artist,
            provider_timestamp: self.timestamp as f64 / 1000.0,
            is_playing: self.is_playing,
            observed_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_artist_only() {
        let resp: PlayerResponse = serde_json::from_value(json!({
            "timestamp": 1_600_000_000_500i64,
            "is_playing": true,
            "progress_ms": 1000,
            "item": {
                "name": "Foo",
                "artists": [{"name": "Bar"}, {"name": "Baz"}]
            }
        }))
        .unwrap();

        let snap = resp.into_snapshot(1_600_000_010.0).unwrap().unwrap();
        assert_eq!(snap.title, "Foo");
        assert_eq!(snap.primary_artist, "Bar");
        assert_eq!(snap.provider_timestamp, 1_600_000_000.5);
        assert!(snap.is_playing);
        assert_eq!(snap.observed_at, 1_600_000_010.0);
    }

    #[test]
    fn test_null_item_is_nothing_playing() {
        let resp: PlayerResponse = serde_json::from_value(json!({
            "timestamp": 0,
            "is_playing": true,
            "item": null
        }))
        .unwrap();
        assert!(resp.into_snapshot(0.0).unwrap().is_none());
    }

    #[test]
    fn test_no_artists_is_malformed() {
        let resp: PlayerResponse = serde_json::from_value(json!({
            "timestamp": 0,
            "is_playing": false,
            "item": {"name": "Foo", "artists": []}
        }))
        .unwrap();
        assert!(matches!(
            resp.into_snapshot(0.0),
            Err(FetchError::Malformed(_))
        ));
    }
}
