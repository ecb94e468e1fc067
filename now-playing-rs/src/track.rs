use serde::{Deserialize, Serialize};

/// Artist placeholder for continuous programs with no discrete track.
pub const LIVE_SENTINEL: &str = "En direct";

/// Artist placeholder shown while the first metadata cycle is in flight.
pub const LOADING_LABEL: &str = "Chargement...";

/// Provider-agnostic record of what a station is currently playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTrack {
    pub title: String,
    pub artist: String,
    #[serde(rename = "coverUrl")]
    pub cover_url: Option<String>,
}

impl NormalizedTrack {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, cover_url: Option<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            cover_url: cover_url.filter(|url| !url.trim().is_empty()),
        }
    }

    pub fn live(title: impl Into<String>, cover_url: Option<String>) -> Self {
        Self::new(title, LIVE_SENTINEL, cover_url)
    }

    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn is_live(&self) -> bool {
        self.artist == LIVE_SENTINEL
    }

    /// Lowercase `title-artist` composite used to deduplicate history.
    pub fn identity_key(&self) -> String {
        identity_key(&self.title, &self.artist)
    }
}

pub fn identity_key(title: &str, artist: &str) -> String {
    format!("{title}-{artist}").to_lowercase()
}
