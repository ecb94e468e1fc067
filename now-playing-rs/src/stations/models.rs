use serde::Serialize;

use crate::providers::{Provider, ResponseKind};

/// Static description of one station and where its metadata comes from.
#[derive(Debug, Clone, Serialize)]
pub struct StationConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "streamUrl")]
    pub stream_url: String,
    /// Metadata endpoint, fetched through the rewriting proxy.
    pub endpoint: String,
    pub provider: Provider,
    #[serde(rename = "defaultImage")]
    pub default_image: String,
    pub info: StationInfo,
}

impl StationConfig {
    pub fn response_kind(&self) -> ResponseKind {
        self.provider.response_kind()
    }

    pub fn summary(&self, favorite: bool) -> StationSummary {
        StationSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            slogan: self.info.slogan.clone(),
            stream_url: self.stream_url.clone(),
            default_image: self.default_image.clone(),
            genres: self.info.genres.clone(),
            favorite,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StationInfo {
    pub slogan: String,
    pub description: String,
    pub location: String,
    pub year: String,
    pub genres: Vec<String>,
    pub website: String,
    pub socials: Vec<SocialLink>,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationSummary {
    pub id: String,
    pub name: String,
    pub slogan: String,
    #[serde(rename = "streamUrl")]
    pub stream_url: String,
    #[serde(rename = "defaultImage")]
    pub default_image: String,
    pub genres: Vec<String>,
    pub favorite: bool,
}
