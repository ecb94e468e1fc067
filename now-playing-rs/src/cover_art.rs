use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use crate::{config::CoverLookupConfig, logging::logger};

const SMALL_ARTWORK: &str = "100x100";
const LARGE_ARTWORK: &str = "600x600";

/// Secondary artwork source for tracks whose provider carries no cover.
#[async_trait]
pub trait CoverArtLookup: Send + Sync {
    async fn lookup(&self, title: &str, artist: &str) -> Option<String>;
}

/// Lookup that never finds anything; used when the secondary source is off.
pub struct NoCoverLookup;

#[async_trait]
impl CoverArtLookup for NoCoverLookup {
    async fn lookup(&self, _title: &str, _artist: &str) -> Option<String> {
        None
    }
}

#[derive(Clone)]
pub struct ItunesCoverLookup {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
}

impl ItunesCoverLookup {
    pub fn new(config: &CoverLookupConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    async fn search(&self, title: &str, artist: &str) -> anyhow::Result<Option<String>> {
        let mut url = Url::parse(&self.base_url)?;
        url.query_pairs_mut()
            .append_pair("term", &format!("{title} {artist}"))
            .append_pair("media", "music")
            .append_pair("limit", "1");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!("cover search returned {}", response.status()));
        }
        let body: SearchResponse = response.json().await?;
        Ok(body
            .results
            .into_iter()
            .next()
            .and_then(|result| result.artwork_url_100)
            .map(|url| upsize_artwork(&url)))
    }
}

#[async_trait]
impl CoverArtLookup for ItunesCoverLookup {
    async fn lookup(&self, title: &str, artist: &str) -> Option<String> {
        match self.search(title, artist).await {
            Ok(found) => found,
            Err(error) => {
                logger().debug(
                    "cover.lookup_failed",
                    json!({ "title": title, "artist": artist, "error": error.to_string() }),
                );
                None
            }
        }
    }
}

pub fn upsize_artwork(url: &str) -> String {
    url.replace(SMALL_ARTWORK, LARGE_ARTWORK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn artwork_is_upsized() {
        assert_eq!(
            upsize_artwork("https://is1-ssl.mzstatic.com/image/thumb/a/100x100bb.jpg"),
            "https://is1-ssl.mzstatic.com/image/thumb/a/600x600bb.jpg"
        );
        assert_eq!(upsize_artwork("https://img.test/raw.jpg"), "https://img.test/raw.jpg");
    }

    #[test]
    fn search_response_tolerates_missing_results() {
        let body: SearchResponse = serde_json::from_str(r#"{"resultCount":0}"#).unwrap();
        assert!(body.results.is_empty());
        let body: SearchResponse =
            serde_json::from_str(r#"{"results":[{"trackName":"Titan"}]}"#).unwrap();
        assert_eq!(body.results[0].artwork_url_100, None);
    }

    #[tokio::test]
    async fn disabled_lookup_finds_nothing() {
        assert_eq!(NoCoverLookup.lookup("Titan", "DJ Snake").await, None);
    }
}
