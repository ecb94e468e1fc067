use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use thiserror::Error;
use tokio::time::timeout;

use crate::{
    config::MetadataConfig,
    providers::{RawPayload, ResponseKind},
    stations::StationConfig,
};

const CACHE_BUSTER_PARAM: &str = "_cb";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("metadata request timed out after {0:?}")]
    Timeout(Duration),
    #[error("metadata upstream returned {0}")]
    Status(u16),
    #[error("metadata request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("metadata payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid metadata endpoint {0}")]
    InvalidUrl(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::Status(_) => "status",
            FetchError::Network(_) => "network",
            FetchError::Decode(_) => "decode",
            FetchError::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Retrieves a station's raw metadata payload, decoded according to the
/// station's declared response kind.
#[async_trait]
pub trait PayloadFetcher: Send + Sync {
    async fn fetch(&self, station: &StationConfig) -> Result<RawPayload, FetchError>;
}

#[derive(Clone)]
pub struct ProxiedFetcher {
    client: Client,
    proxy_base: String,
    timeout: Duration,
}

impl ProxiedFetcher {
    pub fn new(config: &MetadataConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            proxy_base: config.proxy_base.clone(),
            timeout: config.fetch_timeout(),
        })
    }

    async fn fetch_body(&self, url: String) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PayloadFetcher for ProxiedFetcher {
    async fn fetch(&self, station: &StationConfig) -> Result<RawPayload, FetchError> {
        let url = proxied_url(&self.proxy_base, &station.endpoint, cache_buster())?;
        let body = timeout(self.timeout, self.fetch_body(url))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        match station.response_kind() {
            ResponseKind::Json => Ok(RawPayload::Json(serde_json::from_str(&body)?)),
            ResponseKind::ScrapedMarkup => Ok(RawPayload::Markup(body)),
        }
    }
}

/// Appends the cache-busting parameter to `endpoint` and, when a proxy prefix
/// is configured, wraps the result percent-encoded behind it.
pub fn proxied_url(proxy_base: &str, endpoint: &str, cache_buster: u128) -> Result<String, FetchError> {
    let mut target =
        Url::parse(endpoint).map_err(|_| FetchError::InvalidUrl(endpoint.to_string()))?;
    target
        .query_pairs_mut()
        .append_pair(CACHE_BUSTER_PARAM, &cache_buster.to_string());

    if proxy_base.is_empty() {
        return Ok(target.to_string());
    }
    Ok(format!(
        "{proxy_base}{}",
        urlencoding::encode(target.as_str())
    ))
}

fn cache_buster() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
