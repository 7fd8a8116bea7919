//! HTTP client for the MusicBrainz release endpoint.

use std::time::Duration;

use async_trait::async_trait;

use crate::{LookupError, Release, ReleaseLookup, Result};

/// Default base URL of the release lookup endpoint.
pub const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/ws/2/release/";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// reqwest-backed [`ReleaseLookup`] against the MusicBrainz web service.
///
/// Requests `inc=recordings` so the response carries the recording behind
/// each track. MusicBrainz requires an identifying User-Agent; this client
/// sends the crate name and version.
#[derive(Debug, Clone)]
pub struct MusicBrainzClient {
    http: reqwest::Client,
    base_url: String,
}

impl MusicBrainzClient {
    /// Creates a client against the given base URL with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client with an explicit per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ReleaseLookup for MusicBrainzClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_release(&self, mbid: &str) -> Result<Release> {
        let url = format!("{}{mbid}?inc=recordings", self.base_url);

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), %url, "metadata lookup rejected");
            return Err(LookupError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.json::<Release>().await?)
    }
}
