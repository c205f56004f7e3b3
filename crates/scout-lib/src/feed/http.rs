//! HTTP feed source

use super::{parse_feed, ListingSource};
use crate::error::{Result, ScoutError};
use crate::models::Listing;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches the feed document over HTTP(S)
pub struct HttpSource {
    client: Client,
    url: Url,
}

impl HttpSource {
    /// Create a new HTTP source
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| ScoutError::Config(format!("invalid feed URL '{}': {}", url, e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ListingSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        debug!(url = %self.url, "Fetching listing feed");

        let response = self.client.get(self.url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(ScoutError::HttpStatus {
                status: response.status().as_u16(),
                url: self.url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Feed downloaded");

        parse_feed(&body)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}
