use crate::config::NetworkConfig;
use crate::internal::models::{FeedResponse, FeedSource, HeadlineItem};
use crate::utils::html::clean_title;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the RSS-to-JSON conversion service.
///
/// One `GET <endpoint>?rss_url=<feed url>` per feed. Errors are
/// `anyhow::Result` with context naming the feed so the caller can log them
/// without losing the underlying cause.
#[derive(Clone)]
pub struct FeedApi {
    client: Client,
    endpoint: String,
}

impl FeedApi {
    pub fn new(config: &NetworkConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("tui-headlines/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build configured HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }

    /// Point the client at another endpoint, e.g. a mock server.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// GET the endpoint with `query` and deserialize the JSON body into `T`.
    /// Non-2xx statuses are errors.
    async fn get_json<T>(&self, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(query)
            .send()
            .await
            .with_context(|| format!("failed to send GET request to {}", self.endpoint))?
            .error_for_status()
            .context("conversion service returned an error status")?;

        resp.json::<T>()
            .await
            .with_context(|| format!("failed to parse JSON response from {}", self.endpoint))
    }

    /// Fetch and convert one feed.
    pub async fn fetch_feed(&self, feed: &FeedSource) -> Result<Vec<HeadlineItem>> {
        let response: FeedResponse = self
            .get_json(&[("rss_url", feed.url.as_str())])
            .await
            .with_context(|| format!("fetch_feed failed for {}", feed.name))?;

        if response.status.as_deref() == Some("error") {
            anyhow::bail!(
                "conversion service rejected {}: {}",
                feed.name,
                response.message.as_deref().unwrap_or("no message")
            );
        }

        Ok(response
            .items
            .into_iter()
            .map(|item| HeadlineItem {
                title: clean_title(&item.title),
                ..item
            })
            .collect())
    }
}
