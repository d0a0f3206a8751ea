use std::time::{Duration, Instant};

use anyhow::Result;

use super::cache::CacheStore;
use super::models::{FeedResult, FeedSource, HeadlineItem};
use crate::api::FeedApi;

/// Where a batch of results came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Cache,
    Network,
}

/// Outcome of one fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub results: Vec<FeedResult>,
    pub origin: FetchOrigin,
    /// Sources that contributed nothing this cycle.
    pub failed: Vec<String>,
}

/// Fetches every configured feed, one after another, through the
/// conversion service, with the headline cache in front.
#[derive(Clone)]
pub struct FeedFetcher {
    api: FeedApi,
    feeds: Vec<FeedSource>,
    cache: CacheStore,
    max_retries: u32,
    retry_delay: Duration,
}

impl FeedFetcher {
    pub fn new(api: FeedApi, feeds: Vec<FeedSource>, cache: CacheStore) -> Self {
        Self {
            api,
            feeds,
            cache,
            max_retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    /// Allow `max_retries` extra attempts per source, `delay` apart.
    pub fn with_retries(mut self, max_retries: u32, delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = delay;
        self
    }

    pub fn feeds(&self) -> &[FeedSource] {
        &self.feeds
    }

    /// Fetch all feeds.
    ///
    /// With `use_cache` and a fresh, readable cache entry no request is made.
    /// Otherwise each source is requested in configured order; a failing
    /// source is logged and skipped. The collected results, even when empty,
    /// replace the cache entry.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_all(&self, use_cache: bool) -> FetchOutcome {
        if use_cache && self.cache.is_valid() {
            if let Some(results) = self.cache.load() {
                tracing::info!(sources = results.len(), "Loading from cache");
                return FetchOutcome {
                    results,
                    origin: FetchOrigin::Cache,
                    failed: Vec::new(),
                };
            }
            tracing::info!("Cache time is fresh but payload is unreadable, fetching");
        }

        tracing::info!(sources = self.feeds.len(), "Fetching fresh data");
        let start = Instant::now();
        let mut results = Vec::with_capacity(self.feeds.len());
        let mut failed = Vec::new();

        for feed in &self.feeds {
            match self.fetch_with_retries(feed).await {
                Ok(items) => {
                    tracing::debug!(source = %feed.name, items = items.len(), "Fetched feed");
                    results.push(FeedResult {
                        feed: feed.clone(),
                        items,
                    });
                }
                Err(e) => {
                    tracing::warn!(source = %feed.name, "Error fetching feed: {:#}", e);
                    failed.push(feed.name.clone());
                }
            }
        }

        self.cache.save(&results);
        tracing::info!(
            elapsed = ?start.elapsed(),
            succeeded = results.len(),
            failed = failed.len(),
            "Fetch cycle complete"
        );

        FetchOutcome {
            results,
            origin: FetchOrigin::Network,
            failed,
        }
    }

    async fn fetch_with_retries(&self, feed: &FeedSource) -> Result<Vec<HeadlineItem>> {
        let mut attempt = 0;
        loop {
            match self.api.fetch_feed(feed).await {
                Ok(items) => return Ok(items),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(source = %feed.name, attempt, "Retrying after error: {:#}", e);
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
