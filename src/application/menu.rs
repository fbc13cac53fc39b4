//! Menu feed loading.
//!
//! The loader obtains the published menu list exactly once per process
//! lifetime. The feed request carries `Cache-Control: no-store` so any
//! interception layer treats it as dynamic content rather than a private
//! client cache hit; the menu should reflect the latest published state even
//! though static assets are aggressively cached. A non-success status, a
//! network error, and a body that is not a well-formed item array are
//! equivalent failures: all of them substitute the embedded fallback list,
//! once, without retrying.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use metrics::counter;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::domain::menu::{MenuItem, fallback_menu};
use crate::infra::net::{Fetch, FetchError};
use crate::infra::telemetry::METRIC_MENU_FALLBACK;

/// Loads the menu feed once and answers every later call from memory.
pub struct MenuLoader {
    fetch: Arc<dyn Fetch>,
    feed_url: String,
    loaded: OnceCell<Vec<MenuItem>>,
}

#[derive(Debug, Error)]
enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("feed returned status {0}")]
    Status(StatusCode),
    #[error("feed body is not a menu item array: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("feed contained no items")]
    Empty,
}

impl MenuLoader {
    pub fn new(fetch: Arc<dyn Fetch>, feed_url: impl Into<String>) -> Self {
        Self {
            fetch,
            feed_url: feed_url.into(),
            loaded: OnceCell::new(),
        }
    }

    /// Resolve the menu list, fetching on the first call only.
    ///
    /// Concurrent first calls share one in-flight fetch; later calls return
    /// the already-loaded list. The result is never empty.
    pub async fn load(&self) -> &[MenuItem] {
        self.loaded
            .get_or_init(|| async { self.fetch_or_fallback().await })
            .await
    }

    async fn fetch_or_fallback(&self) -> Vec<MenuItem> {
        match self.fetch_feed().await {
            Ok(items) => {
                info!(
                    target: "tavola::menu",
                    items = items.len(),
                    feed = %self.feed_url,
                    "menu feed loaded"
                );
                items
            }
            Err(reason) => {
                counter!(METRIC_MENU_FALLBACK).increment(1);
                warn!(
                    target: "tavola::menu",
                    feed = %self.feed_url,
                    reason = %reason,
                    "menu feed unavailable; using embedded fallback list"
                );
                fallback_menu()
            }
        }
    }

    async fn fetch_feed(&self) -> Result<Vec<MenuItem>, FeedError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let response = self.fetch.get(&self.feed_url, &headers).await?;
        if response.status != StatusCode::OK {
            return Err(FeedError::Status(response.status));
        }

        let items: Vec<MenuItem> = serde_json::from_slice(&response.body)?;
        if items.is_empty() {
            // An empty array is a publishing mistake; the storefront must
            // never render an empty menu.
            return Err(FeedError::Empty);
        }
        Ok(items)
    }
}
