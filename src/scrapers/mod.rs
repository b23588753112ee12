//! Page fetching, payload extraction and request pacing.

pub mod extract;
mod http_client;
pub mod pacing;

pub use extract::{extract_actions, ActionSequence, ExtractError};
pub use http_client::{resolve_user_agent, FetchError, HttpClient, DEFAULT_USER_AGENT};
pub use pacing::Pacing;

use async_trait::async_trait;

/// Markup fetched for one game page.
#[derive(Debug, Clone)]
pub struct Page {
    /// URL the page was requested from.
    pub url: String,
    /// Response body as text.
    pub html: String,
}

impl Page {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Source of game pages.
///
/// Implementations perform exactly one request per call; retrying is the
/// crawl controller's job.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError>;
}
