//! Crawl error types.

use thiserror::Error;

use crate::scrapers::{ExtractError, FetchError};
use crate::storage::ExportError;

/// Why a single game attempt produced no file.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl CrawlError {
    /// Transient failures worth another attempt at the same game.
    ///
    /// Extraction failures are properties of the page that came back and are
    /// not retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CrawlError::Fetch(_) | CrawlError::Export(ExportError::Io { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_fetch_and_write_failures_are_retryable() {
        let fetch = CrawlError::from(FetchError::Status {
            url: "https://www.nba.com/game/0022200001/game-charts".to_string(),
            status: 503,
        });
        assert!(fetch.is_retryable());

        let write = CrawlError::from(ExportError::Io {
            path: PathBuf::from("raw/S2223-G0001.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });
        assert!(write.is_retryable());
    }

    #[test]
    fn test_extraction_failures_are_not_retryable() {
        let missing = CrawlError::from(ExtractError::MissingScript {
            url: "https://www.nba.com/game/0022200001/game-charts".to_string(),
        });
        assert!(!missing.is_retryable());

        let not_array = CrawlError::from(ExtractError::NotArray {
            url: "https://www.nba.com/game/0022200001/game-charts".to_string(),
            path: "props.pageProps.playByPlay.actions".to_string(),
        });
        assert!(!not_array.is_retryable());
    }
}
