//! Image backend trait and error types

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while downloading or captioning an image
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Caption unavailable: {0}")]
    CaptionUnavailable(String),

    #[error("Failed to decode caption response: {0}")]
    Decode(String),
}

/// Result type for enrichment operations
pub type EnrichResult<T> = Result<T, EnrichError>;

/// Fetches image bytes and produces captions
///
/// Both operations are best-effort from the crawler's point of view: an error
/// leaves the corresponding field of the image record empty.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Downloads `url` to `dest` and returns the path actually written
    async fn download(&self, url: &str, dest: &Path) -> EnrichResult<PathBuf>;

    /// Produces a caption for a previously downloaded image
    async fn caption(&self, path: &Path) -> EnrichResult<String>;

    /// Returns false if this backend has no captioning service
    fn captions_enabled(&self) -> bool {
        true
    }
}
