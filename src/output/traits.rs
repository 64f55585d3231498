//! Output sink trait and error types
//!
//! This module defines where finished documents go and the errors that can
//! occur getting them there.

use crate::output::document::Document;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for a finished (or partial) crawl document
///
/// A crawl calls `persist` exactly once, after the scroll loop has stopped.
pub trait DocumentSink {
    /// Stores the document
    fn persist(&self, document: &Document) -> OutputResult<()>;

    /// Human-readable description of where documents go, for logs
    fn describe(&self) -> String;
}
