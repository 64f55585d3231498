//! Output module for finished crawl documents
//!
//! This module handles:
//! - The document model (profile plus ordered posts)
//! - Assembling and persisting the document as JSON
//! - Summarizing the crawl for the operator

pub mod document;
mod json;
pub mod stats;
mod traits;

pub use document::{assemble_document, Document, ImageRef, Post, Profile};
pub use json::{document_value, write_document, JsonFileSink};
pub use stats::{print_report, CrawlReport};
pub use traits::{DocumentSink, OutputError, OutputResult};
