//! Image enrichment module
//!
//! This module handles:
//! - Downloading post images to deterministic local paths
//! - Captioning downloaded images through an optional HTTP service
//! - Degrading to URL-only image records when either step fails

mod enricher;
mod http;
mod traits;

pub use enricher::ImageEnricher;
pub use http::{build_http_client, HttpImageBackend};
pub use traits::{EnrichError, EnrichResult, ImageBackend};
