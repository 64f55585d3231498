//! State module for tracking crawl progress
//!
//! This module provides the state owned by the scroll loop during one crawl.
//!
//! # Components
//!
//! - `CrawlState`: Phase, idle counter and totals, passed through each cycle
//! - `Deduplicator`: Set of post texts already recorded
//! - `Termination`: Why the loop stopped

mod crawl_state;
mod dedup;

// Re-export main types
pub use crawl_state::{CrawlPhase, CrawlState, Termination};
pub use dedup::Deduplicator;
