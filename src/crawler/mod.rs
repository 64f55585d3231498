//! Crawler module for infinite-scroll feeds
//!
//! This module contains the core crawling logic, including:
//! - Reading the profile header
//! - Extracting unseen posts from the rendered feed
//! - The scroll loop and its termination rules
//! - Overall crawl coordination and persistence

mod coordinator;
mod posts;
mod profile;
mod read;

pub use coordinator::{crawl_and_persist, run_crawl, CrawlOutput, FeedCrawler};
pub use posts::PostExtractor;
pub use profile::ProfileExtractor;
pub use read::{first_text, or_default, text_or_default};
