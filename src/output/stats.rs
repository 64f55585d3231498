//! Crawl statistics
//!
//! This module summarizes one finished crawl for the operator: how long the
//! loop ran, what it collected and why it stopped.

use crate::output::document::Document;
use crate::state::{CrawlState, Termination};
use chrono::{DateTime, Utc};

/// Summary of one crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Profile that was crawled
    pub username: String,

    /// When the crawl started
    pub started_at: DateTime<Utc>,

    /// When the scroll loop stopped
    pub finished_at: DateTime<Utc>,

    /// Completed scroll cycles
    pub cycles: u32,

    /// Cycles that yielded nothing new
    pub idle_cycles: u32,

    /// Unique posts collected, including the initial view
    pub posts_collected: usize,

    /// Images referenced by those posts
    pub images_found: usize,

    /// Images saved locally
    pub images_downloaded: usize,

    /// Images with a generated caption
    pub images_captioned: usize,

    /// Why the loop stopped
    pub termination: Termination,
}

impl CrawlReport {
    /// Builds a report from the final loop state and document
    pub fn from_crawl(
        username: &str,
        started_at: DateTime<Utc>,
        state: &CrawlState,
        document: &Document,
        termination: Termination,
    ) -> Self {
        let images = document.posts.iter().flat_map(|post| post.images.iter());
        let (mut downloaded, mut captioned) = (0, 0);
        for image in images {
            if image.local_path.is_some() {
                downloaded += 1;
            }
            if image.caption.is_some() {
                captioned += 1;
            }
        }

        Self {
            username: username.to_string(),
            started_at,
            finished_at: Utc::now(),
            cycles: state.cycles(),
            idle_cycles: state.idle_cycles(),
            posts_collected: state.total_collected(),
            images_found: document.image_count(),
            images_downloaded: downloaded,
            images_captioned: captioned,
            termination,
        }
    }

    /// Wall-clock duration in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Average new posts per productive cycle
    pub fn posts_per_active_cycle(&self) -> f64 {
        let active = self.cycles.saturating_sub(self.idle_cycles);
        if active == 0 {
            return 0.0;
        }
        self.posts_collected as f64 / active as f64
    }
}

/// Prints a report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report: @{} ===\n", report.username);

    println!("Run:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!("  Duration: {}s", report.duration_seconds());
    println!("  Stopped because: {}", report.termination);
    println!();

    println!("Scrolling:");
    println!("  Cycles: {}", report.cycles);
    println!("  Idle cycles: {}", report.idle_cycles);
    println!(
        "  Posts per productive cycle: {:.1}",
        report.posts_per_active_cycle()
    );
    println!();

    println!("Collected:");
    println!("  Posts: {}", report.posts_collected);
    println!("  Images: {}", report.images_found);
    if report.images_found > 0 {
        println!(
            "  Downloaded: {} ({:.1}%)",
            report.images_downloaded,
            report.images_downloaded as f64 / report.images_found as f64 * 100.0
        );
        println!("  Captioned: {}", report.images_captioned);
    }
}
