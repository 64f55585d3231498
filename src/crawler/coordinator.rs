//! Crawler coordinator - the scroll loop
//!
//! This module contains the loop that drives one crawl, including:
//! - Opening the profile and waiting for it to render
//! - Reading the profile header once
//! - Scrolling, waiting and extracting until the feed runs dry
//! - Stopping early on cancellation, deadline or session failure
//! - Persisting the assembled document

use crate::config::{Config, SessionMode};
use crate::crawler::posts::PostExtractor;
use crate::crawler::profile::ProfileExtractor;
use crate::enrich::ImageEnricher;
use crate::output::{
    assemble_document, CrawlReport, Document, DocumentSink, JsonFileSink, Post, Profile,
};
use crate::session::{DomAccessor, ReplaySession, SessionError, WaitOutcome};
use crate::state::{CrawlState, Termination};
use crate::url::profile_url;
use crate::SweepError;
use chrono::Utc;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutput {
    pub document: Document,
    pub report: CrawlReport,
}

impl CrawlOutput {
    /// Why the crawl stopped
    pub fn termination(&self) -> &Termination {
        &self.report.termination
    }
}

/// How a pause between scroll and extraction ended
enum Pause {
    Elapsed,
    Cancelled,
    DeadlineReached,
    Failed(SessionError),
}

/// Drives the scroll-and-extract loop over one page
pub struct FeedCrawler<D: DomAccessor> {
    dom: D,
    config: Config,
    enricher: Option<ImageEnricher>,
    cancel: CancellationToken,
}

impl<D: DomAccessor> FeedCrawler<D> {
    /// Creates a crawler without image enrichment
    pub fn new(dom: D, config: Config) -> Self {
        Self {
            dom,
            config,
            enricher: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the image enricher; None records images by URL only
    pub fn with_enricher(mut self, enricher: Option<ImageEnricher>) -> Self {
        self.enricher = enricher;
        self
    }

    /// Sets the token that stops the crawl from outside
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The page being crawled
    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Runs the crawl to termination
    ///
    /// Only navigation failures are returned as errors. Every other outcome,
    /// including a page that never renders and a session that fails
    /// mid-crawl, produces a document with whatever was collected and a
    /// [`Termination`] in the report saying why the loop stopped.
    pub async fn run(&self) -> Result<CrawlOutput, SweepError> {
        let started_at = Utc::now();
        let username = self.config.username();
        let url = profile_url(&self.config.target.base_url, &username)?;
        let base_url = Url::parse(&url)?;
        let selectors = &self.config.selectors;
        let crawler = &self.config.crawler;

        tracing::info!("Opening profile: {}", url);
        self.dom.navigate_to(&url).await?;

        let ready = [
            selectors.profile_name.as_str(),
            selectors.post_container.as_str(),
        ];
        let load = self
            .dom
            .wait_for_any_selector(&ready, crawler.page_load_timeout_ms);
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            outcome = load => Some(outcome),
        };

        let early_stop = match outcome {
            None => Some(Termination::Cancelled),
            Some(Ok(WaitOutcome::Found(_))) => None,
            Some(Ok(WaitOutcome::Timeout)) => {
                tracing::error!(
                    "Neither the profile nor the feed appeared within {}ms",
                    crawler.page_load_timeout_ms
                );
                Some(Termination::PageLoadTimeout)
            }
            Some(Err(e)) => {
                tracing::error!("Session failed while waiting for the page: {}", e);
                Some(Termination::Aborted(e.to_string()))
            }
        };

        if let Some(termination) = early_stop {
            let profile = Profile::fallback(&username, &url);
            let state = CrawlState::new().terminate();
            return Ok(self.finish(started_at, state, profile, Vec::new(), termination));
        }

        let profile = ProfileExtractor::new(selectors, crawler.profile_settle_ms)
            .extract(&self.dom, &username, &url)
            .await;
        tracing::info!("Profile info scraped, starting post extraction");

        let extractor = PostExtractor::new(selectors, &base_url, self.enricher.as_ref());
        let deadline = crawler
            .max_crawl_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        let mut state = CrawlState::new();

        // Items rendered with the profile are collected before the first scroll
        let mut posts = extractor.extract(&self.dom, state.seen_mut(), 0).await;
        state.record_initial(posts.len());
        tracing::info!("Initial view: {} posts", posts.len());

        let termination = loop {
            if self.cancel.is_cancelled() {
                break Termination::Cancelled;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break Termination::DeadlineReached;
            }

            state = state.begin_scroll()?;
            if let Err(e) = self.dom.scroll_by(0, crawler.scroll_increment).await {
                tracing::error!("Scroll failed: {}", e);
                break Termination::Aborted(e.to_string());
            }

            match self.pause(crawler.scroll_delay_ms, deadline).await {
                Pause::Elapsed => {}
                Pause::Cancelled => break Termination::Cancelled,
                Pause::DeadlineReached => break Termination::DeadlineReached,
                Pause::Failed(e) => {
                    tracing::error!("Wait failed: {}", e);
                    break Termination::Aborted(e.to_string());
                }
            }

            state = state.begin_extract()?;
            let new_posts = extractor
                .extract(&self.dom, state.seen_mut(), posts.len())
                .await;
            let new_count = new_posts.len();
            posts.extend(new_posts);

            state = state.complete_cycle(new_count, crawler.max_idle_scrolls)?;
            tracing::info!(
                "Scroll #{}: {} new posts ({} total, {} idle, {})",
                state.cycles(),
                new_count,
                state.total_collected(),
                state.idle_scroll_count(),
                state.phase()
            );

            if state.is_terminated() {
                break Termination::Exhausted;
            }
        };

        tracing::info!(
            "Finished scrolling ({}). Total posts collected: {}",
            termination,
            posts.len()
        );

        Ok(self.finish(started_at, state.terminate(), profile, posts, termination))
    }

    /// Waits out the scroll delay unless cancelled or out of time
    async fn pause(&self, duration_ms: u64, deadline: Option<Instant>) -> Pause {
        let expired = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Pause::Cancelled,
            _ = expired => Pause::DeadlineReached,
            result = self.dom.wait_ms(duration_ms) => match result {
                Ok(()) => Pause::Elapsed,
                Err(e) => Pause::Failed(e),
            },
        }
    }

    fn finish(
        &self,
        started_at: chrono::DateTime<Utc>,
        state: CrawlState,
        profile: Profile,
        posts: Vec<Post>,
        termination: Termination,
    ) -> CrawlOutput {
        let document = assemble_document(profile, posts);
        let report = CrawlReport::from_crawl(
            &self.config.username(),
            started_at,
            &state,
            &document,
            termination,
        );
        CrawlOutput { document, report }
    }
}

/// Crawls `dom`, writes the document and maps failed terminations to errors
///
/// The document is persisted before any failure is reported, so a crawl
/// that timed out or aborted still leaves its partial result on disk.
pub async fn crawl_and_persist<D: DomAccessor>(
    dom: D,
    config: Config,
    enricher: Option<ImageEnricher>,
    cancel: CancellationToken,
    sink: &dyn DocumentSink,
) -> Result<CrawlReport, SweepError> {
    let url = profile_url(&config.target.base_url, &config.username())?;

    let output = FeedCrawler::new(dom, config)
        .with_enricher(enricher)
        .with_cancellation(cancel)
        .run()
        .await?;

    sink.persist(&output.document)?;
    tracing::info!(
        "Saved {} posts to {}",
        output.document.posts.len(),
        sink.describe()
    );

    if !output.termination().is_failure() {
        return Ok(output.report);
    }

    Err(match output.report.termination {
        Termination::Aborted(reason) => SweepError::Aborted(reason),
        _ => SweepError::PageLoadTimeout { url },
    })
}

/// Runs a complete crawl as configured
///
/// This is the main entry point. It will:
/// 1. Build the image enricher, if enrichment is configured
/// 2. Obtain a page from the configured session provider
/// 3. Run the scroll loop
/// 4. Write the document to the configured path
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `cancel` - Token that stops the crawl early, keeping collected posts
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ended normally, was cancelled or hit its deadline
/// * `Err(SweepError)` - The session failed or the page never loaded
pub async fn run_crawl(config: Config, cancel: CancellationToken) -> Result<CrawlReport, SweepError> {
    let enricher = match &config.enrichment {
        Some(enrichment) => Some(ImageEnricher::from_config(enrichment, &config.username())?),
        None => None,
    };
    let sink = JsonFileSink::new(config.document_path(), config.output.source_key.clone());

    match config.session.mode {
        SessionMode::Replay => {
            let dir = config.session.replay_dir.clone().ok_or_else(|| {
                crate::ConfigError::Validation("replay mode requires session.replay-dir".to_string())
            })?;
            let session = ReplaySession::from_dir(Path::new(&dir))?;
            tracing::info!("Replaying snapshots from {}", dir);
            crawl_and_persist(session, config, enricher, cancel, &sink).await
        }
        SessionMode::Launch | SessionMode::Attach => {
            crawl_in_browser(config, enricher, cancel, &sink).await
        }
    }
}

#[cfg(feature = "chromium")]
async fn crawl_in_browser(
    config: Config,
    enricher: Option<ImageEnricher>,
    cancel: CancellationToken,
    sink: &dyn DocumentSink,
) -> Result<CrawlReport, SweepError> {
    use crate::session::ChromiumSession;

    let session = match (&config.session.mode, &config.session.endpoint) {
        (SessionMode::Attach, Some(endpoint)) => ChromiumSession::attach(endpoint).await?,
        (SessionMode::Attach, None) => {
            return Err(crate::ConfigError::Validation(
                "attach mode requires session.endpoint".to_string(),
            )
            .into())
        }
        _ => ChromiumSession::launch(config.session.headless).await?,
    };

    let page = match session.open_page().await {
        Ok(page) => page,
        Err(e) => {
            session.close().await;
            return Err(e.into());
        }
    };

    let result = crawl_and_persist(page, config, enricher, cancel, sink).await;
    session.close().await;
    result
}

#[cfg(not(feature = "chromium"))]
async fn crawl_in_browser(
    _config: Config,
    _enricher: Option<ImageEnricher>,
    _cancel: CancellationToken,
    _sink: &dyn DocumentSink,
) -> Result<CrawlReport, SweepError> {
    Err(SessionError::Launch("built without the `chromium` feature".to_string()).into())
}
