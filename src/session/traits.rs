//! Session capability trait and error types
//!
//! This module defines the narrow surface the crawler needs from a live page:
//! element lookup, text and attribute reads, scrolling and waiting. Anything
//! that can answer these calls can be crawled, whether it is a real browser
//! tab or a directory of saved snapshots.

use async_trait::async_trait;
use thiserror::Error;

/// Interval between selector checks while waiting for a page to render
pub const SELECTOR_POLL_INTERVAL_MS: u64 = 250;

/// Errors raised by a browser session or one of its elements
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to attach to browser at {endpoint}: {message}")]
    Attach { endpoint: String, message: String },

    #[error("No browser page is available")]
    NoPage,

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Element is no longer attached to the document")]
    Detached,

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result of waiting for one of several selectors to appear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The selector at this index matched first
    Found(usize),

    /// None of the selectors matched before the timeout elapsed
    Timeout,
}

/// Read and scroll access to a rendered page
///
/// Every call is a request/response exchange with the page; callers issue
/// them strictly one after another. Handles returned by one call may become
/// invalid after the page re-renders, in which case element reads fail with
/// [`SessionError::Detached`].
#[async_trait]
pub trait DomAccessor: Send + Sync {
    /// Opaque reference to an element on the page
    type Handle: Send + Sync;

    /// Navigates the page to the given URL
    async fn navigate_to(&self, url: &str) -> SessionResult<()>;

    /// Returns the first element matching the selector, if any
    async fn query_selector(&self, selector: &str) -> SessionResult<Option<Self::Handle>>;

    /// Returns all elements matching the selector in document order
    async fn query_selector_all(&self, selector: &str) -> SessionResult<Vec<Self::Handle>>;

    /// Returns all descendants of `scope` matching the selector
    async fn query_within(
        &self,
        scope: &Self::Handle,
        selector: &str,
    ) -> SessionResult<Vec<Self::Handle>>;

    /// Reads the rendered text of an element
    async fn read_text(&self, handle: &Self::Handle) -> SessionResult<String>;

    /// Reads an attribute of an element
    async fn read_attribute(
        &self,
        handle: &Self::Handle,
        name: &str,
    ) -> SessionResult<Option<String>>;

    /// Scrolls the viewport by the given pixel offsets
    async fn scroll_by(&self, dx: i64, dy: i64) -> SessionResult<()>;

    /// Suspends for the given number of milliseconds
    async fn wait_ms(&self, duration_ms: u64) -> SessionResult<()>;

    /// Waits until any of the selectors matches or the timeout elapses
    ///
    /// Checks each selector in order every [`SELECTOR_POLL_INTERVAL_MS`].
    /// Elapsed time is measured in issued waits, so an accessor whose
    /// `wait_ms` returns immediately still observes the full timeout budget.
    /// A selector the page rejects counts as not matching; the others are
    /// still checked.
    async fn wait_for_any_selector(
        &self,
        selectors: &[&str],
        timeout_ms: u64,
    ) -> SessionResult<WaitOutcome> {
        let mut waited = 0;
        loop {
            for (index, selector) in selectors.iter().enumerate() {
                match self.query_selector(selector).await {
                    Ok(Some(_)) => return Ok(WaitOutcome::Found(index)),
                    Ok(None) => {}
                    Err(e @ SessionError::InvalidSelector { .. }) => {
                        tracing::debug!("Ignoring unusable selector: {}", e);
                    }
                    Err(e) => return Err(e),
                }
            }

            if waited >= timeout_ms {
                return Ok(WaitOutcome::Timeout);
            }

            let step = SELECTOR_POLL_INTERVAL_MS.min(timeout_ms - waited);
            self.wait_ms(step).await?;
            waited += step;
        }
    }
}
