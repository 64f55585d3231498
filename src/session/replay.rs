//! Offline session backed by saved HTML snapshots
//!
//! A replay session serves one snapshot per scroll position: snapshot 0 is the
//! page as first loaded, and each downward `scroll_by` advances to the next
//! snapshot, staying on the last one once the sequence is exhausted. Handles
//! are bound to the snapshot they were read from, so a handle kept across a
//! scroll reads as detached, the same way a re-rendered feed item does in a
//! live browser.

use crate::session::traits::{DomAccessor, SessionError, SessionResult};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Reference to an element inside one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHandle {
    snapshot: usize,
    ordinal: usize,
}

/// A [`DomAccessor`] over a fixed sequence of HTML documents
#[derive(Debug)]
pub struct ReplaySession {
    snapshots: Vec<String>,
    cursor: AtomicUsize,
    scrolls: AtomicUsize,
    waited_ms: AtomicU64,
    location: Mutex<Option<String>>,
    universe: Selector,
}

impl ReplaySession {
    /// Creates a session from in-memory HTML snapshots
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoPage`] if `snapshots` is empty.
    pub fn new(snapshots: Vec<String>) -> SessionResult<Self> {
        if snapshots.is_empty() {
            return Err(SessionError::NoPage);
        }

        Ok(Self {
            universe: parse_selector("*")?,
            snapshots,
            cursor: AtomicUsize::new(0),
            scrolls: AtomicUsize::new(0),
            waited_ms: AtomicU64::new(0),
            location: Mutex::new(None),
        })
    }

    /// Loads every `.html` file in `dir`, ordered by file name
    pub fn from_dir(dir: &Path) -> SessionResult<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_html = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
            if is_html {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(SessionError::Snapshot(format!(
                "no .html snapshots found in {}",
                dir.display()
            )));
        }

        let snapshots = paths
            .iter()
            .map(std::fs::read_to_string)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} snapshots from {}", snapshots.len(), dir.display());
        Self::new(snapshots)
    }

    /// Number of downward scrolls issued so far
    pub fn scroll_count(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    /// Total milliseconds requested through `wait_ms`
    pub fn waited_ms(&self) -> u64 {
        self.waited_ms.load(Ordering::SeqCst)
    }

    /// Index of the snapshot currently on screen
    pub fn current_snapshot(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// URL passed to the last `navigate_to` call
    pub fn location(&self) -> Option<String> {
        self.location.lock().ok().and_then(|loc| loc.clone())
    }

    /// Maps matched elements back to their document-order position
    fn to_handles<'a>(
        &self,
        snapshot: usize,
        document: &'a Html,
        matches: impl Iterator<Item = ElementRef<'a>>,
    ) -> Vec<SnapshotHandle> {
        let ids: Vec<_> = document.select(&self.universe).map(|e| e.id()).collect();

        matches
            .filter_map(|element| ids.iter().position(|id| *id == element.id()))
            .map(|ordinal| SnapshotHandle { snapshot, ordinal })
            .collect()
    }

    fn current_document(&self) -> (usize, Html) {
        let index = self.current_snapshot();
        (index, Html::parse_document(&self.snapshots[index]))
    }

    /// Resolves a handle against the current snapshot and applies `f` to it
    fn with_element<T>(
        &self,
        handle: &SnapshotHandle,
        f: impl FnOnce(ElementRef<'_>) -> T,
    ) -> SessionResult<T> {
        let (index, document) = self.current_document();
        if handle.snapshot != index {
            return Err(SessionError::Detached);
        }

        let element = document
            .select(&self.universe)
            .nth(handle.ordinal)
            .ok_or(SessionError::Detached)?;

        Ok(f(element))
    }
}

fn parse_selector(selector: &str) -> SessionResult<Selector> {
    Selector::parse(selector).map_err(|e| SessionError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

#[async_trait]
impl DomAccessor for ReplaySession {
    type Handle = SnapshotHandle;

    async fn navigate_to(&self, url: &str) -> SessionResult<()> {
        self.cursor.store(0, Ordering::SeqCst);
        if let Ok(mut location) = self.location.lock() {
            *location = Some(url.to_string());
        }
        Ok(())
    }

    async fn query_selector(&self, selector: &str) -> SessionResult<Option<SnapshotHandle>> {
        let selector = parse_selector(selector)?;
        let (index, document) = self.current_document();
        Ok(self.to_handles(index, &document, document.select(&selector).take(1))
            .into_iter()
            .next())
    }

    async fn query_selector_all(&self, selector: &str) -> SessionResult<Vec<SnapshotHandle>> {
        let selector = parse_selector(selector)?;
        let (index, document) = self.current_document();
        Ok(self.to_handles(index, &document, document.select(&selector)))
    }

    async fn query_within(
        &self,
        scope: &SnapshotHandle,
        selector: &str,
    ) -> SessionResult<Vec<SnapshotHandle>> {
        let selector = parse_selector(selector)?;
        let (index, document) = self.current_document();
        if scope.snapshot != index {
            return Err(SessionError::Detached);
        }

        let root = document
            .select(&self.universe)
            .nth(scope.ordinal)
            .ok_or(SessionError::Detached)?;

        Ok(self.to_handles(index, &document, root.select(&selector)))
    }

    async fn read_text(&self, handle: &SnapshotHandle) -> SessionResult<String> {
        self.with_element(handle, |element| element.text().collect::<String>())
    }

    async fn read_attribute(
        &self,
        handle: &SnapshotHandle,
        name: &str,
    ) -> SessionResult<Option<String>> {
        self.with_element(handle, |element| {
            element.value().attr(name).map(str::to_string)
        })
    }

    async fn scroll_by(&self, _dx: i64, dy: i64) -> SessionResult<()> {
        if dy > 0 {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
            let last = self.snapshots.len() - 1;
            let next = (self.current_snapshot() + 1).min(last);
            self.cursor.store(next, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn wait_ms(&self, duration_ms: u64) -> SessionResult<()> {
        self.waited_ms.fetch_add(duration_ms, Ordering::SeqCst);
        Ok(())
    }
}
