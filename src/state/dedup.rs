//! Post deduplication by normalized text

use std::collections::HashSet;

/// Tracks which post bodies have already been recorded during one crawl
///
/// Texts are normalized by trimming surrounding whitespace. The empty string
/// is never stored and always reads as seen, so blank feed items are skipped
/// without special-casing at the call site.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    /// Creates an empty deduplicator
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `text` was already recorded, or is empty after trimming
    pub fn seen(&self, text: &str) -> bool {
        let normalized = text.trim();
        normalized.is_empty() || self.seen.contains(normalized)
    }

    /// Records `text`; empty text is ignored
    pub fn record(&mut self, text: &str) {
        let normalized = text.trim();
        if !normalized.is_empty() {
            self.seen.insert(normalized.to_string());
        }
    }

    /// Checks and records `text` in one step
    ///
    /// Returns true only when the normalized text was non-empty and new.
    pub fn insert(&mut self, text: &str) -> bool {
        if self.seen(text) {
            return false;
        }
        self.record(text);
        true
    }

    /// Number of distinct texts recorded
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
