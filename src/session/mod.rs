//! Session module: access to the page being crawled
//!
//! The crawler only ever talks to a page through [`DomAccessor`]. Two
//! providers ship with the crate:
//!
//! - `chromium`: a live Chrome/Chromium tab, either launched fresh or attached
//!   to an already-authenticated browser (requires the `chromium` feature)
//! - `replay`: a directory of saved HTML snapshots, one per scroll position

#[cfg(feature = "chromium")]
pub mod chromium;
pub mod replay;
mod traits;

pub use replay::{ReplaySession, SnapshotHandle};
pub use traits::{DomAccessor, SessionError, SessionResult, WaitOutcome, SELECTOR_POLL_INTERVAL_MS};

#[cfg(feature = "chromium")]
pub use chromium::{ChromiumPage, ChromiumSession};
