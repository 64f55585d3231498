//! Scroll loop state for one crawl
//!
//! The loop moves through `Scrolling -> Extracting -> (Idle | Active)` once per
//! cycle and returns to `Scrolling`, until enough consecutive idle cycles move
//! it to `Terminated`.

use crate::state::dedup::Deduplicator;
use crate::SweepError;
use std::fmt;

/// Phase of the scroll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Cycle States =====
    /// Viewport is being scrolled and the feed given time to load
    Scrolling,

    /// Visible feed items are being read
    Extracting,

    // ===== Cycle Outcomes =====
    /// The last cycle produced no unseen posts
    Idle,

    /// The last cycle produced at least one unseen post
    Active,

    // ===== Terminal State =====
    /// The loop has stopped
    Terminated,
}

impl CrawlPhase {
    /// Returns true if no further cycles will run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Returns true if `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;
        matches!(
            (self, next),
            (Idle | Active, Scrolling)
                | (Scrolling, Extracting)
                | (Extracting, Idle | Active)
                | (Scrolling | Extracting | Idle | Active, Terminated)
        )
    }

    /// Returns the phase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scrolling => "scrolling",
            Self::Extracting => "extracting",
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a crawl stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// `max-idle-scrolls` consecutive cycles produced nothing new
    Exhausted,

    /// The crawl was cancelled from outside
    Cancelled,

    /// The overall crawl deadline elapsed
    DeadlineReached,

    /// Neither the profile nor the feed appeared before the load timeout
    PageLoadTimeout,

    /// The session failed mid-crawl
    Aborted(String),
}

impl Termination {
    /// Returns true if the crawl ran to its designed end
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Returns true if the caller should be told the crawl failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PageLoadTimeout | Self::Aborted(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "feed exhausted"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::DeadlineReached => write!(f, "deadline reached"),
            Self::PageLoadTimeout => write!(f, "page load timed out"),
            Self::Aborted(reason) => write!(f, "aborted: {}", reason),
        }
    }
}

/// Mutable state of one crawl, owned by the scroll loop
///
/// Each cycle takes the state by value and hands back its successor, so a
/// test can drive the loop one snapshot at a time and inspect the result.
#[derive(Debug, Clone)]
pub struct CrawlState {
    phase: CrawlPhase,
    seen: Deduplicator,
    idle_scroll_count: u32,
    total_collected: usize,
    cycles: u32,
    idle_cycles: u32,
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlState {
    /// Creates the state for a fresh crawl
    ///
    /// The loop starts as if a productive cycle had just finished, so the
    /// first transition is into `Scrolling`.
    pub fn new() -> Self {
        Self {
            phase: CrawlPhase::Active,
            seen: Deduplicator::new(),
            idle_scroll_count: 0,
            total_collected: 0,
            cycles: 0,
            idle_cycles: 0,
        }
    }

    fn transition(mut self, next: CrawlPhase) -> Result<Self, SweepError> {
        if !self.phase.can_transition_to(next) {
            return Err(SweepError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(self)
    }

    /// Enters the scroll step of a new cycle
    pub fn begin_scroll(self) -> Result<Self, SweepError> {
        self.transition(CrawlPhase::Scrolling)
    }

    /// Enters the extraction step of the current cycle
    pub fn begin_extract(self) -> Result<Self, SweepError> {
        self.transition(CrawlPhase::Extracting)
    }

    /// Closes the current cycle with the number of unseen posts it produced
    ///
    /// An empty cycle increments the idle counter and a productive one resets
    /// it. Once the counter reaches `max_idle_scrolls` the state terminates.
    pub fn complete_cycle(
        mut self,
        new_posts: usize,
        max_idle_scrolls: u32,
    ) -> Result<Self, SweepError> {
        self.cycles += 1;

        let next = if new_posts == 0 {
            self.idle_scroll_count += 1;
            self.idle_cycles += 1;
            CrawlPhase::Idle
        } else {
            self.idle_scroll_count = 0;
            self.total_collected += new_posts;
            CrawlPhase::Active
        };

        let state = self.transition(next)?;
        if state.idle_scroll_count >= max_idle_scrolls {
            return state.transition(CrawlPhase::Terminated);
        }
        Ok(state)
    }

    /// Counts posts collected before the first scroll
    ///
    /// The idle counter and cycle counts are left alone: the initial view
    /// is not a scroll cycle.
    pub fn record_initial(&mut self, new_posts: usize) {
        self.total_collected += new_posts;
    }

    /// Stops the loop early (cancellation, deadline or session failure)
    pub fn terminate(mut self) -> Self {
        self.phase = CrawlPhase::Terminated;
        self
    }

    /// Current phase
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Returns true once the loop has stopped
    pub fn is_terminated(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Mutable access for the extractor to register new posts
    pub fn seen_mut(&mut self) -> &mut Deduplicator {
        &mut self.seen
    }

    /// Consecutive empty cycles so far
    pub fn idle_scroll_count(&self) -> u32 {
        self.idle_scroll_count
    }

    /// Posts collected across all cycles
    pub fn total_collected(&self) -> usize {
        self.total_collected
    }

    /// Completed scroll cycles
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Empty cycles, consecutive or not
    pub fn idle_cycles(&self) -> u32 {
        self.idle_cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_cycle(state: CrawlState, new_posts: usize, max_idle: u32) -> CrawlState {
        state
            .begin_scroll()
            .unwrap()
            .begin_extract()
            .unwrap()
            .complete_cycle(new_posts, max_idle)
            .unwrap()
    }

    #[test]
    fn test_new_state() {
        let state = CrawlState::new();
        assert_eq!(state.phase(), CrawlPhase::Active);
        assert_eq!(state.idle_scroll_count(), 0);
        assert_eq!(state.total_collected(), 0);
        assert!(!state.is_terminated());
    }

    #[test]
    fn test_productive_cycle_resets_idle() {
        let state = run_cycle(CrawlState::new(), 0, 5);
        assert_eq!(state.idle_scroll_count(), 1);
        assert_eq!(state.phase(), CrawlPhase::Idle);

        let state = run_cycle(state, 2, 5);
        assert_eq!(state.idle_scroll_count(), 0);
        assert_eq!(state.total_collected(), 2);
        assert_eq!(state.phase(), CrawlPhase::Active);
        assert_eq!(state.cycles(), 2);
        assert_eq!(state.idle_cycles(), 1);
    }

    #[test]
    fn test_terminates_after_exactly_k_idle_cycles() {
        for k in 1..=6 {
            let mut state = run_cycle(CrawlState::new(), 3, k);
            let mut idle = 0;
            while !state.is_terminated() {
                state = run_cycle(state, 0, k);
                idle += 1;
            }
            assert_eq!(idle, k, "k = {}", k);
            assert_eq!(state.cycles(), k + 1);
        }
    }

    #[test]
    fn test_record_initial_counts_without_a_cycle() {
        let mut state = CrawlState::new();
        state.seen_mut().record("pinned");
        state.record_initial(1);

        assert_eq!(state.total_collected(), 1);
        assert_eq!(state.cycles(), 0);
        assert_eq!(state.idle_scroll_count(), 0);
        assert_eq!(state.phase(), CrawlPhase::Active);

        let state = run_cycle(state, 2, 3);
        let state = run_cycle(state, 0, 3);
        assert_eq!(state.total_collected(), 3);
        assert_eq!(state.cycles(), 2);
        assert_eq!(state.idle_scroll_count(), 1);
    }

    #[test]
    fn test_invalid_transition() {
        let state = CrawlState::new();
        let result = state.begin_extract();
        assert!(matches!(
            result,
            Err(SweepError::InvalidTransition {
                from: CrawlPhase::Active,
                to: CrawlPhase::Extracting
            })
        ));
    }

    #[test]
    fn test_terminated_is_final() {
        let state = CrawlState::new().terminate();
        assert!(state.is_terminated());
        assert!(state.begin_scroll().is_err());
    }

    #[test]
    fn test_phase_transitions() {
        assert!(CrawlPhase::Active.can_transition_to(CrawlPhase::Scrolling));
        assert!(CrawlPhase::Idle.can_transition_to(CrawlPhase::Scrolling));
        assert!(CrawlPhase::Scrolling.can_transition_to(CrawlPhase::Extracting));
        assert!(CrawlPhase::Extracting.can_transition_to(CrawlPhase::Idle));
        assert!(CrawlPhase::Extracting.can_transition_to(CrawlPhase::Active));
        assert!(CrawlPhase::Idle.can_transition_to(CrawlPhase::Terminated));

        assert!(!CrawlPhase::Scrolling.can_transition_to(CrawlPhase::Idle));
        assert!(!CrawlPhase::Terminated.can_transition_to(CrawlPhase::Scrolling));
        assert!(!CrawlPhase::Extracting.can_transition_to(CrawlPhase::Scrolling));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CrawlPhase::Scrolling), "scrolling");
        assert_eq!(format!("{}", Termination::Exhausted), "feed exhausted");
        assert_eq!(
            format!("{}", Termination::Aborted("gone".to_string())),
            "aborted: gone"
        );
    }

    #[test]
    fn test_termination_classes() {
        assert!(Termination::Exhausted.is_complete());
        assert!(!Termination::Cancelled.is_complete());
        assert!(Termination::PageLoadTimeout.is_failure());
        assert!(Termination::Aborted("x".to_string()).is_failure());
        assert!(!Termination::DeadlineReached.is_failure());
    }
}
