/// Crawl phase definitions
///
/// A run moves through `Idle -> (Listing -> (Detail -> Persist -> Pace)* -> KeyPace)* -> Done`.
/// The key loop and each entry pipeline track their own phase with a [`PhaseTracker`].
use crate::ReelError;
use std::fmt;

/// Represents where a crawl currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Nothing has started yet
    Idle,

    /// Fetching the listing page for one traversal key
    Listing,

    /// Fetching an entry's detail page
    Detail,

    /// Writing an entry's records and capture
    Persist,

    /// Waiting between entries
    Pace,

    /// Waiting between traversal keys
    KeyPace,

    /// The run is over, completed or interrupted
    Done,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if `next` may follow this phase
    ///
    /// Every phase except `Done` may move to `Done`, which is how an interrupted run ends.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        if next == Done {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Idle, Listing)
                | (Listing, Detail)
                | (Listing, KeyPace)
                | (Detail, Persist)
                | (Detail, Pace)
                | (Detail, KeyPace)
                | (Persist, Pace)
                | (Pace, Detail)
                | (Pace, KeyPace)
                | (KeyPace, Listing)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listing => "listing",
            Self::Detail => "detail",
            Self::Persist => "persist",
            Self::Pace => "pace",
            Self::KeyPace => "key_pace",
            Self::Done => "done",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Listing,
            Self::Detail,
            Self::Persist,
            Self::Pace,
            Self::KeyPace,
            Self::Done,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Holds the current phase and rejects illegal moves
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: CrawlPhase,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::starting_at(CrawlPhase::Idle)
    }

    pub fn starting_at(phase: CrawlPhase) -> Self {
        Self { current: phase }
    }

    pub fn current(&self) -> CrawlPhase {
        self.current
    }

    /// Moves to `next`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The transition was legal and has been applied
    /// * `Err(ReelError::InvalidTransition)` - The phase is unchanged
    pub fn advance(&mut self, next: CrawlPhase) -> Result<(), ReelError> {
        if !self.current.can_transition_to(next) {
            return Err(ReelError::InvalidTransition {
                from: self.current,
                to: next,
            });
        }

        tracing::trace!("phase {} -> {}", self.current, next);
        self.current = next;
        Ok(())
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_run_path() {
        let mut tracker = PhaseTracker::new();
        let path = [
            CrawlPhase::Listing,
            CrawlPhase::Detail,
            CrawlPhase::Persist,
            CrawlPhase::Pace,
            CrawlPhase::Detail,
            CrawlPhase::Pace,
            CrawlPhase::KeyPace,
            CrawlPhase::Listing,
            CrawlPhase::KeyPace,
            CrawlPhase::Done,
        ];

        for phase in path {
            tracker.advance(phase).unwrap();
        }
        assert_eq!(tracker.current(), CrawlPhase::Done);
    }

    #[test]
    fn test_zero_records_skips_persist() {
        assert!(CrawlPhase::Detail.can_transition_to(CrawlPhase::Pace));
        assert!(!CrawlPhase::Listing.can_transition_to(CrawlPhase::Persist));
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut tracker = PhaseTracker::new();
        let result = tracker.advance(CrawlPhase::Persist);

        assert!(matches!(
            result,
            Err(ReelError::InvalidTransition {
                from: CrawlPhase::Idle,
                to: CrawlPhase::Persist
            })
        ));
        assert_eq!(tracker.current(), CrawlPhase::Idle);
    }

    #[test]
    fn test_done_reachable_from_every_active_phase() {
        for phase in CrawlPhase::all_phases() {
            assert_eq!(
                phase.can_transition_to(CrawlPhase::Done),
                !phase.is_terminal(),
                "unexpected Done transition from {}",
                phase
            );
        }
    }

    #[test]
    fn test_done_is_terminal() {
        for phase in CrawlPhase::all_phases() {
            assert!(!CrawlPhase::Done.can_transition_to(phase));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CrawlPhase::KeyPace), "key_pace");
        assert_eq!(format!("{}", CrawlPhase::Idle), "idle");
    }
}
