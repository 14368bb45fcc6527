//! URL lifecycle states inside the crawl pipeline
//!
//! A URL moves `Raw -> Filtering -> {Rejected | Filtered} -> Fetching ->
//! {FetchFailed | Fetched} -> Extracting -> Done`. Nothing is persisted, so a
//! state only lives as long as the URL is in flight.
use std::fmt;

/// Represents the current state of a URL in the crawl pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    // ===== Ingestion =====
    /// Submitted but not yet examined
    Raw,

    /// Being evaluated by the filter chain
    Filtering,

    /// Passed every filter and waiting for dispatch
    Filtered,

    // ===== Dispatch =====
    /// Being fetched
    Fetching,

    /// Body received
    Fetched,

    /// Links are being extracted and resubmitted
    Extracting,

    // ===== Terminal States =====
    /// Dropped by a filter
    Rejected,

    /// The fetch or body read failed
    FetchFailed,

    /// All extracted links were resubmitted
    Done,
}

impl UrlState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::FetchFailed | Self::Done)
    }

    /// Returns true if moving from `self` to `next` follows the pipeline
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Raw, Self::Filtering)
                | (Self::Filtering, Self::Rejected)
                | (Self::Filtering, Self::Filtered)
                | (Self::Filtered, Self::Fetching)
                | (Self::Fetching, Self::FetchFailed)
                | (Self::Fetching, Self::Fetched)
                | (Self::Fetched, Self::Extracting)
                | (Self::Extracting, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Filtering => "filtering",
            Self::Filtered => "filtered",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Extracting => "extracting",
            Self::Rejected => "rejected",
            Self::FetchFailed => "fetch_failed",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [UrlState; 9] = [
        UrlState::Raw,
        UrlState::Filtering,
        UrlState::Filtered,
        UrlState::Fetching,
        UrlState::Fetched,
        UrlState::Extracting,
        UrlState::Rejected,
        UrlState::FetchFailed,
        UrlState::Done,
    ];

    #[test]
    fn test_is_terminal() {
        assert!(UrlState::Rejected.is_terminal());
        assert!(UrlState::FetchFailed.is_terminal());
        assert!(UrlState::Done.is_terminal());

        assert!(!UrlState::Raw.is_terminal());
        assert!(!UrlState::Filtered.is_terminal());
        assert!(!UrlState::Fetching.is_terminal());
        assert!(!UrlState::Extracting.is_terminal());
    }

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            UrlState::Raw,
            UrlState::Filtering,
            UrlState::Filtered,
            UrlState::Fetching,
            UrlState::Fetched,
            UrlState::Extracting,
            UrlState::Done,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_invalid_transitions() {
        // Skipping the filter chain is never allowed
        assert!(!UrlState::Raw.can_transition_to(UrlState::Fetching));
        assert!(!UrlState::Rejected.can_transition_to(UrlState::Filtered));
        assert!(!UrlState::FetchFailed.can_transition_to(UrlState::Fetching));
        assert!(!UrlState::Done.can_transition_to(UrlState::Raw));
    }

    #[test]
    fn test_terminal_states_have_no_successor() {
        for from in ALL_STATES.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL_STATES {
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", UrlState::Raw), "raw");
        assert_eq!(format!("{}", UrlState::FetchFailed), "fetch_failed");
        assert_eq!(format!("{}", UrlState::Done), "done");
    }
}
