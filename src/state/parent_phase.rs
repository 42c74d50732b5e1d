/// Lifecycle of a parent record inside the aggregator
///
/// This module defines the states an event moves through between being opened
/// with its child count and being handed to the emission sink.
use std::fmt;

/// Represents where a parent record is in its fan-out/fan-in lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentPhase {
    /// Child fetches are outstanding
    Dispatched {
        /// Number of child outcomes still expected
        pending: usize,
    },

    /// All children resolved; the record is being stripped and handed off
    Finalizing,

    /// The record was emitted; nothing may change it any more
    Finalized,
}

impl ParentPhase {
    /// Phase a parent enters when opened with `pending` children
    ///
    /// A parent without children skips straight to finalizing.
    pub fn opened(pending: usize) -> Self {
        if pending == 0 {
            Self::Finalizing
        } else {
            Self::Dispatched { pending }
        }
    }

    /// Phase after one more child outcome arrived
    ///
    /// Returns `None` when no child outcome is expected in this phase.
    pub fn after_outcome(self) -> Option<Self> {
        match self {
            Self::Dispatched { pending } if pending <= 1 => Some(Self::Finalizing),
            Self::Dispatched { pending } => Some(Self::Dispatched {
                pending: pending - 1,
            }),
            Self::Finalizing | Self::Finalized => None,
        }
    }

    /// Phase after `additional` children were dispatched on top
    ///
    /// Returns `None` once the parent stopped waiting for outcomes.
    pub fn extended(self, additional: usize) -> Option<Self> {
        match self {
            Self::Dispatched { pending } => Some(Self::Dispatched {
                pending: pending + additional,
            }),
            Self::Finalizing | Self::Finalized => None,
        }
    }

    /// Number of outstanding children
    pub fn pending(&self) -> usize {
        match self {
            Self::Dispatched { pending } => *pending,
            Self::Finalizing | Self::Finalized => 0,
        }
    }

    /// Returns true once the record was emitted
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Returns true while the record still accepts child outcomes
    pub fn accepts_outcomes(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }

    /// Short lowercase label for logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dispatched { .. } => "dispatched",
            Self::Finalizing => "finalizing",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for ParentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatched { pending } => write!(f, "dispatched ({} pending)", pending),
            other => write!(f, "{}", other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opened_without_children_finalizes() {
        assert_eq!(ParentPhase::opened(0), ParentPhase::Finalizing);
        assert_eq!(
            ParentPhase::opened(3),
            ParentPhase::Dispatched { pending: 3 }
        );
    }

    #[test]
    fn test_countdown_to_finalizing() {
        let mut phase = ParentPhase::opened(3);
        phase = phase.after_outcome().unwrap();
        assert_eq!(phase.pending(), 2);
        phase = phase.after_outcome().unwrap();
        assert_eq!(phase.pending(), 1);
        phase = phase.after_outcome().unwrap();
        assert_eq!(phase, ParentPhase::Finalizing);
        assert_eq!(phase.after_outcome(), None);
    }

    #[test]
    fn test_extended() {
        let phase = ParentPhase::opened(1).extended(2).unwrap();
        assert_eq!(phase.pending(), 3);
        assert_eq!(ParentPhase::Finalizing.extended(1), None);
        assert_eq!(ParentPhase::Finalized.extended(1), None);
    }

    #[test]
    fn test_terminal_rejects_outcomes() {
        assert!(ParentPhase::Finalized.is_terminal());
        assert!(!ParentPhase::Finalized.accepts_outcomes());
        assert_eq!(ParentPhase::Finalized.after_outcome(), None);
        assert!(ParentPhase::Dispatched { pending: 1 }.accepts_outcomes());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ParentPhase::Dispatched { pending: 2 }.to_string(),
            "dispatched (2 pending)"
        );
        assert_eq!(ParentPhase::Finalized.to_string(), "finalized");
    }
}
