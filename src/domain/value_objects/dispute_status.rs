//! # Dispute Status
//!
//! Dispute lifecycle state machine.
//!
//! # State Machine
//!
//! ```text
//! Open → Resolved / Rejected
//! ```
//!
//! Resolution transitions are performed by an external workflow; this core
//! only creates disputes in the `Open` state and validates transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a [`DealDispute`](crate::domain::entities::dispute::DealDispute).
///
/// # Examples
///
/// ```
/// use pay_dispatch::domain::value_objects::dispute_status::DisputeStatus;
///
/// assert!(DisputeStatus::Open.can_transition_to(DisputeStatus::Resolved));
/// assert!(DisputeStatus::Resolved.is_terminal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum DisputeStatus {
    /// Dispute raised, awaiting resolution.
    #[default]
    Open = 0,

    /// Resolved in the merchant's favor (terminal).
    Resolved = 1,

    /// Rejected after review (terminal).
    Rejected = 2,
}

impl DisputeStatus {
    /// Returns true if this is a terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }

    /// Returns true if this state can transition to the target state.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Resolved) | (Self::Open, Self::Rejected)
        )
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "OPEN",
            Self::Resolved => "RESOLVED",
            Self::Rejected => "REJECTED",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn open_is_not_terminal() {
        assert!(!DisputeStatus::Open.is_terminal());
    }

    #[test]
    fn resolved_and_rejected_are_terminal() {
        assert!(DisputeStatus::Resolved.is_terminal());
        assert!(DisputeStatus::Rejected.is_terminal());
    }

    #[test]
    fn open_transitions_to_both_outcomes() {
        assert!(DisputeStatus::Open.can_transition_to(DisputeStatus::Resolved));
        assert!(DisputeStatus::Open.can_transition_to(DisputeStatus::Rejected));
    }

    #[test]
    fn terminal_states_are_final() {
        for state in [DisputeStatus::Resolved, DisputeStatus::Rejected] {
            for target in [
                DisputeStatus::Open,
                DisputeStatus::Resolved,
                DisputeStatus::Rejected,
            ] {
                assert!(!state.can_transition_to(target));
            }
        }
    }

    #[test]
    fn display_formats() {
        assert_eq!(DisputeStatus::Open.to_string(), "OPEN");
        assert_eq!(DisputeStatus::Resolved.to_string(), "RESOLVED");
        assert_eq!(DisputeStatus::Rejected.to_string(), "REJECTED");
    }

    #[test]
    fn serde_roundtrip() {
        let json = serde_json::to_string(&DisputeStatus::Open).unwrap();
        assert_eq!(json, "\"OPEN\"");
        let back: DisputeStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DisputeStatus::Open);
    }

    #[test]
    fn default_is_open() {
        assert_eq!(DisputeStatus::default(), DisputeStatus::Open);
    }
}
