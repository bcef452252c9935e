//! # Transaction Status
//!
//! Transaction lifecycle state machine.
//!
//! # State Machine
//!
//! ```text
//! Created → Pending ───────────→ Ready / Failed
//!     └───→ PendingAggregator ─→ Ready / Failed / Expired
//! ```
//!
//! `Ready` and `Failed` are terminal for the assignment attempt. `Expired`
//! is also terminal for the attempt, but not for the logical request: the
//! dispatcher reacts to it by creating a fresh attempt against the next
//! candidate.
//!
//! # Examples
//!
//! ```
//! use pay_dispatch::domain::value_objects::transaction_status::TransactionStatus;
//!
//! let status = TransactionStatus::PendingAggregator;
//! assert!(status.can_transition_to(TransactionStatus::Expired));
//! assert!(!TransactionStatus::Ready.can_transition_to(TransactionStatus::Pending));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single assignment attempt.
///
/// Transitions are enforced through
/// [`can_transition_to`](TransactionStatus::can_transition_to).
///
/// # Terminal States
///
/// - [`Ready`](TransactionStatus::Ready) — settled by the provider
/// - [`Failed`](TransactionStatus::Failed) — declined or given up
/// - [`Expired`](TransactionStatus::Expired) — SLA breach on an aggregator attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TransactionStatus {
    /// Created, no provider assigned yet.
    #[default]
    Created = 0,

    /// Assigned to a trader requisite, awaiting confirmation.
    Pending = 1,

    /// Assigned to an aggregator, awaiting its webhook inside the SLA budget.
    PendingAggregator = 2,

    /// Settled successfully (terminal).
    Ready = 3,

    /// Declined or abandoned (terminal).
    Failed = 4,

    /// SLA deadline elapsed before the aggregator answered (terminal per attempt).
    Expired = 5,
}

impl TransactionStatus {
    /// Returns true if this is a terminal state for the attempt.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed | Self::Expired)
    }

    /// Returns true if a provider is assigned and the attempt is awaiting
    /// an outcome.
    #[inline]
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::Pending | Self::PendingAggregator)
    }

    /// Returns true if a dispute may be opened against this state.
    ///
    /// Only settled transactions are dispute-eligible.
    #[inline]
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if this state can transition to the target state.
    ///
    /// # Examples
    ///
    /// ```
    /// use pay_dispatch::domain::value_objects::transaction_status::TransactionStatus;
    ///
    /// assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Ready));
    /// assert!(!TransactionStatus::Pending.can_transition_to(TransactionStatus::Expired));
    /// assert!(!TransactionStatus::Expired.can_transition_to(TransactionStatus::Ready));
    /// ```
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            // From Created
            (Self::Created, Self::Pending)
                | (Self::Created, Self::PendingAggregator)
                // From Pending (requisite attempt)
                | (Self::Pending, Self::Ready)
                | (Self::Pending, Self::Failed)
                // From PendingAggregator
                | (Self::PendingAggregator, Self::Ready)
                | (Self::PendingAggregator, Self::Failed)
                | (Self::PendingAggregator, Self::Expired)
        )
    }

    /// Returns the valid next states from this state.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Created => vec![Self::Pending, Self::PendingAggregator],
            Self::Pending => vec![Self::Ready, Self::Failed],
            Self::PendingAggregator => vec![Self::Ready, Self::Failed, Self::Expired],
            Self::Ready | Self::Failed | Self::Expired => vec![],
        }
    }

    /// Returns the numeric value of this state.
    #[inline]
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Pending => "PENDING",
            Self::PendingAggregator => "PENDING_AGGREGATOR",
            Self::Ready => "READY",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        };
        write!(f, "{s}")
    }
}

/// Error returned when converting an invalid u8 to [`TransactionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransactionStatusError(
    /// The invalid u8 value.
    pub u8,
);

impl fmt::Display for InvalidTransactionStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transaction status value: {}", self.0)
    }
}

impl std::error::Error for InvalidTransactionStatusError {}

impl TryFrom<u8> for TransactionStatus {
    type Error = InvalidTransactionStatusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Created),
            1 => Ok(Self::Pending),
            2 => Ok(Self::PendingAggregator),
            3 => Ok(Self::Ready),
            4 => Ok(Self::Failed),
            5 => Ok(Self::Expired),
            _ => Err(InvalidTransactionStatusError(value)),
        }
    }
}
