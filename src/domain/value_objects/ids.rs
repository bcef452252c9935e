//! # Identifier Types
//!
//! Newtype identifiers for domain entities.
//!
//! Entities created inside this core (transactions, dispatch requests,
//! reservations, disputes) use UUID-based identifiers. Entities configured
//! by external collaborators (requisites, aggregators, merchants, agents)
//! use opaque string identifiers supplied at onboarding time.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// UUID-based identifier for a [`Transaction`](crate::domain::entities::transaction::Transaction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

/// UUID-based identifier for a logical dispatch request.
///
/// A single request may own several transactions (assignment attempts)
/// when SLA escalation re-dispatches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

/// UUID-based identifier for a limit reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(Uuid);

/// UUID-based identifier for a [`DealDispute`](crate::domain::entities::dispute::DealDispute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisputeId(Uuid);

macro_rules! uuid_id_impl {
    ($name:ident) => {
        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[inline]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses an identifier from its string form.
            #[must_use]
            pub fn parse(s: &str) -> Option<Self> {
                Uuid::parse_str(s).ok().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id_impl!(TransactionId);
uuid_id_impl!(RequestId);
uuid_id_impl!(ReservationId);
uuid_id_impl!(DisputeId);

/// String identifier for a trader requisite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequisiteId(String);

/// String identifier for an aggregator integration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregatorId(String);

/// String identifier for a merchant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantId(String);

/// String identifier for a trader agent (requisite owner).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

/// Opaque reference under which a transaction is known to the outside.
///
/// Callbacks address transactions by this reference, never by the internal
/// [`TransactionId`]. One reference is minted per assignment attempt so an
/// escalated attempt can never be confused with its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalRef(String);

macro_rules! string_id_impl {
    ($name:ident) => {
        impl $name {
            /// Creates an identifier from the given string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id_impl!(RequisiteId);
string_id_impl!(AggregatorId);
string_id_impl!(MerchantId);
string_id_impl!(AgentId);
string_id_impl!(ExternalRef);

impl ExternalRef {
    /// Mints a fresh reference for a new assignment attempt.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}
