//! # Payment Method
//!
//! Settlement-rail classification.
//!
//! A [`PaymentMethod`] identifies the rail over which a collection is
//! settled. It is immutable reference data: requisites declare which method
//! they serve, and aggregators map each method to a provider-side reference.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Settlement rail for a payment collection.
///
/// # Examples
///
/// ```
/// use pay_dispatch::domain::value_objects::method::PaymentMethod;
///
/// let method: PaymentMethod = "INSTANT_TRANSFER".parse().unwrap();
/// assert_eq!(method, PaymentMethod::InstantTransfer);
/// assert_eq!(method.to_string(), "INSTANT_TRANSFER");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum PaymentMethod {
    /// Instant bank transfer by phone number or account alias.
    InstantTransfer = 0,
    /// Card-to-card transfer.
    CardToCard = 1,
    /// Classic account-to-account transfer by full requisites.
    AccountTransfer = 2,
}

impl PaymentMethod {
    /// Returns the short wire code for this method.
    #[inline]
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InstantTransfer => "instant",
            Self::CardToCard => "c2c",
            Self::AccountTransfer => "account",
        }
    }

    /// Returns all known methods, in declaration order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::InstantTransfer, Self::CardToCard, Self::AccountTransfer]
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstantTransfer => write!(f, "INSTANT_TRANSFER"),
            Self::CardToCard => write!(f, "CARD_TO_CARD"),
            Self::AccountTransfer => write!(f, "ACCOUNT_TRANSFER"),
        }
    }
}

/// Error type for parsing a [`PaymentMethod`] from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePaymentMethodError(pub String);

impl fmt::Display for ParsePaymentMethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid payment method: '{}'", self.0)
    }
}

impl std::error::Error for ParsePaymentMethodError {}

impl FromStr for PaymentMethod {
    type Err = ParsePaymentMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "INSTANT_TRANSFER" | "INSTANT" => Ok(Self::InstantTransfer),
            "CARD_TO_CARD" | "C2C" => Ok(Self::CardToCard),
            "ACCOUNT_TRANSFER" | "ACCOUNT" => Ok(Self::AccountTransfer),
            _ => Err(ParsePaymentMethodError(s.to_string())),
        }
    }
}
