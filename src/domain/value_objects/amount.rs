//! # Amount Value Object
//!
//! Positive decimal money amount with checked arithmetic.
//!
//! Amounts are validated at construction: zero and negative values are
//! rejected, so any `Amount` in the system is known to be strictly positive.
//!
//! # Examples
//!
//! ```
//! use pay_dispatch::domain::value_objects::amount::Amount;
//! use rust_decimal::Decimal;
//!
//! let amount = Amount::new(Decimal::from(1000)).unwrap();
//! assert_eq!(amount.get(), Decimal::from(1000));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when constructing an invalid [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount: {0} (must be strictly positive)")]
pub struct InvalidAmountError(pub Decimal);

/// A strictly positive decimal money amount.
///
/// # Invariants
///
/// - Always greater than zero
///
/// # Examples
///
/// ```
/// use pay_dispatch::domain::value_objects::amount::Amount;
/// use rust_decimal::Decimal;
///
/// assert!(Amount::new(Decimal::from(100)).is_ok());
/// assert!(Amount::new(Decimal::ZERO).is_err());
/// assert!(Amount::new(Decimal::from(-5)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Creates an amount, rejecting zero and negative values.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidAmountError`] if `value <= 0`.
    pub fn new(value: Decimal) -> Result<Self, InvalidAmountError> {
        if value <= Decimal::ZERO {
            return Err(InvalidAmountError(value));
        }
        Ok(Self(value))
    }

    /// Returns the inner decimal value.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Decimal {
        self.0
    }

    /// Checked addition of two amounts.
    ///
    /// Returns `None` on decimal overflow.
    #[must_use]
    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Returns the absolute difference between two amounts.
    ///
    /// Used to record callback/request amount discrepancies.
    #[must_use]
    pub fn abs_diff(&self, other: Amount) -> Decimal {
        (self.0 - other.0).abs()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
