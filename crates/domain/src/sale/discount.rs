//! Quantity-tiered discount policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of identical items that can be sold in one line.
pub const MAX_IDENTICAL_ITEMS: u32 = 20;

/// Smallest quantity that earns any discount.
pub const MIN_DISCOUNT_QUANTITY: u32 = 4;

/// Smallest quantity that earns the bulk discount.
pub const BULK_DISCOUNT_QUANTITY: u32 = 10;

/// Error raised when a line exceeds the identical-item limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot sell more than 20 identical items (requested {quantity})")]
pub struct QuantityLimitExceeded {
    pub quantity: u32,
}

/// Error raised when an amount does not fit in a `Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Amount is out of range")]
pub struct AmountOverflow;

/// Errors from pricing a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error(transparent)]
    QuantityLimitExceeded(#[from] QuantityLimitExceeded),

    #[error(transparent)]
    AmountOverflow(#[from] AmountOverflow),
}

/// Discount tier a line item falls into.
///
/// ```text
///   1 ..=  3  None      0%
///   4 ..=  9  Standard 10%
///  10 ..= 20  Bulk     20%
///  21 ..      rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscountTier {
    None,
    Standard,
    Bulk,
}

impl DiscountTier {
    /// Returns the tier for a quantity, or an error above the item limit.
    pub fn for_quantity(quantity: u32) -> Result<Self, QuantityLimitExceeded> {
        match quantity {
            q if q > MAX_IDENTICAL_ITEMS => Err(QuantityLimitExceeded { quantity }),
            q if q >= BULK_DISCOUNT_QUANTITY => Ok(DiscountTier::Bulk),
            q if q >= MIN_DISCOUNT_QUANTITY => Ok(DiscountTier::Standard),
            _ => Ok(DiscountTier::None),
        }
    }

    /// Returns the discount rate as a fraction in [0, 1].
    pub fn rate(&self) -> Decimal {
        match self {
            DiscountTier::None => Decimal::ZERO,
            DiscountTier::Standard => Decimal::new(10, 2),
            DiscountTier::Bulk => Decimal::new(20, 2),
        }
    }
}

/// Returns the discount rate for a quantity.
pub fn discount_rate(quantity: u32) -> Result<Decimal, QuantityLimitExceeded> {
    DiscountTier::for_quantity(quantity).map(|tier| tier.rate())
}

/// Computes `quantity × unit_price × (1 − discount)` without rounding.
///
/// Trailing zeros introduced by the multiplication are stripped. Fails
/// instead of panicking when the result does not fit in a `Decimal`.
pub fn line_total(
    quantity: u32,
    unit_price: Decimal,
    discount: Decimal,
) -> Result<Decimal, AmountOverflow> {
    Decimal::ONE
        .checked_sub(discount)
        .and_then(|factor| Decimal::from(quantity).checked_mul(unit_price)?.checked_mul(factor))
        .map(|total| total.normalize())
        .ok_or(AmountOverflow)
}
