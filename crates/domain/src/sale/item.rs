//! Sale line item.

use common::{ItemId, SaleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::discount::{self, AmountOverflow, DiscountTier, PricingError};

/// A line item owned by a [`Sale`](super::Sale).
///
/// `discount` and `total_amount` are derived from `quantity` and
/// `unit_price`; there is no way to set them directly. Both stay zero until
/// the item is priced with [`apply_discount`](Self::apply_discount).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub(crate) id: ItemId,
    pub(crate) sale_id: SaleId,
    pub(crate) product: String,
    pub(crate) quantity: u32,
    pub(crate) unit_price: Decimal,
    pub(crate) discount: Decimal,
    pub(crate) total_amount: Decimal,
    pub(crate) is_cancelled: bool,
}

impl SaleItem {
    /// Creates an unpriced line item for a sale.
    ///
    /// Call [`apply_discount`](Self::apply_discount) before persisting.
    pub fn new(
        sale_id: SaleId,
        product: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: ItemId::new(),
            sale_id,
            product: product.into(),
            quantity,
            unit_price,
            discount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            is_cancelled: false,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn sale_id(&self) -> SaleId {
        self.sale_id
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Discount rate applied to this line, in [0, 1].
    pub fn discount(&self) -> Decimal {
        self.discount
    }

    /// Line total after discount.
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    /// Returns true if the product name matches, ignoring case.
    pub fn is_product(&self, product: &str) -> bool {
        self.product.to_lowercase() == product.to_lowercase()
    }

    /// Assigns the discount for the current quantity and recomputes the total.
    ///
    /// Leaves the item untouched on failure.
    pub fn apply_discount(&mut self) -> Result<DiscountTier, PricingError> {
        self.change_line(self.quantity, self.unit_price)
    }

    /// Replaces quantity and unit price, then re-applies the discount policy.
    ///
    /// Leaves the item untouched on failure.
    pub fn change_line(
        &mut self,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<DiscountTier, PricingError> {
        let tier = DiscountTier::for_quantity(quantity)?;
        let total_amount = discount::line_total(quantity, unit_price, tier.rate())?;

        self.quantity = quantity;
        self.unit_price = unit_price;
        self.discount = tier.rate();
        self.total_amount = total_amount;
        Ok(tier)
    }

    /// Recomputes the line total from quantity, unit price and discount.
    pub fn calculate_total_amount(&mut self) -> Result<(), AmountOverflow> {
        self.total_amount = discount::line_total(self.quantity, self.unit_price, self.discount)?;
        Ok(())
    }

    /// Marks the item as cancelled.
    pub fn cancel(&mut self) {
        self.is_cancelled = true;
    }
}
