//! Sale aggregate implementation.

use chrono::{DateTime, Utc};
use common::{ItemId, SaleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SaleItem;
use super::discount::AmountOverflow;
use super::validation::{SaleValidator, ValidationResult};

/// Validator shared by every sale.
const VALIDATOR: SaleValidator = SaleValidator;

/// Sale aggregate root.
///
/// Owns its line items. `total_amount` is derived from the non-cancelled
/// items and is recomputed on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    /// Unique sale identifier.
    id: SaleId,

    /// Business key, unique across sales.
    pub(crate) sale_number: String,

    sale_date: DateTime<Utc>,
    customer: String,
    branch: String,

    /// Sum of non-cancelled item totals.
    total_amount: Decimal,

    is_cancelled: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,

    /// Line items in insertion order.
    pub(crate) items: Vec<SaleItem>,
}

impl Sale {
    /// Creates an empty, active sale with a fresh ID.
    pub fn new(
        sale_number: impl Into<String>,
        sale_date: DateTime<Utc>,
        customer: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            id: SaleId::new(),
            sale_number: sale_number.into(),
            sale_date,
            customer: customer.into(),
            branch: branch.into(),
            total_amount: Decimal::ZERO,
            is_cancelled: false,
            created_at: Utc::now(),
            updated_at: None,
            items: Vec::new(),
        }
    }
}

// Query methods
impl Sale {
    pub fn id(&self) -> SaleId {
        self.id
    }

    pub fn sale_number(&self) -> &str {
        &self.sale_number
    }

    pub fn sale_date(&self) -> DateTime<Utc> {
        self.sale_date
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the sum of non-cancelled item totals.
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the time of the last mutation, if any.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns all items, cancelled ones included, in insertion order.
    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    /// Returns the items that still count towards the total.
    pub fn active_items(&self) -> impl Iterator<Item = &SaleItem> {
        self.items.iter().filter(|item| !item.is_cancelled())
    }

    /// Returns an item by ID.
    pub fn item(&self, item_id: ItemId) -> Option<&SaleItem> {
        self.items.iter().find(|item| item.id() == item_id)
    }

    pub(crate) fn item_mut(&mut self, item_id: ItemId) -> Option<&mut SaleItem> {
        self.items.iter_mut().find(|item| item.id() == item_id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Runs the aggregate validator against the current time.
    pub fn validate(&self) -> ValidationResult {
        VALIDATOR.validate(self)
    }

    /// Runs the aggregate validator, treating `now` as the current time.
    pub fn validate_at(&self, now: DateTime<Utc>) -> ValidationResult {
        VALIDATOR.validate_at(self, now)
    }
}

// Command methods
impl Sale {
    /// Recomputes the total from non-cancelled items and stamps `updated_at`.
    ///
    /// Leaves the total unchanged if the sum does not fit in a `Decimal`.
    pub fn calculate_total_amount(&mut self) -> Result<(), AmountOverflow> {
        let total = self
            .active_items()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.total_amount()))
            .ok_or(AmountOverflow)?;

        self.total_amount = total.normalize();
        self.touch();
        Ok(())
    }

    /// Marks the sale as cancelled.
    ///
    /// The already-cancelled check belongs to the caller.
    pub fn cancel(&mut self) {
        self.is_cancelled = true;
        self.touch();
    }

    /// Appends an item, taking ownership of it, and recomputes the total.
    ///
    /// The item is not kept if the new total overflows.
    pub fn add_item(&mut self, mut item: SaleItem) -> Result<(), AmountOverflow> {
        item.sale_id = self.id;
        self.items.push(item);
        if let Err(e) = self.calculate_total_amount() {
            self.items.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Removes an item if present and recomputes the total.
    pub fn remove_item(&mut self, item_id: ItemId) -> Result<(), AmountOverflow> {
        self.items.retain(|item| item.id() != item_id);
        self.calculate_total_amount()
    }

    /// Cancels a single item and recomputes the total.
    ///
    /// Returns false if the sale has no such item.
    pub fn cancel_item(&mut self, item_id: ItemId) -> Result<bool, AmountOverflow> {
        let Some(item) = self.item_mut(item_id) else {
            return Ok(false);
        };
        item.cancel();
        self.calculate_total_amount()?;
        Ok(true)
    }

    /// Replaces the mutable header fields.
    pub fn update_details(&mut self, customer: impl Into<String>, branch: impl Into<String>) {
        self.customer = customer.into();
        self.branch = branch.into();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
