//! Command handling infrastructure.

use common::{ItemId, SaleId};

use crate::sale::{ValidationErrors, ValidationResult};

/// Trait for commands accepted by the sale handlers.
///
/// Commands represent an intention to perform an action. Shape validation
/// runs before any state is loaded; rules that need the stored aggregate are
/// checked by the handler.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Name used in log spans and metric labels.
    const NAME: &'static str;

    /// Checks required fields, lengths and ranges.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Records a violation if a sale ID is empty.
pub(crate) fn check_sale_id(result: &mut ValidationResult, field: &str, id: SaleId) {
    if id.is_nil() {
        result.push(field, "Sale ID is required");
    }
}

/// Records a violation if an item ID is empty.
pub(crate) fn check_item_id(result: &mut ValidationResult, field: &str, id: ItemId) {
    if id.is_nil() {
        result.push(field, "Item ID is required");
    }
}
