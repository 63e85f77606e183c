//! Sale commands.

use chrono::{DateTime, Utc};
use common::{ItemId, SaleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::command::{Command, check_item_id, check_sale_id};

use super::validation::{MAX_NAME_LEN, MAX_SALE_NUMBER_LEN, ValidationErrors, ValidationResult};

/// A requested line, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemInput {
    pub product: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl SaleItemInput {
    pub fn new(product: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            product: product.into(),
            quantity,
            unit_price,
        }
    }
}

fn check_items(result: &mut ValidationResult, items: &[SaleItemInput]) {
    if items.is_empty() {
        result.push("items", "Sale must have at least one item");
    }

    for (index, item) in items.iter().enumerate() {
        result.check_text(
            &format!("items[{index}].product"),
            "Product",
            &item.product,
            MAX_NAME_LEN,
        );
        if item.quantity == 0 {
            result.push(
                format!("items[{index}].quantity"),
                "Quantity must be greater than 0",
            );
        }
        if item.unit_price <= Decimal::ZERO {
            result.push(
                format!("items[{index}].unitPrice"),
                "Unit price must be greater than 0",
            );
        }
    }
}

/// Command to create a new sale with all of its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSale {
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer: String,
    pub branch: String,
    pub items: Vec<SaleItemInput>,
}

impl CreateSale {
    /// Creates a new CreateSale command.
    pub fn new(
        sale_number: impl Into<String>,
        sale_date: DateTime<Utc>,
        customer: impl Into<String>,
        branch: impl Into<String>,
        items: Vec<SaleItemInput>,
    ) -> Self {
        Self {
            sale_number: sale_number.into(),
            sale_date,
            customer: customer.into(),
            branch: branch.into(),
            items,
        }
    }
}

impl Command for CreateSale {
    const NAME: &'static str = "create_sale";

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut result = ValidationResult::new();

        result.check_text(
            "saleNumber",
            "Sale number",
            &self.sale_number,
            MAX_SALE_NUMBER_LEN,
        );
        if self.sale_date > Utc::now() {
            result.push("saleDate", "Sale date cannot be in the future");
        }
        result.check_text("customer", "Customer", &self.customer, MAX_NAME_LEN);
        result.check_text("branch", "Branch", &self.branch, MAX_NAME_LEN);
        check_items(&mut result, &self.items);

        result.into_result()
    }
}

/// Command to replace a sale's header fields and reconcile its items.
///
/// Sale number and sale date are immutable and cannot be changed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSale {
    pub id: SaleId,
    pub customer: String,
    pub branch: String,
    pub items: Vec<SaleItemInput>,
}

impl UpdateSale {
    /// Creates a new UpdateSale command.
    pub fn new(
        id: SaleId,
        customer: impl Into<String>,
        branch: impl Into<String>,
        items: Vec<SaleItemInput>,
    ) -> Self {
        Self {
            id,
            customer: customer.into(),
            branch: branch.into(),
            items,
        }
    }
}

impl Command for UpdateSale {
    const NAME: &'static str = "update_sale";

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut result = ValidationResult::new();

        check_sale_id(&mut result, "id", self.id);
        result.check_text("customer", "Customer", &self.customer, MAX_NAME_LEN);
        result.check_text("branch", "Branch", &self.branch, MAX_NAME_LEN);
        check_items(&mut result, &self.items);

        result.into_result()
    }
}

/// Command to cancel a whole sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSale {
    pub id: SaleId,
}

impl CancelSale {
    pub fn new(id: SaleId) -> Self {
        Self { id }
    }
}

impl Command for CancelSale {
    const NAME: &'static str = "cancel_sale";

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut result = ValidationResult::new();
        check_sale_id(&mut result, "id", self.id);
        result.into_result()
    }
}

/// Command to cancel a single item of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSaleItem {
    pub sale_id: SaleId,
    pub item_id: ItemId,
}

impl CancelSaleItem {
    pub fn new(sale_id: SaleId, item_id: ItemId) -> Self {
        Self { sale_id, item_id }
    }
}

impl Command for CancelSaleItem {
    const NAME: &'static str = "cancel_sale_item";

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut result = ValidationResult::new();
        check_sale_id(&mut result, "saleId", self.sale_id);
        check_item_id(&mut result, "itemId", self.item_id);
        result.into_result()
    }
}

/// Outcome of [`CancelSaleItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSaleItemResult {
    pub sale_id: SaleId,
    pub item_id: ItemId,
    pub is_cancelled: bool,

    /// Sale total after the item was excluded.
    pub new_total_amount: Decimal,
}

/// Query for a single sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSale {
    pub id: SaleId,
}

impl GetSale {
    pub fn new(id: SaleId) -> Self {
        Self { id }
    }
}

impl Command for GetSale {
    const NAME: &'static str = "get_sale";

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut result = ValidationResult::new();
        check_sale_id(&mut result, "id", self.id);
        result.into_result()
    }
}

/// Query for every stored sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAllSales;

impl Command for GetAllSales {
    const NAME: &'static str = "get_all_sales";

    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Command to delete a sale outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSale {
    pub id: SaleId,
}

impl DeleteSale {
    pub fn new(id: SaleId) -> Self {
        Self { id }
    }
}

impl Command for DeleteSale {
    const NAME: &'static str = "delete_sale";

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut result = ValidationResult::new();
        check_sale_id(&mut result, "id", self.id);
        result.into_result()
    }
}
