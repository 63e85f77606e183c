//! Aggregate validation.
//!
//! Every rule is evaluated and every violation is collected; validation
//! never stops at the first failure.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::discount::{MAX_IDENTICAL_ITEMS, MIN_DISCOUNT_QUANTITY};
use super::{Sale, SaleItem};

pub const MAX_SALE_NUMBER_LEN: usize = 50;
pub const MAX_NAME_LEN: usize = 100;

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The violating field, e.g. `customer` or `items[1].quantity`.
    pub field: String,

    /// Human-readable description of the violation.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Collected violations, used as the error payload of a failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Wraps a single violation.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![ValidationError::new(field, message)])
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Returns true if any violation is tagged with the given field.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Outcome of running a validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Records a violation.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field, message));
    }

    /// Checks a required free-text field against a maximum length in characters.
    pub fn check_text(&mut self, field: &str, label: &str, value: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.push(field, format!("{label} is required"));
        } else if value.chars().count() > max_len {
            self.push(field, format!("{label} cannot exceed {max_len} characters"));
        }
    }

    /// Converts into a `Result`, failing with every collected violation.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// Stateless rule evaluator for a [`Sale`] and its items.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaleValidator;

impl SaleValidator {
    /// Validates a sale against the current time.
    pub fn validate(&self, sale: &Sale) -> ValidationResult {
        self.validate_at(sale, Utc::now())
    }

    /// Validates a sale, treating `now` as the current time.
    pub fn validate_at(&self, sale: &Sale, now: DateTime<Utc>) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.check_text(
            "saleNumber",
            "Sale number",
            sale.sale_number(),
            MAX_SALE_NUMBER_LEN,
        );
        result.check_text("customer", "Customer", sale.customer(), MAX_NAME_LEN);
        result.check_text("branch", "Branch", sale.branch(), MAX_NAME_LEN);

        if sale.sale_date() > now {
            result.push("saleDate", "Sale date cannot be in the future");
        }

        if sale.items().is_empty() {
            result.push("items", "Sale must have at least one item");
        }

        for (index, item) in sale.items().iter().enumerate() {
            self.validate_item(index, item, &mut result);
        }

        result
    }

    fn validate_item(&self, index: usize, item: &SaleItem, result: &mut ValidationResult) {
        let field = |name: &str| format!("items[{index}].{name}");

        result.check_text(&field("product"), "Product", item.product(), MAX_NAME_LEN);

        if item.quantity() == 0 {
            result.push(field("quantity"), "Quantity must be greater than 0");
        } else if item.quantity() > MAX_IDENTICAL_ITEMS {
            result.push(
                field("quantity"),
                format!("Cannot sell more than {MAX_IDENTICAL_ITEMS} identical items"),
            );
        }

        if item.unit_price() <= Decimal::ZERO {
            result.push(field("unitPrice"), "Unit price must be greater than 0");
        }

        if item.discount() < Decimal::ZERO || item.discount() > Decimal::ONE {
            result.push(field("discount"), "Discount must be between 0 and 1");
        }

        if item.quantity() < MIN_DISCOUNT_QUANTITY && item.discount() > Decimal::ZERO {
            result.push(
                field("discount"),
                "Discount rules violated: purchases below 4 items cannot have a discount",
            );
        }
    }
}
