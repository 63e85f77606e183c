//! Domain error types.

use common::{ItemId, SaleId};
use thiserror::Error;

use crate::repository::RepositoryError;
use crate::sale::ValidationErrors;
use crate::sale::discount::AmountOverflow;

/// Broad classification of a [`SaleError`], for mapping onto an outer
/// surface such as HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input or a broken business rule.
    Validation,

    /// The referenced sale or item does not exist.
    NotFound,

    /// The request clashes with current state.
    Conflict,

    /// Infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// Returns a lowercase label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Errors returned by the sale command handlers.
#[derive(Debug, Error)]
pub enum SaleError {
    /// Command shape or aggregate validation failed.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A line exceeds the identical-item limit.
    #[error("Cannot sell more than 20 identical items of '{product}' (requested {quantity})")]
    QuantityLimitExceeded { product: String, quantity: u32 },

    #[error("Sale not found: {sale_id}")]
    SaleNotFound { sale_id: SaleId },

    #[error("Item {item_id} not found in sale {sale_id}")]
    ItemNotFound { sale_id: SaleId, item_id: ItemId },

    #[error("Sale number already exists: {sale_number}")]
    DuplicateSaleNumber { sale_number: String },

    /// The sale is cancelled and accepts no further mutations.
    #[error("Cannot {action} sale {sale_id}: sale is already cancelled")]
    SaleAlreadyCancelled {
        sale_id: SaleId,
        action: &'static str,
    },

    #[error("Item {item_id} in sale {sale_id} is already cancelled")]
    ItemAlreadyCancelled { sale_id: SaleId, item_id: ItemId },

    /// An error occurred in the repository.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl SaleError {
    /// Returns the broad classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SaleError::Validation(_) | SaleError::QuantityLimitExceeded { .. } => {
                ErrorKind::Validation
            }
            SaleError::SaleNotFound { .. } | SaleError::ItemNotFound { .. } => ErrorKind::NotFound,
            SaleError::DuplicateSaleNumber { .. }
            | SaleError::SaleAlreadyCancelled { .. }
            | SaleError::ItemAlreadyCancelled { .. } => ErrorKind::Conflict,
            SaleError::Repository(_) => ErrorKind::Internal,
        }
    }

    /// Returns the field violations, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            SaleError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for SaleError {
    fn from(errors: ValidationErrors) -> Self {
        SaleError::Validation(errors)
    }
}

/// A sale total that does not fit in a `Decimal` is reported against
/// `totalAmount`.
impl From<AmountOverflow> for SaleError {
    fn from(_: AmountOverflow) -> Self {
        SaleError::Validation(ValidationErrors::single(
            "totalAmount",
            "Sale total is out of range",
        ))
    }
}

impl From<RepositoryError> for SaleError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::DuplicateSaleNumber { sale_number } => {
                SaleError::DuplicateSaleNumber { sale_number }
            }
            RepositoryError::NotFound { sale_id } => SaleError::SaleNotFound { sale_id },
            other => SaleError::Repository(other),
        }
    }
}
