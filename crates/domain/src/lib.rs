//! Domain layer for the sales service.
//!
//! This crate provides:
//! - The quantity-tiered discount policy
//! - The `Sale` aggregate, its line items and the aggregate validator
//! - Sale commands and the `SaleService` handlers
//! - The `SaleRepository` contract and an in-memory implementation

pub mod command;
pub mod error;
pub mod memory;
pub mod repository;
pub mod sale;

pub use command::Command;
pub use error::{ErrorKind, SaleError};
pub use memory::InMemorySaleRepository;
pub use repository::{RepositoryError, RepositoryResult, SaleRepository};
pub use sale::{
    AmountOverflow, CancelSale, CancelSaleItem, CancelSaleItemResult, CreateSale, DeleteSale,
    DiscountTier, GetAllSales, GetSale, PricingError, QuantityLimitExceeded, Sale, SaleItem,
    SaleItemInput, SaleService, SaleValidator, UpdateSale, ValidationError, ValidationErrors,
    ValidationResult,
};
