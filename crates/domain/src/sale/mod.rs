//! Sale aggregate and related types.

mod aggregate;
mod commands;
pub mod discount;
pub mod events;
mod item;
mod service;
mod validation;

pub use aggregate::Sale;
pub use commands::*;
pub use discount::{AmountOverflow, DiscountTier, PricingError, QuantityLimitExceeded};
pub use item::SaleItem;
pub use service::SaleService;
pub use validation::{
    MAX_NAME_LEN, MAX_SALE_NUMBER_LEN, SaleValidator, ValidationError, ValidationErrors,
    ValidationResult,
};
