//! Sale persistence contract.

use async_trait::async_trait;
use common::SaleId;
use thiserror::Error;

use crate::sale::Sale;

/// Errors that can occur in a sale repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Another sale already uses this sale number.
    #[error("Sale number already exists: {sale_number}")]
    DuplicateSaleNumber { sale_number: String },

    /// No sale with this ID is stored.
    #[error("Sale not found: {sale_id}")]
    NotFound { sale_id: SaleId },

    /// The backing store could not serve the request.
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Storage for sale aggregates, items included.
///
/// Implementations must be thread-safe; handlers share a single instance.
#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// Stores a new sale.
    ///
    /// Fails with [`RepositoryError::DuplicateSaleNumber`] if the sale number
    /// is taken.
    async fn create(&self, sale: Sale) -> RepositoryResult<Sale>;

    async fn get_by_id(&self, id: SaleId) -> RepositoryResult<Option<Sale>>;

    async fn get_by_sale_number(&self, sale_number: &str) -> RepositoryResult<Option<Sale>>;

    /// Returns every stored sale ordered by creation time, then sale number.
    async fn get_all(&self) -> RepositoryResult<Vec<Sale>>;

    /// Replaces a stored sale.
    ///
    /// Fails with [`RepositoryError::NotFound`] if the sale was never created.
    async fn update(&self, sale: Sale) -> RepositoryResult<Sale>;

    /// Deletes a sale, returning whether anything was removed.
    async fn delete(&self, id: SaleId) -> RepositoryResult<bool>;
}
