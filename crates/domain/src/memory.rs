use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::SaleId;
use tokio::sync::RwLock;

use crate::repository::{RepositoryError, RepositoryResult, SaleRepository};
use crate::sale::Sale;

#[derive(Debug, Default)]
struct InMemorySaleState {
    sales: HashMap<SaleId, Sale>,
    unavailable: bool,
}

impl InMemorySaleState {
    fn check_available(&self) -> RepositoryResult<()> {
        if self.unavailable {
            return Err(RepositoryError::Unavailable(
                "in-memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

/// In-memory sale repository for testing and development.
///
/// Clones share the same storage. Sale-number uniqueness is enforced on
/// create.
#[derive(Debug, Clone, Default)]
pub struct InMemorySaleRepository {
    state: Arc<RwLock<InMemorySaleState>>,
}

impl InMemorySaleRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`RepositoryError::Unavailable`].
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Returns the number of stored sales.
    pub async fn sale_count(&self) -> usize {
        self.state.read().await.sales.len()
    }

    /// Removes every stored sale.
    pub async fn clear(&self) {
        self.state.write().await.sales.clear();
    }
}

#[async_trait]
impl SaleRepository for InMemorySaleRepository {
    async fn create(&self, sale: Sale) -> RepositoryResult<Sale> {
        let mut state = self.state.write().await;
        state.check_available()?;

        let taken = state
            .sales
            .values()
            .any(|existing| existing.sale_number() == sale.sale_number());
        if taken {
            return Err(RepositoryError::DuplicateSaleNumber {
                sale_number: sale.sale_number().to_string(),
            });
        }

        state.sales.insert(sale.id(), sale.clone());
        Ok(sale)
    }

    async fn get_by_id(&self, id: SaleId) -> RepositoryResult<Option<Sale>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.sales.get(&id).cloned())
    }

    async fn get_by_sale_number(&self, sale_number: &str) -> RepositoryResult<Option<Sale>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state
            .sales
            .values()
            .find(|sale| sale.sale_number() == sale_number)
            .cloned())
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Sale>> {
        let state = self.state.read().await;
        state.check_available()?;

        let mut sales: Vec<Sale> = state.sales.values().cloned().collect();
        sales.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.sale_number().cmp(b.sale_number()))
        });
        Ok(sales)
    }

    async fn update(&self, sale: Sale) -> RepositoryResult<Sale> {
        let mut state = self.state.write().await;
        state.check_available()?;

        match state.sales.get_mut(&sale.id()) {
            Some(stored) => {
                *stored = sale.clone();
                Ok(sale)
            }
            None => Err(RepositoryError::NotFound { sale_id: sale.id() }),
        }
    }

    async fn delete(&self, id: SaleId) -> RepositoryResult<bool> {
        let mut state = self.state.write().await;
        state.check_available()?;
        Ok(state.sales.remove(&id).is_some())
    }
}
