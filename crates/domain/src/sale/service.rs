//! Sale service implementing the command handlers.

use std::time::Instant;

use chrono::Utc;
use common::SaleId;
use messaging::{MessagePublisher, PublishOptions, SaleMessage};

use crate::command::Command;
use crate::error::SaleError;
use crate::repository::SaleRepository;

use super::discount::PricingError;
use super::{
    CancelSale, CancelSaleItem, CancelSaleItemResult, CreateSale, DeleteSale, GetAllSales,
    GetSale, Sale, SaleItem, SaleItemInput, UpdateSale, ValidationErrors, events,
};

/// Maps a pricing failure on the `index`th incoming line.
fn pricing_error(index: usize, product: &str, e: PricingError) -> SaleError {
    match e {
        PricingError::QuantityLimitExceeded(limit) => SaleError::QuantityLimitExceeded {
            product: product.to_string(),
            quantity: limit.quantity,
        },
        PricingError::AmountOverflow(_) => SaleError::Validation(ValidationErrors::single(
            format!("items[{index}].unitPrice"),
            "Line total is out of range",
        )),
    }
}

/// Builds a discounted line item from caller input.
fn priced_item(
    sale_id: SaleId,
    index: usize,
    input: SaleItemInput,
) -> Result<SaleItem, SaleError> {
    let mut item = SaleItem::new(sale_id, input.product, input.quantity, input.unit_price);
    item.apply_discount()
        .map_err(|e| pricing_error(index, item.product(), e))?;
    Ok(item)
}

/// Reconciles a sale's items against an incoming list by product name.
///
/// Matching ignores case and sees items appended earlier in the same pass,
/// so repeated product names collapse into one item carrying the last
/// quantity and price. Items no incoming entry matched are removed.
fn reconcile_items(sale: &mut Sale, inputs: Vec<SaleItemInput>) -> Result<(), SaleError> {
    let sale_id = sale.id();
    let mut kept = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.into_iter().enumerate() {
        let position = sale
            .items
            .iter()
            .position(|item| item.is_product(&input.product));

        match position {
            Some(position) => {
                let item = &mut sale.items[position];
                item.change_line(input.quantity, input.unit_price)
                    .map_err(|e| pricing_error(index, &input.product, e))?;
                kept.push(item.id());
            }
            None => {
                let item = priced_item(sale_id, index, input)?;
                kept.push(item.id());
                sale.items.push(item);
            }
        }
    }

    sale.items.retain(|item| kept.contains(&item.id()));
    Ok(())
}

/// Counts a handled command and logs its failure, if any.
fn record<T>(
    command: &'static str,
    started: Instant,
    result: Result<T, SaleError>,
) -> Result<T, SaleError> {
    metrics::counter!("sales_commands_total", "command" => command).increment(1);
    metrics::histogram!("sales_command_duration_seconds", "command" => command)
        .record(started.elapsed().as_secs_f64());

    if let Err(e) = &result {
        let kind = e.kind().as_str();
        metrics::counter!("sales_command_failures_total", "command" => command, "kind" => kind)
            .increment(1);
        tracing::warn!(command, kind, error = %e, "sale command failed");
    }

    result
}

/// Service for managing sales.
///
/// Each handler validates its command, loads and mutates the aggregate,
/// re-validates it, persists it and then publishes the matching message.
/// Publishing happens after the write has committed; its failure is logged
/// and counted but never returned to the caller.
pub struct SaleService<R: SaleRepository, P: MessagePublisher> {
    repository: R,
    publisher: P,
}

impl<R: SaleRepository, P: MessagePublisher> SaleService<R, P> {
    /// Creates a new sale service.
    pub fn new(repository: R, publisher: P) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Returns a reference to the underlying publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Creates a sale with all of its items.
    #[tracing::instrument(skip(self, cmd), fields(sale_number = %cmd.sale_number))]
    pub async fn create_sale(&self, cmd: CreateSale) -> Result<Sale, SaleError> {
        let started = Instant::now();
        record(CreateSale::NAME, started, self.handle_create(cmd).await)
    }

    /// Replaces a sale's customer, branch and items.
    #[tracing::instrument(skip(self, cmd), fields(sale_id = %cmd.id))]
    pub async fn update_sale(&self, cmd: UpdateSale) -> Result<Sale, SaleError> {
        let started = Instant::now();
        record(UpdateSale::NAME, started, self.handle_update(cmd).await)
    }

    /// Cancels a whole sale.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_sale(&self, cmd: CancelSale) -> Result<Sale, SaleError> {
        let started = Instant::now();
        record(CancelSale::NAME, started, self.handle_cancel(cmd).await)
    }

    /// Cancels one item of a sale.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_sale_item(
        &self,
        cmd: CancelSaleItem,
    ) -> Result<CancelSaleItemResult, SaleError> {
        let started = Instant::now();
        record(
            CancelSaleItem::NAME,
            started,
            self.handle_cancel_item(cmd).await,
        )
    }

    /// Loads a sale by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_sale(&self, query: GetSale) -> Result<Sale, SaleError> {
        let started = Instant::now();
        let result = match query.validate() {
            Ok(()) => self.load(query.id).await,
            Err(errors) => Err(errors.into()),
        };
        record(GetSale::NAME, started, result)
    }

    /// Returns every sale ordered by creation time, then sale number.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_sales(&self, query: GetAllSales) -> Result<Vec<Sale>, SaleError> {
        let started = Instant::now();
        let result = match query.validate() {
            Ok(()) => self.repository.get_all().await.map_err(SaleError::from),
            Err(errors) => Err(errors.into()),
        };
        record(GetAllSales::NAME, started, result)
    }

    /// Deletes a sale. No message is published.
    #[tracing::instrument(skip(self))]
    pub async fn delete_sale(&self, cmd: DeleteSale) -> Result<(), SaleError> {
        let started = Instant::now();
        record(DeleteSale::NAME, started, self.handle_delete(cmd).await)
    }

    async fn handle_create(&self, cmd: CreateSale) -> Result<Sale, SaleError> {
        cmd.validate()?;

        if self
            .repository
            .get_by_sale_number(&cmd.sale_number)
            .await?
            .is_some()
        {
            return Err(SaleError::DuplicateSaleNumber {
                sale_number: cmd.sale_number,
            });
        }

        let mut sale = Sale::new(cmd.sale_number, cmd.sale_date, cmd.customer, cmd.branch);
        for (index, input) in cmd.items.into_iter().enumerate() {
            let item = priced_item(sale.id(), index, input)?;
            sale.add_item(item)?;
        }
        sale.calculate_total_amount()?;
        sale.validate().into_result()?;

        let sale = self.repository.create(sale).await?;
        tracing::info!(sale_id = %sale.id(), total = %sale.total_amount(), "sale created");

        self.publish_best_effort(events::sale_created(&sale, Utc::now()))
            .await;
        Ok(sale)
    }

    async fn handle_update(&self, cmd: UpdateSale) -> Result<Sale, SaleError> {
        cmd.validate()?;

        let mut sale = self.load(cmd.id).await?;
        if sale.is_cancelled() {
            return Err(SaleError::SaleAlreadyCancelled {
                sale_id: sale.id(),
                action: "update",
            });
        }

        sale.update_details(cmd.customer, cmd.branch);
        reconcile_items(&mut sale, cmd.items)?;
        sale.calculate_total_amount()?;
        sale.validate().into_result()?;

        let sale = self.repository.update(sale).await?;
        tracing::info!(sale_id = %sale.id(), total = %sale.total_amount(), "sale updated");

        self.publish_best_effort(events::sale_modified(&sale, Utc::now()))
            .await;
        Ok(sale)
    }

    async fn handle_cancel(&self, cmd: CancelSale) -> Result<Sale, SaleError> {
        cmd.validate()?;

        let mut sale = self.load(cmd.id).await?;
        if sale.is_cancelled() {
            return Err(SaleError::SaleAlreadyCancelled {
                sale_id: sale.id(),
                action: "cancel",
            });
        }

        sale.cancel();
        let sale = self.repository.update(sale).await?;
        tracing::info!(sale_id = %sale.id(), "sale cancelled");

        self.publish_best_effort(events::sale_cancelled(&sale, Utc::now()))
            .await;
        Ok(sale)
    }

    async fn handle_cancel_item(
        &self,
        cmd: CancelSaleItem,
    ) -> Result<CancelSaleItemResult, SaleError> {
        cmd.validate()?;

        let mut sale = self.load(cmd.sale_id).await?;
        if sale.is_cancelled() {
            return Err(SaleError::SaleAlreadyCancelled {
                sale_id: sale.id(),
                action: "cancel an item of",
            });
        }

        match sale.item(cmd.item_id) {
            None => {
                return Err(SaleError::ItemNotFound {
                    sale_id: cmd.sale_id,
                    item_id: cmd.item_id,
                });
            }
            Some(item) if item.is_cancelled() => {
                return Err(SaleError::ItemAlreadyCancelled {
                    sale_id: cmd.sale_id,
                    item_id: cmd.item_id,
                });
            }
            Some(_) => {}
        }

        sale.cancel_item(cmd.item_id)?;
        let sale = self.repository.update(sale).await?;
        tracing::info!(
            sale_id = %sale.id(),
            item_id = %cmd.item_id,
            total = %sale.total_amount(),
            "sale item cancelled"
        );

        if let Some(item) = sale.item(cmd.item_id) {
            self.publish_best_effort(events::item_cancelled(&sale, item, Utc::now()))
                .await;
        }

        Ok(CancelSaleItemResult {
            sale_id: sale.id(),
            item_id: cmd.item_id,
            is_cancelled: true,
            new_total_amount: sale.total_amount(),
        })
    }

    async fn handle_delete(&self, cmd: DeleteSale) -> Result<(), SaleError> {
        cmd.validate()?;

        if !self.repository.delete(cmd.id).await? {
            return Err(SaleError::SaleNotFound { sale_id: cmd.id });
        }
        tracing::info!(sale_id = %cmd.id, "sale deleted");
        Ok(())
    }

    async fn load(&self, sale_id: SaleId) -> Result<Sale, SaleError> {
        self.repository
            .get_by_id(sale_id)
            .await?
            .ok_or(SaleError::SaleNotFound { sale_id })
    }

    async fn publish_best_effort(&self, message: SaleMessage) {
        let routing_key = message.routing_key();

        if let Err(e) = self.publisher.publish(&message, PublishOptions::new()).await {
            metrics::counter!("sales_publish_failures_total", "routing_key" => routing_key)
                .increment(1);
            tracing::error!(
                routing_key,
                sale_id = %message.sale_id(),
                error = %e,
                "failed to publish sale message"
            );
        }
    }
}
