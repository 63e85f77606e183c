//! Mapping from sale state to published messages.

use chrono::{DateTime, Utc};
use messaging::{
    ItemCancelledMessage, SaleCancelledMessage, SaleCreatedMessage, SaleItemMessage, SaleMessage,
    SaleModifiedMessage,
};

use super::{Sale, SaleItem};

fn item_message(item: &SaleItem) -> SaleItemMessage {
    SaleItemMessage {
        item_id: item.id(),
        product: item.product().to_string(),
        quantity: item.quantity(),
        unit_price: item.unit_price(),
        discount: item.discount(),
        total_amount: item.total_amount(),
        is_cancelled: item.is_cancelled(),
    }
}

fn item_messages(sale: &Sale) -> Vec<SaleItemMessage> {
    sale.items().iter().map(item_message).collect()
}

/// Builds the `sale.created` message for a freshly stored sale.
pub fn sale_created(sale: &Sale, occurred_at: DateTime<Utc>) -> SaleMessage {
    SaleMessage::SaleCreated(SaleCreatedMessage {
        sale_id: sale.id(),
        sale_number: sale.sale_number().to_string(),
        sale_date: sale.sale_date(),
        customer: sale.customer().to_string(),
        total_amount: sale.total_amount(),
        branch: sale.branch().to_string(),
        occurred_at,
        items: item_messages(sale),
    })
}

/// Builds the `sale.modified` message after an update.
pub fn sale_modified(sale: &Sale, occurred_at: DateTime<Utc>) -> SaleMessage {
    SaleMessage::SaleModified(SaleModifiedMessage {
        sale_id: sale.id(),
        sale_number: sale.sale_number().to_string(),
        customer: sale.customer().to_string(),
        total_amount: sale.total_amount(),
        branch: sale.branch().to_string(),
        occurred_at,
        items: item_messages(sale),
    })
}

pub fn sale_cancelled(sale: &Sale, occurred_at: DateTime<Utc>) -> SaleMessage {
    SaleMessage::SaleCancelled(SaleCancelledMessage {
        sale_id: sale.id(),
        sale_number: sale.sale_number().to_string(),
        customer: sale.customer().to_string(),
        branch: sale.branch().to_string(),
        occurred_at,
    })
}

/// Builds the `sale.item.cancelled` message for one cancelled line.
pub fn item_cancelled(sale: &Sale, item: &SaleItem, occurred_at: DateTime<Utc>) -> SaleMessage {
    SaleMessage::ItemCancelled(ItemCancelledMessage {
        sale_id: sale.id(),
        item_id: item.id(),
        sale_number: sale.sale_number().to_string(),
        product: item.product().to_string(),
        quantity: item.quantity(),
        unit_price: item.unit_price(),
        total_amount: item.total_amount(),
        occurred_at,
    })
}
