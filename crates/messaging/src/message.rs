//! Sale event message schemas.
//!
//! Every message is serialized as a camelCase JSON body. Transport metadata
//! (message id, correlation id, type tag, publish timestamp) travels in the
//! [`MessageEnvelope`](crate::MessageEnvelope), not in the body.

use chrono::{DateTime, Utc};
use common::{ItemId, SaleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Routing keys used on the sales exchange.
pub mod routing_keys {
    /// A sale was created.
    pub const SALE_CREATED: &str = "sale.created";

    /// A sale's header or items were modified.
    pub const SALE_MODIFIED: &str = "sale.modified";

    /// A whole sale was cancelled.
    pub const SALE_CANCELLED: &str = "sale.cancelled";

    /// A single line item was cancelled.
    pub const ITEM_CANCELLED: &str = "sale.item.cancelled";
}

/// Line item snapshot carried by created/modified messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemMessage {
    pub item_id: ItemId,
    pub product: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub is_cancelled: bool,
}

/// Body of a `sale.created` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCreatedMessage {
    pub sale_id: SaleId,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer: String,
    pub total_amount: Decimal,
    pub branch: String,
    pub occurred_at: DateTime<Utc>,
    pub items: Vec<SaleItemMessage>,
}

/// Body of a `sale.modified` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleModifiedMessage {
    pub sale_id: SaleId,
    pub sale_number: String,
    pub customer: String,
    pub total_amount: Decimal,
    pub branch: String,
    pub occurred_at: DateTime<Utc>,
    pub items: Vec<SaleItemMessage>,
}

/// Body of a `sale.cancelled` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCancelledMessage {
    pub sale_id: SaleId,
    pub sale_number: String,
    pub customer: String,
    pub branch: String,
    pub occurred_at: DateTime<Utc>,
}

/// Body of a `sale.item.cancelled` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCancelledMessage {
    pub sale_id: SaleId,
    pub item_id: ItemId,
    pub sale_number: String,
    pub product: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Messages published by the sales service, one variant per routing key.
#[derive(Debug, Clone, PartialEq)]
pub enum SaleMessage {
    SaleCreated(SaleCreatedMessage),
    SaleModified(SaleModifiedMessage),
    SaleCancelled(SaleCancelledMessage),
    ItemCancelled(ItemCancelledMessage),
}

impl SaleMessage {
    /// Returns the routing key this message is published under.
    pub fn routing_key(&self) -> &'static str {
        match self {
            SaleMessage::SaleCreated(_) => routing_keys::SALE_CREATED,
            SaleMessage::SaleModified(_) => routing_keys::SALE_MODIFIED,
            SaleMessage::SaleCancelled(_) => routing_keys::SALE_CANCELLED,
            SaleMessage::ItemCancelled(_) => routing_keys::ITEM_CANCELLED,
        }
    }

    /// Returns the type tag attached to the envelope.
    pub fn message_type(&self) -> &'static str {
        match self {
            SaleMessage::SaleCreated(_) => "SaleCreatedMessage",
            SaleMessage::SaleModified(_) => "SaleModifiedMessage",
            SaleMessage::SaleCancelled(_) => "SaleCancelledMessage",
            SaleMessage::ItemCancelled(_) => "ItemCancelledMessage",
        }
    }

    /// Returns the sale the message is about.
    pub fn sale_id(&self) -> SaleId {
        match self {
            SaleMessage::SaleCreated(m) => m.sale_id,
            SaleMessage::SaleModified(m) => m.sale_id,
            SaleMessage::SaleCancelled(m) => m.sale_id,
            SaleMessage::ItemCancelled(m) => m.sale_id,
        }
    }

    /// Serializes the message body to JSON bytes.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            SaleMessage::SaleCreated(m) => serde_json::to_vec(m),
            SaleMessage::SaleModified(m) => serde_json::to_vec(m),
            SaleMessage::SaleCancelled(m) => serde_json::to_vec(m),
            SaleMessage::ItemCancelled(m) => serde_json::to_vec(m),
        }
    }
}
