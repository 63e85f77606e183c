//! Broker publish contract for sale events.
//!
//! This crate provides:
//! - Message schemas for every sale event, keyed by routing key
//! - The transport envelope and its builder
//! - The `MessagePublisher` contract and an `EventPublisher` over a pluggable
//!   `BrokerTransport`
//! - An in-memory transport for tests

pub mod envelope;
pub mod error;
pub mod memory;
pub mod message;
pub mod publisher;
pub mod settings;
pub mod transport;

pub use envelope::{MessageEnvelope, MessageEnvelopeBuilder, MessageId};
pub use error::{PublishError, Result};
pub use memory::InMemoryTransport;
pub use message::{
    ItemCancelledMessage, SaleCancelledMessage, SaleCreatedMessage, SaleItemMessage,
    SaleMessage, SaleModifiedMessage, routing_keys,
};
pub use publisher::{EventPublisher, MessagePublisher, PublishOptions};
pub use settings::BrokerSettings;
pub use transport::BrokerTransport;
