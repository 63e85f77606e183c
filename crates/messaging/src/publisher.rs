use async_trait::async_trait;
use chrono::Utc;

use crate::{
    BrokerSettings, MessageEnvelope, MessageId, Result, SaleMessage, transport::BrokerTransport,
};

/// Header naming the publishing service.
pub const PUBLISHER_NAME: &str = "SalesService";

/// Schema version stamped on every envelope.
pub const SCHEMA_VERSION: &str = "1.0";

/// Per-call overrides for publishing a message.
///
/// Every field is optional; unset fields fall back to the message's own
/// routing key, a freshly generated message ID, and the sale ID as the
/// correlation ID.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub routing_key: Option<String>,
    pub message_id: Option<MessageId>,
    pub correlation_id: Option<String>,
}

impl PublishOptions {
    /// Creates options with every field defaulted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the routing key.
    pub fn with_routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.routing_key = Some(routing_key.into());
        self
    }

    /// Uses a caller-supplied message ID.
    pub fn with_message_id(mut self, message_id: MessageId) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// Uses a caller-supplied correlation ID.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// Publish contract consumed by the sale command handlers.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Serializes and publishes a message.
    ///
    /// Returns the ID of the published message, or `None` when publishing
    /// is disabled and nothing was sent.
    async fn publish(
        &self,
        message: &SaleMessage,
        options: PublishOptions,
    ) -> Result<Option<MessageId>>;
}

/// Publisher that turns [`SaleMessage`]s into envelopes for a
/// [`BrokerTransport`] under a single logical exchange.
#[derive(Debug, Clone)]
pub struct EventPublisher<T: BrokerTransport> {
    settings: BrokerSettings,
    transport: T,
}

impl<T: BrokerTransport> EventPublisher<T> {
    /// Creates a publisher with the given settings and transport.
    pub fn new(settings: BrokerSettings, transport: T) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Returns the publisher settings.
    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    /// Returns a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn build_envelope(
        &self,
        message: &SaleMessage,
        options: PublishOptions,
    ) -> Result<MessageEnvelope> {
        let published_at = Utc::now();
        let body = message.to_json()?;

        MessageEnvelope::builder()
            .message_id(options.message_id.unwrap_or_default())
            .correlation_id(
                options
                    .correlation_id
                    .unwrap_or_else(|| message.sale_id().to_string()),
            )
            .exchange(self.settings.exchange_name.as_str())
            .routing_key(
                options
                    .routing_key
                    .unwrap_or_else(|| message.routing_key().to_string()),
            )
            .message_type(message.message_type())
            .app_id(self.settings.app_id.as_str())
            .published_at(published_at)
            .header("published-at", published_at.to_rfc3339())
            .header("publisher", PUBLISHER_NAME)
            .header("version", SCHEMA_VERSION)
            .body(body)
            .build()
    }
}

#[async_trait]
impl<T: BrokerTransport> MessagePublisher for EventPublisher<T> {
    async fn publish(
        &self,
        message: &SaleMessage,
        options: PublishOptions,
    ) -> Result<Option<MessageId>> {
        if !self.settings.enabled {
            tracing::warn!(
                routing_key = message.routing_key(),
                "message publishing is disabled, message not published"
            );
            return Ok(None);
        }

        let envelope = self.build_envelope(message, options)?;
        let message_id = envelope.message_id;
        let routing_key = envelope.routing_key.clone();
        let size = envelope.body.len();

        self.transport.send(envelope).await?;

        metrics::counter!("sales_messages_published_total", "routing_key" => routing_key.clone())
            .increment(1);
        tracing::debug!(
            exchange = %self.settings.exchange_name,
            %routing_key,
            %message_id,
            size,
            "message published"
        );

        Ok(Some(message_id))
    }
}
