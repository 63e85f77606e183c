use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PublishError, Result};

/// Unique identifier for a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a message ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A serialized message plus the transport metadata the broker needs.
///
/// The body is the JSON payload; everything else is metadata carried
/// outside the body (AMQP properties and headers in a real broker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Unique identifier for this message.
    pub message_id: MessageId,

    /// Correlates the message with the aggregate it describes.
    pub correlation_id: String,

    /// Logical exchange the message is addressed to.
    pub exchange: String,

    /// Routing key used by the broker to select queues.
    pub routing_key: String,

    /// Type tag of the body (e.g. "SaleCreatedMessage").
    pub message_type: String,

    /// Publishing application.
    pub app_id: String,

    /// MIME type of the body.
    pub content_type: String,

    /// Character encoding of the body.
    pub content_encoding: String,

    /// Whether the broker should persist the message to disk.
    pub persistent: bool,

    /// When the message was handed to the transport.
    pub published_at: DateTime<Utc>,

    /// Additional string headers.
    pub headers: HashMap<String, String>,

    /// The serialized message body.
    pub body: Vec<u8>,
}

impl MessageEnvelope {
    /// Creates a new envelope builder.
    pub fn builder() -> MessageEnvelopeBuilder {
        MessageEnvelopeBuilder::default()
    }

    /// Deserializes the body as JSON.
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }
}

/// Builder for constructing message envelopes.
#[derive(Debug, Default)]
pub struct MessageEnvelopeBuilder {
    message_id: Option<MessageId>,
    correlation_id: Option<String>,
    exchange: Option<String>,
    routing_key: Option<String>,
    message_type: Option<String>,
    app_id: Option<String>,
    persistent: Option<bool>,
    published_at: Option<DateTime<Utc>>,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl MessageEnvelopeBuilder {
    /// Sets the message ID. If not set, a new ID will be generated.
    pub fn message_id(mut self, id: MessageId) -> Self {
        self.message_id = Some(id);
        self
    }

    /// Sets the correlation ID.
    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Sets the exchange.
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Sets the routing key.
    pub fn routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.routing_key = Some(routing_key.into());
        self
    }

    /// Sets the message type tag.
    pub fn message_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = Some(message_type.into());
        self
    }

    /// Sets the publishing application ID.
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Sets whether the message is persistent. Defaults to true.
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = Some(persistent);
        self
    }

    /// Sets the publish timestamp. If not set, the current time will be used.
    pub fn published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Adds a header entry.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the serialized body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the envelope.
    ///
    /// Fails if the routing key, exchange, message type or body is missing.
    pub fn build(self) -> Result<MessageEnvelope> {
        let routing_key = self
            .routing_key
            .filter(|k| !k.is_empty())
            .ok_or(PublishError::InvalidEnvelope("routing_key is required"))?;
        let exchange = self
            .exchange
            .ok_or(PublishError::InvalidEnvelope("exchange is required"))?;
        let message_type = self
            .message_type
            .ok_or(PublishError::InvalidEnvelope("message_type is required"))?;
        let body = self
            .body
            .ok_or(PublishError::InvalidEnvelope("body is required"))?;

        Ok(MessageEnvelope {
            message_id: self.message_id.unwrap_or_default(),
            correlation_id: self.correlation_id.unwrap_or_default(),
            exchange,
            routing_key,
            message_type,
            app_id: self.app_id.unwrap_or_default(),
            content_type: "application/json".to_string(),
            content_encoding: "utf-8".to_string(),
            persistent: self.persistent.unwrap_or(true),
            published_at: self.published_at.unwrap_or_else(Utc::now),
            headers: self.headers,
            body,
        })
    }
}
