use thiserror::Error;

/// Errors that can occur when publishing a message to the broker.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The message body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The envelope is missing a required field.
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(&'static str),

    /// The broker transport rejected or failed to deliver the message.
    #[error("Transport error on routing key {routing_key}: {reason}")]
    Transport { routing_key: String, reason: String },
}

/// Result type for publish operations.
pub type Result<T> = std::result::Result<T, PublishError>;
