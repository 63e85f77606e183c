use async_trait::async_trait;

use crate::{MessageEnvelope, Result};

/// Low-level broker transport.
///
/// Implementations own the connection lifecycle and topology; this crate
/// only hands them fully built envelopes. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Delivers an envelope to the broker.
    async fn send(&self, envelope: MessageEnvelope) -> Result<()>;
}
