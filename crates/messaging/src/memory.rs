use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{MessageEnvelope, PublishError, Result, transport::BrokerTransport};

#[derive(Debug, Default)]
struct InMemoryTransportState {
    sent: Vec<MessageEnvelope>,
    fail_on_send: bool,
}

/// In-memory broker transport for testing.
///
/// Records every envelope it receives. Clones share the same buffer, so a
/// test can keep one handle and give another to the publisher.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransport {
    state: Arc<RwLock<InMemoryTransportState>>,
}

impl InMemoryTransport {
    /// Creates a new empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the transport to reject every send.
    pub async fn set_fail_on_send(&self, fail: bool) {
        self.state.write().await.fail_on_send = fail;
    }

    /// Returns all envelopes sent so far, in send order.
    pub async fn sent(&self) -> Vec<MessageEnvelope> {
        self.state.read().await.sent.clone()
    }

    /// Returns the envelopes sent with the given routing key.
    pub async fn sent_with_routing_key(&self, routing_key: &str) -> Vec<MessageEnvelope> {
        self.state
            .read()
            .await
            .sent
            .iter()
            .filter(|e| e.routing_key == routing_key)
            .cloned()
            .collect()
    }

    /// Returns the number of envelopes sent.
    pub async fn sent_count(&self) -> usize {
        self.state.read().await.sent.len()
    }

    /// Clears all recorded envelopes.
    pub async fn clear(&self) {
        self.state.write().await.sent.clear();
    }
}

#[async_trait]
impl BrokerTransport for InMemoryTransport {
    async fn send(&self, envelope: MessageEnvelope) -> Result<()> {
        let mut state = self.state.write().await;

        if state.fail_on_send {
            return Err(PublishError::Transport {
                routing_key: envelope.routing_key,
                reason: "broker unavailable".to_string(),
            });
        }

        state.sent.push(envelope);
        Ok(())
    }
}
