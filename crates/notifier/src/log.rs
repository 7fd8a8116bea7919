//! Notifier that writes events to the process log.

use async_trait::async_trait;

use crate::{Notifier, ORDER_CREATED_SUBJECT, OrderCreated, PublishError, Result};

/// Notifier backed by the structured log.
///
/// Stands in for a broker client in local runs: every event lands in the
/// log with its subject and serialized payload, where a relay or a human
/// can pick it up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a new log notifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, event: &OrderCreated) -> Result<()> {
        let payload =
            serde_json::to_string(event).map_err(|e| PublishError::Failed(e.to_string()))?;

        tracing::info!(
            subject = ORDER_CREATED_SUBJECT,
            %payload,
            "order event published"
        );
        Ok(())
    }
}
