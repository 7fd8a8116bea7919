//! In-memory notifier for testing.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::{Notifier, OrderCreated, PublishError, Result};

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    published: Vec<OrderCreated>,
    fail_on_publish: bool,
    publish_delay: Option<Duration>,
}

/// In-memory notifier that records every published event.
///
/// Used by tests to assert what was published and to force publish
/// failures without a broker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail every publish call.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_on_publish = fail;
    }

    /// Delays every publish by the given duration. Used by tests to
    /// exercise publish deadlines in callers.
    pub fn set_publish_delay(&self, delay: Duration) {
        self.state.write().unwrap().publish_delay = Some(delay);
    }

    /// Returns the number of events published so far.
    pub fn published_count(&self) -> usize {
        self.state.read().unwrap().published.len()
    }

    /// Returns a copy of every event published so far, in publish order.
    pub fn published(&self) -> Vec<OrderCreated> {
        self.state.read().unwrap().published.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn publish(&self, event: &OrderCreated) -> Result<()> {
        let delay = self.state.read().unwrap().publish_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();

        if state.fail_on_publish {
            return Err(PublishError::Failed("channel unavailable".to_string()));
        }

        state.published.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{OrderId, RecordId};

    use super::*;

    fn sample_event() -> OrderCreated {
        OrderCreated {
            order_id: OrderId::new(),
            record_id: RecordId::new(),
            quantity: 2,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_records_event() {
        let notifier = InMemoryNotifier::new();
        let event = sample_event();

        notifier.publish(&event).await.unwrap();

        assert_eq!(notifier.published_count(), 1);
        assert_eq!(notifier.published()[0], event);
    }

    #[tokio::test]
    async fn fail_on_publish_returns_error_and_records_nothing() {
        let notifier = InMemoryNotifier::new();
        notifier.set_fail_on_publish(true);

        let result = notifier.publish(&sample_event()).await;
        assert!(matches!(result, Err(PublishError::Failed(_))));
        assert_eq!(notifier.published_count(), 0);

        notifier.set_fail_on_publish(false);
        notifier.publish(&sample_event()).await.unwrap();
        assert_eq!(notifier.published_count(), 1);
    }
}
