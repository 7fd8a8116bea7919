//! The order placement workflow.
//!
//! Placing an order reads the record's stock under a transaction, validates
//! it, writes the decrement and the new order row through that transaction,
//! and commits. Only a committed order is notified downstream; a notify
//! failure never unwinds the order. Transaction conflicts are retried with
//! exponential backoff a bounded number of times before surfacing as
//! [`OrderError::TransactionFailed`].

use std::time::{Duration, Instant};

use chrono::Utc;

use common::RecordId;
use notifier::{Notifier, OrderCreated, PublishError};
use store::{Order, Store};

use crate::error::OrderError;

/// Request to place an order against a record.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub record_id: RecordId,
    pub qty: u32,

    /// Optional replay guard. Two requests carrying the same key place at
    /// most one order; the second receives the first one's result.
    pub idempotency_key: Option<String>,
}

impl PlaceOrder {
    /// Creates a place-order request without an idempotency key.
    pub fn new(record_id: RecordId, qty: u32) -> Self {
        Self {
            record_id,
            qty,
            idempotency_key: None,
        }
    }

    /// Attaches an idempotency key to the request.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Tuning knobs for the workflow.
#[derive(Debug, Clone)]
pub struct OrderServiceConfig {
    /// How many times a conflicted transaction is retried before the
    /// workflow gives up.
    pub max_conflict_retries: u32,

    /// Base delay between conflict retries; doubles per attempt.
    pub retry_backoff: Duration,

    /// Upper bound on the commit step.
    pub commit_timeout: Duration,

    /// Upper bound on the post-commit notify step. Expiry never affects
    /// the committed order.
    pub notify_timeout: Duration,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            retry_backoff: Duration::from_millis(10),
            commit_timeout: Duration::from_secs(5),
            notify_timeout: Duration::from_secs(1),
        }
    }
}

/// Outcome of one transaction attempt.
enum Attempt {
    /// A fresh order was staged and committed.
    Committed(Order),
    /// The idempotency key matched an existing order; nothing was written.
    Replayed(Order),
}

/// Service placing orders against catalog records.
///
/// Every exit path releases the transaction exactly once: a successful run
/// commits it, every failure rolls it back. The stock decrement and the
/// order insert share one transaction, so either both land or neither does.
pub struct OrderService<S: Store, N: Notifier> {
    store: S,
    notifier: N,
    config: OrderServiceConfig,
}

impl<S: Store, N: Notifier> OrderService<S, N> {
    /// Creates a service with default configuration.
    pub fn new(store: S, notifier: N) -> Self {
        Self::with_config(store, notifier, OrderServiceConfig::default())
    }

    /// Creates a service with explicit configuration.
    pub fn with_config(store: S, notifier: N, config: OrderServiceConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Places an order: verifies stock, decrements it, and inserts the
    /// order atomically, then notifies downstream consumers.
    ///
    /// Returns the committed order. Business rejections (unknown record,
    /// insufficient stock, zero quantity) surface as their own variants and
    /// are never retried; transaction conflicts are retried internally.
    #[tracing::instrument(skip(self, cmd), fields(record_id = %cmd.record_id, qty = cmd.qty))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, OrderError> {
        if cmd.qty == 0 {
            metrics::counter!("orders_rejected_total").increment(1);
            return Err(OrderError::InvalidQuantity(cmd.qty));
        }

        let started = Instant::now();
        let mut retries = 0u32;

        let attempt = loop {
            match self.try_place(&cmd).await {
                Ok(attempt) => break attempt,
                Err(OrderError::Store(e)) if e.is_conflict() => {
                    if retries >= self.config.max_conflict_retries {
                        metrics::counter!("orders_failed_total").increment(1);
                        return Err(OrderError::TransactionFailed(format!(
                            "conflict retries exhausted: {e}"
                        )));
                    }
                    // Exponential backoff, capped so the delay stays bounded
                    // for generous retry budgets.
                    let backoff = self.config.retry_backoff * 2u32.pow(retries.min(6));
                    retries += 1;
                    metrics::counter!("order_conflict_retries_total").increment(1);
                    tracing::debug!(retries, ?backoff, "transaction conflict, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    if e.is_rejection() {
                        metrics::counter!("orders_rejected_total").increment(1);
                    } else {
                        metrics::counter!("orders_failed_total").increment(1);
                    }
                    return Err(e);
                }
            }
        };

        let order = match attempt {
            Attempt::Replayed(order) => {
                // The original run already decremented stock and notified.
                tracing::info!(order_id = %order.id, "idempotency key replay, returning existing order");
                metrics::counter!("orders_replayed_total").increment(1);
                return Ok(order);
            }
            Attempt::Committed(order) => order,
        };

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        self.notify(&order).await;

        tracing::info!(order_id = %order.id, "order placed");
        Ok(order)
    }

    /// Runs one full transaction attempt: begin, stage, commit or roll back.
    async fn try_place(&self, cmd: &PlaceOrder) -> Result<Attempt, OrderError> {
        let mut txn = self.store.begin().await?;

        let staged = match self.stage(&mut txn, cmd).await {
            Ok(staged) => staged,
            Err(e) => {
                if let Err(rollback_err) = self.store.rollback(txn).await {
                    tracing::warn!(error = %rollback_err, "rollback failed after aborted placement");
                }
                return Err(e);
            }
        };

        match staged {
            Attempt::Replayed(order) => {
                // Read-only attempt, nothing to commit.
                self.store.rollback(txn).await?;
                Ok(Attempt::Replayed(order))
            }
            Attempt::Committed(order) => {
                match tokio::time::timeout(self.config.commit_timeout, self.store.commit(txn))
                    .await
                {
                    Ok(Ok(())) => Ok(Attempt::Committed(order)),
                    Ok(Err(e)) => Err(e.into()),
                    Err(_) => Err(OrderError::TransactionFailed(format!(
                        "commit did not complete within {:?}",
                        self.config.commit_timeout
                    ))),
                }
            }
        }
    }

    /// Stages the writes of one attempt through the open transaction.
    async fn stage(&self, txn: &mut S::Txn, cmd: &PlaceOrder) -> Result<Attempt, OrderError> {
        if let Some(ref key) = cmd.idempotency_key
            && let Some(existing) = self.store.order_by_idempotency_key(txn, key).await?
        {
            return Ok(Attempt::Replayed(existing));
        }

        let mut record = self
            .store
            .record_for_update(txn, cmd.record_id)
            .await?
            .ok_or(OrderError::RecordNotFound(cmd.record_id))?;

        if record.qty < cmd.qty {
            return Err(OrderError::InsufficientStock {
                available: record.qty,
                requested: cmd.qty,
            });
        }

        record.qty -= cmd.qty;
        record.last_modified = Utc::now();
        self.store.put_record(txn, &record).await?;

        let order = Order::pending(cmd.record_id, cmd.qty, cmd.idempotency_key.clone());
        self.store.insert_order(txn, &order).await?;

        Ok(Attempt::Committed(order))
    }

    /// Publishes the order-created event, bounded by the notify timeout.
    ///
    /// The order is already durable at this point; failures are logged and
    /// counted, never propagated.
    async fn notify(&self, order: &Order) {
        let event = OrderCreated {
            order_id: order.id,
            record_id: order.record_id,
            quantity: order.qty,
            created_at: order.created,
        };

        let published =
            match tokio::time::timeout(self.config.notify_timeout, self.notifier.publish(&event))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(PublishError::Timeout(self.config.notify_timeout)),
            };

        if let Err(e) = published {
            metrics::counter!("order_notify_failures_total").increment(1);
            tracing::warn!(order_id = %order.id, error = %e, "order committed but notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use common::Money;
    use notifier::InMemoryNotifier;
    use store::{
        InMemoryStore, OrderStatus, Record, RecordCategory, RecordFormat, StoreExt,
    };

    fn test_record(qty: u32) -> Record {
        Record {
            id: RecordId::new(),
            artist: "Miles Davis".to_string(),
            album: "Kind of Blue".to_string(),
            price: Money::from_cents(2599),
            qty,
            format: RecordFormat::Vinyl,
            category: RecordCategory::Jazz,
            created: Utc::now(),
            last_modified: Utc::now(),
            mbid: None,
            track_list: None,
        }
    }

    fn service(store: &InMemoryStore, notifier: &InMemoryNotifier) -> OrderService<InMemoryStore, InMemoryNotifier> {
        OrderService::new(store.clone(), notifier.clone())
    }

    #[tokio::test]
    async fn placing_an_order_decrements_stock() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        let record = test_record(10);
        store.create_record(&record).await.unwrap();

        let order = service(&store, &notifier)
            .place_order(PlaceOrder::new(record.id, 4))
            .await
            .unwrap();

        assert_eq!(order.record_id, record.id);
        assert_eq!(order.qty, 4);
        assert_eq!(order.status, OrderStatus::Pending);

        let stored = store.get_record(record.id).await.unwrap().unwrap();
        assert_eq!(stored.qty, 6);
        assert!(stored.last_modified >= record.last_modified);
    }

    #[tokio::test]
    async fn insufficient_stock_rejects_and_leaves_stock_untouched() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        let record = test_record(3);
        store.create_record(&record).await.unwrap();

        let err = service(&store, &notifier)
            .place_order(PlaceOrder::new(record.id, 5))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::InsufficientStock {
                available: 3,
                requested: 5
            }
        ));
        assert!(err.is_rejection());

        assert_eq!(store.get_record(record.id).await.unwrap().unwrap().qty, 3);
        assert_eq!(store.order_count().await, 0);
        assert_eq!(notifier.published_count(), 0);
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();

        let err = service(&store, &notifier)
            .place_order(PlaceOrder::new(RecordId::new(), 1))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::RecordNotFound(_)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected_before_touching_the_store() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        let record = test_record(5);
        store.create_record(&record).await.unwrap();

        let err = service(&store, &notifier)
            .place_order(PlaceOrder::new(record.id, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::InvalidQuantity(0)));
    }

    #[tokio::test]
    async fn commit_failure_leaves_no_partial_state() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        let record = test_record(5);
        store.create_record(&record).await.unwrap();
        store.set_fail_on_commit(true).await;

        let err = service(&store, &notifier)
            .place_order(PlaceOrder::new(record.id, 2))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Store(_)));
        assert_eq!(store.get_record(record.id).await.unwrap().unwrap().qty, 5);
        assert_eq!(store.order_count().await, 0);
        assert_eq!(notifier.published_count(), 0);
    }

    #[tokio::test]
    async fn exhausted_conflict_retries_surface_as_transaction_failed() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        let record = test_record(10);
        store.create_record(&record).await.unwrap();
        store.set_conflict_on_commit(true).await;

        let svc = OrderService::with_config(
            store.clone(),
            notifier.clone(),
            OrderServiceConfig {
                max_conflict_retries: 2,
                retry_backoff: Duration::from_millis(1),
                ..OrderServiceConfig::default()
            },
        );

        let err = svc
            .place_order(PlaceOrder::new(record.id, 2))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::TransactionFailed(_)));
        assert!(!err.is_rejection());
        // One initial attempt plus the configured retries, then give up.
        assert_eq!(store.commit_attempts().await, 3);
        assert_eq!(store.get_record(record.id).await.unwrap().unwrap().qty, 10);
        assert_eq!(store.order_count().await, 0);
        assert_eq!(notifier.published_count(), 0);
    }

    #[tokio::test]
    async fn slow_commit_times_out_without_partial_state() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        let record = test_record(5);
        store.create_record(&record).await.unwrap();
        store.set_commit_delay(Duration::from_millis(200)).await;

        let svc = OrderService::with_config(
            store.clone(),
            notifier.clone(),
            OrderServiceConfig {
                commit_timeout: Duration::from_millis(10),
                ..OrderServiceConfig::default()
            },
        );

        let err = svc
            .place_order(PlaceOrder::new(record.id, 2))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::TransactionFailed(_)));
        assert_eq!(store.get_record(record.id).await.unwrap().unwrap().qty, 5);
        assert_eq!(store.order_count().await, 0);
        assert_eq!(notifier.published_count(), 0);
    }

    #[tokio::test]
    async fn slow_notifier_times_out_but_the_order_stands() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        notifier.set_publish_delay(Duration::from_millis(200));
        let record = test_record(5);
        store.create_record(&record).await.unwrap();

        let svc = OrderService::with_config(
            store.clone(),
            notifier.clone(),
            OrderServiceConfig {
                notify_timeout: Duration::from_millis(10),
                ..OrderServiceConfig::default()
            },
        );

        let order = svc
            .place_order(PlaceOrder::new(record.id, 2))
            .await
            .unwrap();

        assert_eq!(order.qty, 2);
        assert_eq!(store.get_record(record.id).await.unwrap().unwrap().qty, 3);
        assert_eq!(store.order_count().await, 1);
        // The publish was abandoned at the deadline; nothing was delivered.
        assert_eq!(notifier.published_count(), 0);
    }

    #[tokio::test]
    async fn notify_failure_does_not_fail_the_committed_order() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        notifier.set_fail_on_publish(true);
        let record = test_record(5);
        store.create_record(&record).await.unwrap();

        let order = service(&store, &notifier)
            .place_order(PlaceOrder::new(record.id, 2))
            .await
            .unwrap();

        assert_eq!(order.qty, 2);
        assert_eq!(store.get_record(record.id).await.unwrap().unwrap().qty, 3);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(notifier.published_count(), 0);
    }

    #[tokio::test]
    async fn successful_order_is_published_with_committed_values() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        let record = test_record(5);
        store.create_record(&record).await.unwrap();

        let order = service(&store, &notifier)
            .place_order(PlaceOrder::new(record.id, 2))
            .await
            .unwrap();

        let published = notifier.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].order_id, order.id);
        assert_eq!(published[0].record_id, record.id);
        assert_eq!(published[0].quantity, 2);
        assert_eq!(published[0].created_at, order.created);
    }

    #[tokio::test]
    async fn idempotency_key_replays_the_original_order() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        let record = test_record(10);
        store.create_record(&record).await.unwrap();
        let svc = service(&store, &notifier);

        let first = svc
            .place_order(PlaceOrder::new(record.id, 3).with_idempotency_key("req-1"))
            .await
            .unwrap();
        let second = svc
            .place_order(PlaceOrder::new(record.id, 3).with_idempotency_key("req-1"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        // One decrement, one order, one notification.
        assert_eq!(store.get_record(record.id).await.unwrap().unwrap().qty, 7);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(notifier.published_count(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_place_distinct_orders() {
        let store = InMemoryStore::new();
        let notifier = InMemoryNotifier::new();
        let record = test_record(10);
        store.create_record(&record).await.unwrap();
        let svc = service(&store, &notifier);

        let first = svc
            .place_order(PlaceOrder::new(record.id, 3).with_idempotency_key("req-1"))
            .await
            .unwrap();
        let second = svc
            .place_order(PlaceOrder::new(record.id, 3).with_idempotency_key("req-2"))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.get_record(record.id).await.unwrap().unwrap().qty, 4);
    }
}
