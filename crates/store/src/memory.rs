use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::{OrderId, RecordId};

use crate::{Order, Record, RecordFilter, Result, StoreError, store::Store};

#[derive(Clone)]
struct VersionedRecord {
    record: Record,
    generation: u64,
}

#[derive(Default)]
struct State {
    records: HashMap<RecordId, VersionedRecord>,
    orders: Vec<Order>,
    fail_on_commit: bool,
    conflict_on_commit: bool,
    commit_delay: Option<Duration>,
    commit_attempts: u64,
}

/// In-memory store implementation for tests and local runs.
///
/// Transactions are optimistic: reads note the generation of every record
/// they observe, writes are staged in the transaction handle, and commit
/// re-validates all observed generations under one write lock before
/// applying anything. A generation that moved underneath the transaction
/// fails the commit with [`StoreError::Conflict`]; callers resolve that by
/// retrying the whole transaction. This mirrors the serialization failures
/// the PostgreSQL backend surfaces, without a database.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

/// Staged write-set of an in-flight [`InMemoryStore`] transaction.
///
/// Dropping the handle without committing discards it.
#[derive(Default)]
pub struct MemoryTxn {
    observed: HashMap<RecordId, Option<u64>>,
    staged_records: Vec<StagedWrite>,
    staged_orders: Vec<Order>,
}

enum StagedWrite {
    Insert(Record),
    Update(Record),
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// When set, every commit fails with a non-retryable storage error.
    /// Used by tests to exercise the abort paths.
    pub async fn set_fail_on_commit(&self, fail: bool) {
        self.state.write().await.fail_on_commit = fail;
    }

    /// When set, every commit fails with a retryable [`StoreError::Conflict`].
    /// Used by tests to exercise conflict-retry handling in callers.
    pub async fn set_conflict_on_commit(&self, conflict: bool) {
        self.state.write().await.conflict_on_commit = conflict;
    }

    /// Delays every commit by the given duration before it applies.
    /// Used by tests to exercise commit deadlines.
    pub async fn set_commit_delay(&self, delay: Duration) {
        self.state.write().await.commit_delay = Some(delay);
    }

    /// Returns how many commits have been attempted, successful or not.
    pub async fn commit_attempts(&self) -> u64 {
        self.state.read().await.commit_attempts
    }

    /// Clears all records and orders.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.records.clear();
        state.orders.clear();
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<Self::Txn> {
        Ok(MemoryTxn::default())
    }

    async fn commit(&self, txn: Self::Txn) -> Result<()> {
        // Sleep outside the lock so a cancelled slow commit leaves nothing
        // held and nothing applied.
        let delay = self.state.read().await.commit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        state.commit_attempts += 1;

        if state.fail_on_commit {
            return Err(StoreError::Unavailable(
                "injected commit failure".to_string(),
            ));
        }

        if state.conflict_on_commit {
            return Err(StoreError::Conflict(
                "injected transaction conflict".to_string(),
            ));
        }

        // Validate every observed generation before applying anything, so a
        // conflicting commit leaves the store untouched.
        for (id, observed) in &txn.observed {
            let actual = state.records.get(id).map(|v| v.generation);
            if actual != *observed {
                return Err(StoreError::Conflict(format!(
                    "record {id} was modified by a concurrent transaction"
                )));
            }
        }

        for order in &txn.staged_orders {
            if let Some(ref key) = order.idempotency_key
                && state
                    .orders
                    .iter()
                    .any(|o| o.idempotency_key.as_deref() == Some(key.as_str()))
            {
                return Err(StoreError::Conflict(format!(
                    "an order with idempotency key {key:?} already exists"
                )));
            }
        }

        for write in txn.staged_records {
            match write {
                StagedWrite::Insert(record) => {
                    state.records.insert(
                        record.id,
                        VersionedRecord {
                            record,
                            generation: 1,
                        },
                    );
                }
                StagedWrite::Update(record) => {
                    let generation = state
                        .records
                        .get(&record.id)
                        .map(|v| v.generation)
                        .unwrap_or(0)
                        + 1;
                    state.records.insert(
                        record.id,
                        VersionedRecord { record, generation },
                    );
                }
            }
        }
        state.orders.extend(txn.staged_orders);

        Ok(())
    }

    async fn rollback(&self, txn: Self::Txn) -> Result<()> {
        drop(txn);
        Ok(())
    }

    async fn record_for_update(
        &self,
        txn: &mut Self::Txn,
        id: RecordId,
    ) -> Result<Option<Record>> {
        let state = self.state.read().await;
        let found = state.records.get(&id);
        txn.observed.insert(id, found.map(|v| v.generation));
        Ok(found.map(|v| v.record.clone()))
    }

    async fn insert_record(&self, txn: &mut Self::Txn, record: &Record) -> Result<()> {
        // A fresh insert expects the id to be absent at commit time.
        txn.observed.entry(record.id).or_insert(None);
        txn.staged_records.push(StagedWrite::Insert(record.clone()));
        Ok(())
    }

    async fn put_record(&self, txn: &mut Self::Txn, record: &Record) -> Result<()> {
        if !txn.observed.contains_key(&record.id) {
            let state = self.state.read().await;
            let generation = state.records.get(&record.id).map(|v| v.generation);
            txn.observed.insert(record.id, generation);
        }
        txn.staged_records.push(StagedWrite::Update(record.clone()));
        Ok(())
    }

    async fn insert_order(&self, txn: &mut Self::Txn, order: &Order) -> Result<()> {
        txn.staged_orders.push(order.clone());
        Ok(())
    }

    async fn order_by_idempotency_key(
        &self,
        _txn: &mut Self::Txn,
        key: &str,
    ) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn get_record(&self, id: RecordId) -> Result<Option<Record>> {
        let state = self.state.read().await;
        Ok(state.records.get(&id).map(|v| v.record.clone()))
    }

    async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
        let state = self.state.read().await;
        let mut records: Vec<_> = state
            .records
            .values()
            .filter(|v| filter.matches(&v.record))
            .map(|v| v.record.clone())
            .collect();

        records.sort_by(|a, b| {
            a.created
                .cmp(&b.created)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });

        Ok(records
            .into_iter()
            .skip(filter.skip() as usize)
            .take(filter.page_size() as usize)
            .collect())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn orders_for_record(&self, record_id: RecordId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .filter(|o| o.record_id == record_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created.cmp(&b.created));
        Ok(orders)
    }
}
