use async_trait::async_trait;

use common::{OrderId, RecordId};

use crate::{Order, Record, RecordFilter, Result};

/// Core trait for store implementations.
///
/// A store persists catalog records and orders behind an explicit
/// transaction handle, so the order workflow can read a record's stock,
/// decrement it, and insert the matching order atomically. Both writes go
/// through the same [`Store::Txn`] and either commit together or not at all.
///
/// Implementations must guarantee per-record serializability of the
/// read-decrement-write sequence: two committed decrements against the same
/// record must never together drive its quantity negative. How that is
/// achieved is up to the backend; a transaction that loses the race fails
/// with a conflict error, which callers may resolve by retrying the whole
/// transaction.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Transaction handle. Dropping it without committing rolls back.
    type Txn: Send;

    /// Opens a new transaction.
    async fn begin(&self) -> Result<Self::Txn>;

    /// Commits the transaction, making all its writes durable and visible.
    ///
    /// A conflict with a concurrently committed transaction surfaces as
    /// `StoreError::Conflict`; the transaction is rolled back in that case.
    async fn commit(&self, txn: Self::Txn) -> Result<()>;

    /// Rolls the transaction back, discarding all its writes.
    async fn rollback(&self, txn: Self::Txn) -> Result<()>;

    /// Reads a record through the transaction, intending to update it.
    ///
    /// The returned state is protected against concurrent modification
    /// until the transaction commits or rolls back.
    async fn record_for_update(&self, txn: &mut Self::Txn, id: RecordId)
    -> Result<Option<Record>>;

    /// Inserts a new record through the transaction.
    async fn insert_record(&self, txn: &mut Self::Txn, record: &Record) -> Result<()>;

    /// Writes an updated record through the transaction.
    async fn put_record(&self, txn: &mut Self::Txn, record: &Record) -> Result<()>;

    /// Inserts a new order through the transaction.
    ///
    /// The caller generates the order's identity; after a successful commit
    /// the row is visible to subsequent reads.
    async fn insert_order(&self, txn: &mut Self::Txn, order: &Order) -> Result<()>;

    /// Looks up an order by its idempotency key through the transaction.
    async fn order_by_idempotency_key(
        &self,
        txn: &mut Self::Txn,
        key: &str,
    ) -> Result<Option<Order>>;

    /// Reads a record outside any transaction.
    async fn get_record(&self, id: RecordId) -> Result<Option<Record>>;

    /// Lists records matching a filter, paginated, in creation order.
    async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<Record>>;

    /// Reads an order outside any transaction.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders placed against a record, in creation order.
    async fn orders_for_record(&self, record_id: RecordId) -> Result<Vec<Order>>;
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait StoreExt: Store {
    /// Inserts a record in a transaction of its own.
    async fn create_record(&self, record: &Record) -> Result<()> {
        let mut txn = self.begin().await?;
        if let Err(e) = self.insert_record(&mut txn, record).await {
            let _ = self.rollback(txn).await;
            return Err(e);
        }
        self.commit(txn).await
    }

    /// Checks whether a record exists.
    async fn record_exists(&self, id: RecordId) -> Result<bool> {
        Ok(self.get_record(id).await?.is_some())
    }
}

// Blanket implementation for all Store implementations
impl<T: Store + ?Sized> StoreExt for T {}
