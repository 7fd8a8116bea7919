use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use common::{Money, OrderId, RecordId};

use crate::{Order, Record, RecordFilter, Result, StoreError, store::Store};

const RECORD_COLUMNS: &str =
    "id, artist, album, price_cents, qty, format, category, created, last_modified, mbid, track_list";

const ORDER_COLUMNS: &str = "id, record_id, qty, status, created, idempotency_key";

/// PostgreSQL-backed store implementation.
///
/// Stock reads inside a transaction use `SELECT ... FOR UPDATE`, so the
/// read-decrement-write sequence holds a row lock until commit or rollback
/// and concurrent orders against the same record serialize at the database.
/// Unique violations, serialization failures, and deadlocks are mapped to
/// [`StoreError::Conflict`] so callers can retry.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and creates a store.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StoreError::Migration)
    }

    fn row_to_record(row: PgRow) -> Result<Record> {
        let format: String = row.try_get("format")?;
        let category: String = row.try_get("category")?;
        let track_list: Option<serde_json::Value> = row.try_get("track_list")?;

        Ok(Record {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            artist: row.try_get("artist")?,
            album: row.try_get("album")?,
            price: Money::from_cents(row.try_get::<i64, _>("price_cents")?),
            qty: row.try_get::<i32, _>("qty")? as u32,
            format: serde_json::from_value(serde_json::Value::String(format))?,
            category: serde_json::from_value(serde_json::Value::String(category))?,
            created: row.try_get("created")?,
            last_modified: row.try_get("last_modified")?,
            mbid: row.try_get("mbid")?,
            track_list: track_list.map(serde_json::from_value).transpose()?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            record_id: RecordId::from_uuid(row.try_get::<Uuid, _>("record_id")?),
            qty: row.try_get::<i32, _>("qty")? as u32,
            status: serde_json::from_value(serde_json::Value::String(status))?,
            created: row.try_get("created")?,
            idempotency_key: row.try_get("idempotency_key")?,
        })
    }

    fn map_db_error(e: sqlx::Error, context: &str) -> StoreError {
        // 23505 unique violation, 40001 serialization failure, 40P01 deadlock:
        // all transient contention the caller may retry.
        if let sqlx::Error::Database(ref db_err) = e
            && matches!(
                db_err.code().as_deref(),
                Some("23505") | Some("40001") | Some("40P01")
            )
        {
            tracing::debug!(
                code = db_err.code().as_deref(),
                context,
                "database conflict"
            );
            return StoreError::Conflict(format!("{context}: {}", db_err.message()));
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Txn = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Txn> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, txn: Self::Txn) -> Result<()> {
        txn.commit()
            .await
            .map_err(|e| Self::map_db_error(e, "commit"))
    }

    async fn rollback(&self, txn: Self::Txn) -> Result<()> {
        txn.rollback().await?;
        Ok(())
    }

    async fn record_for_update(
        &self,
        txn: &mut Self::Txn,
        id: RecordId,
    ) -> Result<Option<Record>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut **txn)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn insert_record(&self, txn: &mut Self::Txn, record: &Record) -> Result<()> {
        let track_list = record
            .track_list
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO records (id, artist, album, price_cents, qty, format, category, created, last_modified, mbid, track_list)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.artist)
        .bind(&record.album)
        .bind(record.price.cents())
        .bind(record.qty as i32)
        .bind(record.format.as_str())
        .bind(record.category.as_str())
        .bind(record.created)
        .bind(record.last_modified)
        .bind(record.mbid.as_deref())
        .bind(track_list)
        .execute(&mut **txn)
        .await
        .map_err(|e| Self::map_db_error(e, "insert record"))?;

        Ok(())
    }

    async fn put_record(&self, txn: &mut Self::Txn, record: &Record) -> Result<()> {
        let track_list = record
            .track_list
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            UPDATE records
            SET artist = $2, album = $3, price_cents = $4, qty = $5, format = $6,
                category = $7, last_modified = $8, mbid = $9, track_list = $10
            WHERE id = $1
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.artist)
        .bind(&record.album)
        .bind(record.price.cents())
        .bind(record.qty as i32)
        .bind(record.format.as_str())
        .bind(record.category.as_str())
        .bind(record.last_modified)
        .bind(record.mbid.as_deref())
        .bind(track_list)
        .execute(&mut **txn)
        .await
        .map_err(|e| Self::map_db_error(e, "update record"))?;

        Ok(())
    }

    async fn insert_order(&self, txn: &mut Self::Txn, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, record_id, qty, status, created, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.record_id.as_uuid())
        .bind(order.qty as i32)
        .bind(order.status.as_str())
        .bind(order.created)
        .bind(order.idempotency_key.as_deref())
        .execute(&mut **txn)
        .await
        .map_err(|e| Self::map_db_error(e, "insert order"))?;

        Ok(())
    }

    async fn order_by_idempotency_key(
        &self,
        txn: &mut Self::Txn,
        key: &str,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE idempotency_key = $1"
        ))
        .bind(key)
        .fetch_optional(&mut **txn)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn get_record(&self, id: RecordId) -> Result<Option<Record>> {
        let row = sqlx::query(&format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query; one parameter can back several ILIKE arms.
        if filter.q.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND (artist ILIKE ${param_count} OR album ILIKE ${param_count} OR category ILIKE ${param_count} OR format ILIKE ${param_count})"
            ));
        }
        if filter.artist.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND artist ILIKE ${param_count}"));
        }
        if filter.album.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND album ILIKE ${param_count}"));
        }
        if filter.format.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND format = ${param_count}"));
        }
        if filter.category.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category = ${param_count}"));
        }

        sql.push_str(" ORDER BY created ASC, id ASC");
        sql.push_str(&format!(
            " LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        ));

        let mut query = sqlx::query(&sql);

        if let Some(ref q) = filter.q {
            query = query.bind(format!("%{q}%"));
        }
        if let Some(ref artist) = filter.artist {
            query = query.bind(format!("%{artist}%"));
        }
        if let Some(ref album) = filter.album {
            query = query.bind(format!("%{album}%"));
        }
        if let Some(format) = filter.format {
            query = query.bind(format.as_str());
        }
        if let Some(category) = filter.category {
            query = query.bind(category.as_str());
        }
        query = query
            .bind(filter.page_size() as i64)
            .bind(filter.skip() as i64);

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn orders_for_record(&self, record_id: RecordId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE record_id = $1 ORDER BY created ASC, id ASC"
        ))
        .bind(record_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
