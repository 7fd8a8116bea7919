//! Catalog record management.
//!
//! Create and update run through the same store transactional path the
//! order workflow uses, so no record row is ever mutated outside a
//! transaction. Records carrying an mbid get their track list resolved
//! through the release lookup, with a short-lived cache in front.

use std::time::Duration;

use chrono::Utc;

use common::{Money, RecordId, Track};
use musicbrainz::{ReleaseCache, ReleaseLookup};
use store::{Record, RecordCategory, RecordFilter, RecordFormat, Store, StoreExt};

use crate::error::CatalogError;

/// Request to create a catalog record.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub artist: String,
    pub album: String,
    pub price: Money,
    pub qty: u32,
    pub format: RecordFormat,
    pub category: RecordCategory,
    pub mbid: Option<String>,
}

/// Partial update of a catalog record. Absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub price: Option<Money>,
    pub qty: Option<u32>,
    pub format: Option<RecordFormat>,
    pub category: Option<RecordCategory>,
    pub mbid: Option<String>,
}

/// Service managing catalog records.
pub struct CatalogService<S: Store, L: ReleaseLookup> {
    store: S,
    lookup: L,
    cache: ReleaseCache,
}

impl<S: Store, L: ReleaseLookup> CatalogService<S, L> {
    /// Creates a service with the default metadata cache TTL.
    pub fn new(store: S, lookup: L) -> Self {
        Self {
            store,
            lookup,
            cache: ReleaseCache::new(),
        }
    }

    /// Creates a service with an explicit metadata cache TTL.
    pub fn with_cache_ttl(store: S, lookup: L, ttl: Duration) -> Self {
        Self {
            store,
            lookup,
            cache: ReleaseCache::with_ttl(ttl),
        }
    }

    /// Creates a record, resolving its track list when an mbid is supplied.
    ///
    /// A failed metadata lookup fails the whole create; no record is
    /// written in that case.
    #[tracing::instrument(skip(self, new), fields(artist = %new.artist, album = %new.album))]
    pub async fn create_record(&self, new: NewRecord) -> Result<Record, CatalogError> {
        validate_name("artist", &new.artist)?;
        validate_name("album", &new.album)?;
        validate_price(new.price)?;

        let track_list = match new.mbid {
            Some(ref mbid) => Some(self.resolve_track_list(mbid).await?),
            None => None,
        };

        let now = Utc::now();
        let record = Record {
            id: RecordId::new(),
            artist: new.artist,
            album: new.album,
            price: new.price,
            qty: new.qty,
            format: new.format,
            category: new.category,
            created: now,
            last_modified: now,
            mbid: new.mbid,
            track_list,
        };

        self.store.create_record(&record).await?;

        metrics::counter!("records_created_total").increment(1);
        tracing::info!(record_id = %record.id, "record created");
        Ok(record)
    }

    /// Applies a partial update to a record.
    ///
    /// A changed mbid re-resolves the track list; `last_modified` is
    /// refreshed on every update.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_record(
        &self,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<Record, CatalogError> {
        let mut txn = self.store.begin().await?;

        match self.apply_update(&mut txn, id, update).await {
            Ok(record) => {
                self.store.commit(txn).await?;
                metrics::counter!("records_updated_total").increment(1);
                Ok(record)
            }
            Err(e) => {
                if let Err(rollback_err) = self.store.rollback(txn).await {
                    tracing::warn!(error = %rollback_err, "rollback failed after aborted update");
                }
                Err(e)
            }
        }
    }

    /// Lists records matching a filter.
    pub async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<Record>, CatalogError> {
        Ok(self.store.find_records(filter).await?)
    }

    async fn apply_update(
        &self,
        txn: &mut S::Txn,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<Record, CatalogError> {
        let mut record = self
            .store
            .record_for_update(txn, id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        if let Some(artist) = update.artist {
            validate_name("artist", &artist)?;
            record.artist = artist;
        }
        if let Some(album) = update.album {
            validate_name("album", &album)?;
            record.album = album;
        }
        if let Some(price) = update.price {
            validate_price(price)?;
            record.price = price;
        }
        if let Some(qty) = update.qty {
            record.qty = qty;
        }
        if let Some(format) = update.format {
            record.format = format;
        }
        if let Some(category) = update.category {
            record.category = category;
        }
        if let Some(mbid) = update.mbid {
            if record.mbid.as_deref() != Some(mbid.as_str()) {
                record.track_list = Some(self.resolve_track_list(&mbid).await?);
            }
            record.mbid = Some(mbid);
        }

        record.last_modified = Utc::now();
        self.store.put_record(txn, &record).await?;

        Ok(record)
    }

    /// Resolves a release's track list, consulting the cache first.
    async fn resolve_track_list(&self, mbid: &str) -> Result<Vec<Track>, CatalogError> {
        if let Some(release) = self.cache.get(mbid).await {
            metrics::counter!("metadata_cache_hits_total").increment(1);
            return Ok(release.track_list());
        }

        let release = self.lookup.fetch_release(mbid).await?;
        self.cache.put(mbid, release.clone()).await;

        metrics::counter!("metadata_lookups_total").increment(1);
        Ok(release.track_list())
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_price(price: Money) -> Result<(), CatalogError> {
    if price.is_negative() {
        return Err(CatalogError::Invalid(format!(
            "price must not be negative, got {price}"
        )));
    }
    Ok(())
}
