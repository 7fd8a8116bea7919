//! Catalog record endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{Money, Track};
use domain::{NewRecord, RecordUpdate};
use musicbrainz::ReleaseLookup;
use notifier::Notifier;
use store::{Record, RecordCategory, RecordFilter, RecordFormat, Store};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::orders::parse_record_id;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    pub artist: String,
    pub album: String,
    pub price_cents: i64,
    pub qty: u32,
    pub format: RecordFormat,
    pub category: RecordCategory,
    #[serde(default)]
    pub mbid: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub price_cents: Option<i64>,
    pub qty: Option<u32>,
    pub format: Option<RecordFormat>,
    pub category: Option<RecordCategory>,
    pub mbid: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListRecordsQuery {
    pub q: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub format: Option<RecordFormat>,
    pub category: Option<RecordCategory>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Wire shape of a catalog record.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub artist: String,
    pub album: String,
    pub price_cents: i64,
    pub qty: u32,
    pub format: RecordFormat,
    pub category: RecordCategory,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mbid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_list: Option<Vec<Track>>,
}

impl From<Record> for RecordResponse {
    fn from(record: Record) -> Self {
        Self {
            id: record.id.to_string(),
            artist: record.artist,
            album: record.album,
            price_cents: record.price.cents(),
            qty: record.qty,
            format: record.format,
            category: record.category,
            created: record.created,
            last_modified: record.last_modified,
            mbid: record.mbid,
            track_list: record.track_list,
        }
    }
}

/// POST /records — create a catalog record.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, N, L>(
    State(state): State<Arc<AppState<S, N, L>>>,
    Json(req): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError>
where
    S: Store,
    N: Notifier,
    L: ReleaseLookup,
{
    let record = state
        .catalog
        .create_record(NewRecord {
            artist: req.artist,
            album: req.album,
            price: Money::from_cents(req.price_cents),
            qty: req.qty,
            format: req.format,
            category: req.category,
            mbid: req.mbid,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RecordResponse::from(record))))
}

/// PUT /records/:id — apply a partial update to a record.
#[tracing::instrument(skip(state, req))]
pub async fn update<S, N, L>(
    State(state): State<Arc<AppState<S, N, L>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRecordRequest>,
) -> Result<Json<RecordResponse>, ApiError>
where
    S: Store,
    N: Notifier,
    L: ReleaseLookup,
{
    let record_id = parse_record_id(&id)?;

    let record = state
        .catalog
        .update_record(
            record_id,
            RecordUpdate {
                artist: req.artist,
                album: req.album,
                price: req.price_cents.map(Money::from_cents),
                qty: req.qty,
                format: req.format,
                category: req.category,
                mbid: req.mbid,
            },
        )
        .await?;

    Ok(Json(RecordResponse::from(record)))
}

/// GET /records — list records with optional filters and pagination.
#[tracing::instrument(skip(state))]
pub async fn list<S, N, L>(
    State(state): State<Arc<AppState<S, N, L>>>,
    Query(query): Query<ListRecordsQuery>,
) -> Result<Json<Vec<RecordResponse>>, ApiError>
where
    S: Store,
    N: Notifier,
    L: ReleaseLookup,
{
    let filter = RecordFilter {
        q: query.q,
        artist: query.artist,
        album: query.album,
        format: query.format,
        category: query.category,
        page: query.page,
        limit: query.limit,
    };

    let records = state.catalog.find_records(&filter).await?;

    Ok(Json(
        records.into_iter().map(RecordResponse::from).collect(),
    ))
}
