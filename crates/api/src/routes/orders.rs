//! Order placement endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::RecordId;
use domain::PlaceOrder;
use musicbrainz::ReleaseLookup;
use notifier::Notifier;
use store::{Order, Store};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub record_id: String,
    pub qty: u32,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Wire shape of an order, mirroring the entity.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub record_id: String,
    pub qty: u32,
    pub status: String,
    pub created: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            record_id: order.record_id.to_string(),
            qty: order.qty,
            status: order.status.to_string(),
            created: order.created,
        }
    }
}

/// POST /orders — place an order against a record.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, N, L>(
    State(state): State<Arc<AppState<S, N, L>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    S: Store,
    N: Notifier,
    L: ReleaseLookup,
{
    let record_id = parse_record_id(&req.record_id)?;

    let mut cmd = PlaceOrder::new(record_id, req.qty);
    if let Some(key) = req.idempotency_key {
        cmd = cmd.with_idempotency_key(key);
    }

    let order = state.orders.place_order(cmd).await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

pub(crate) fn parse_record_id(raw: &str) -> Result<RecordId, ApiError> {
    let uuid = uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid recordId: {e}")))?;
    Ok(RecordId::from_uuid(uuid))
}
