use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{OrderId, RecordId};

/// Subject under which order-created events are published.
pub const ORDER_CREATED_SUBJECT: &str = "order.created";

/// Fact published after an order commits.
///
/// The serialized field names are part of the wire contract with downstream
/// consumers; they mirror the order entity as served over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub record_id: RecordId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}
