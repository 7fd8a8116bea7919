use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{Money, OrderId, RecordId, Track};

/// Physical or digital format of a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordFormat {
    Vinyl,
    #[serde(rename = "CD")]
    Cd,
    Cassette,
    Digital,
}

impl RecordFormat {
    /// Returns the canonical string form, as stored and served.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordFormat::Vinyl => "Vinyl",
            RecordFormat::Cd => "CD",
            RecordFormat::Cassette => "Cassette",
            RecordFormat::Digital => "Digital",
        }
    }
}

impl std::fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Musical category of a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordCategory {
    Rock,
    Jazz,
    #[serde(rename = "Hip-Hop")]
    HipHop,
    Classical,
    Pop,
    Alternative,
    Indie,
}

impl RecordCategory {
    /// Returns the canonical string form, as stored and served.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordCategory::Rock => "Rock",
            RecordCategory::Jazz => "Jazz",
            RecordCategory::HipHop => "Hip-Hop",
            RecordCategory::Classical => "Classical",
            RecordCategory::Pop => "Pop",
            RecordCategory::Alternative => "Alternative",
            RecordCategory::Indie => "Indie",
        }
    }
}

impl std::fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an order.
///
/// Order placement only ever writes [`OrderStatus::Pending`]; later
/// transitions belong to fulfillment, which lives outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Returns the canonical string form, as stored and served.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog record: one release the shop sells, with its stock on hand.
///
/// `qty` is the quantity available for ordering and must never go negative;
/// the order workflow is the only code path that decrements it, always inside
/// a store transaction. `last_modified` is refreshed on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub artist: String,
    pub album: String,
    pub price: Money,
    pub qty: u32,
    pub format: RecordFormat,
    pub category: RecordCategory,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,

    /// MusicBrainz release id, when the record is linked to provider metadata.
    pub mbid: Option<String>,

    /// Flattened track metadata resolved from the provider.
    pub track_list: Option<Vec<Track>>,
}

/// An order: a committed reservation of quantity against a record.
///
/// Created exclusively by the order workflow, in the same transaction as the
/// stock decrement it accounts for. Immutable afterwards except for `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub record_id: RecordId,
    pub qty: u32,
    pub status: OrderStatus,
    pub created: DateTime<Utc>,

    /// Client-supplied replay guard; unique across orders when present.
    pub idempotency_key: Option<String>,
}

impl Order {
    /// Builds a fresh pending order against a record.
    pub fn pending(record_id: RecordId, qty: u32, idempotency_key: Option<String>) -> Self {
        Self {
            id: OrderId::new(),
            record_id,
            qty,
            status: OrderStatus::Pending,
            created: Utc::now(),
            idempotency_key,
        }
    }
}
