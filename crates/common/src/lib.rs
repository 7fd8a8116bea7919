//! Shared types for the record shop services.
//!
//! Identifier newtypes keep record and order IDs from being mixed up at
//! compile time; [`Money`] keeps prices in integer cents.

pub mod money;
pub mod track;
pub mod types;

pub use money::Money;
pub use track::Track;
pub use types::{OrderId, RecordId};
