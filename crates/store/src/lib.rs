//! Transactional storage for catalog records and orders.
//!
//! The [`Store`] trait exposes an explicit transaction handle so the order
//! workflow can verify stock, decrement it, and insert the matching order
//! atomically. Two backends implement it: [`PostgresStore`] (row locks via
//! `SELECT ... FOR UPDATE`) and [`InMemoryStore`] (optimistic generation
//! checks at commit), both surfacing contention as [`StoreError::Conflict`].

pub mod error;
pub mod filter;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{Money, OrderId, RecordId};
pub use error::{Result, StoreError};
pub use filter::RecordFilter;
pub use memory::InMemoryStore;
pub use model::{Order, OrderStatus, Record, RecordCategory, RecordFormat};
pub use postgres::PostgresStore;
pub use store::{Store, StoreExt};
