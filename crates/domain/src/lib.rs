//! Business services for the record shop.
//!
//! [`OrderService`] is the order placement workflow: it verifies and
//! decrements stock and inserts the order in one store transaction, then
//! publishes an order-created event after commit. [`CatalogService`] covers
//! record creation, updates, and listing, with metadata enrichment through
//! a release lookup.

pub mod catalog;
pub mod error;
pub mod order;

pub use catalog::{CatalogService, NewRecord, RecordUpdate};
pub use error::{CatalogError, OrderError};
pub use order::{OrderService, OrderServiceConfig, PlaceOrder};
