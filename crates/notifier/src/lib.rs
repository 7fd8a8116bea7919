//! Post-commit order event publishing.
//!
//! After the order workflow commits, it hands an [`OrderCreated`] fact to a
//! [`Notifier`]. Delivery is best-effort and at-least-once: a failed publish
//! is logged by the caller and never unwinds the committed order.

pub mod error;
pub mod event;
pub mod log;
pub mod memory;

use async_trait::async_trait;

pub use error::{PublishError, Result};
pub use event::{ORDER_CREATED_SUBJECT, OrderCreated};
pub use log::LogNotifier;
pub use memory::InMemoryNotifier;

/// Trait for order event publishers.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publishes an order-created event under [`ORDER_CREATED_SUBJECT`].
    ///
    /// Failures are advisory to the caller: the order the event describes
    /// is already durable, so implementations must never assume a failed
    /// publish undoes anything.
    async fn publish(&self, event: &OrderCreated) -> Result<()>;
}
