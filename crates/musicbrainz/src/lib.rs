//! MusicBrainz release lookup for catalog metadata enrichment.
//!
//! When a catalog record carries an mbid, the catalog service resolves its
//! track list through a [`ReleaseLookup`]. [`MusicBrainzClient`] is the
//! HTTP-backed implementation; [`ReleaseCache`] keeps fetched releases for a
//! short TTL so repeated writes against the same release don't hammer the
//! provider; [`StaticLookup`] is the fixture-backed double for tests.

pub mod cache;
pub mod client;
pub mod error;
pub mod fixture;
pub mod release;

use async_trait::async_trait;

pub use cache::{DEFAULT_CACHE_TTL, ReleaseCache};
pub use client::MusicBrainzClient;
pub use error::{LookupError, Result};
pub use fixture::StaticLookup;
pub use release::{Media, MediaTrack, Recording, Release};

/// Trait for metadata providers that resolve a release by its mbid.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ReleaseLookup: Send + Sync {
    /// Fetches the release identified by `mbid`, including its recordings.
    async fn fetch_release(&self, mbid: &str) -> Result<Release>;
}
