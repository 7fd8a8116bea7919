//! Fixture-backed lookup for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::{LookupError, Release, ReleaseLookup, Result};

#[derive(Default)]
struct StaticLookupState {
    releases: HashMap<String, Release>,
    fail_on_fetch: bool,
    calls: u64,
}

/// In-memory [`ReleaseLookup`] serving pre-registered releases.
///
/// Tests use the call counter to assert cache hits and the failure toggle
/// to exercise the metadata error path without a provider. An mbid with no
/// registered release answers 404 like the real endpoint.
#[derive(Clone, Default)]
pub struct StaticLookup {
    state: Arc<RwLock<StaticLookupState>>,
}

impl StaticLookup {
    /// Creates an empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a release under an mbid.
    pub fn insert(&self, mbid: impl Into<String>, release: Release) {
        self.state
            .write()
            .unwrap()
            .releases
            .insert(mbid.into(), release);
    }

    /// Configures the lookup to fail every fetch.
    pub fn set_fail_on_fetch(&self, fail: bool) {
        self.state.write().unwrap().fail_on_fetch = fail;
    }

    /// Returns how many fetches were attempted so far.
    pub fn call_count(&self) -> u64 {
        self.state.read().unwrap().calls
    }
}

#[async_trait]
impl ReleaseLookup for StaticLookup {
    async fn fetch_release(&self, mbid: &str) -> Result<Release> {
        let mut state = self.state.write().unwrap();
        state.calls += 1;

        if state.fail_on_fetch {
            return Err(LookupError::Status {
                status: 503,
                url: format!("static://{mbid}"),
            });
        }

        state
            .releases
            .get(mbid)
            .cloned()
            .ok_or_else(|| LookupError::Status {
                status: 404,
                url: format!("static://{mbid}"),
            })
    }
}
