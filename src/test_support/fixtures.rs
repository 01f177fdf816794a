// Shared test fixtures.
// Compiled into the crate only during tests (cfg(test) in src/lib.rs).

use crate::adapters::auth::static_token_authenticator::StaticTokenAuthenticator;
use crate::adapters::in_memory::in_memory_remote_files::InMemoryRemoteFiles;
use crate::adapters::in_memory::recorded_alerts::RecordedAlerts;
use crate::application::dispatch::StoreDispatcher;
use crate::application::sync_cache::SyncCache;
use crate::shell::state::AppState;
use crate::core::tally::entry::StoreEntry;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

const STORE_ENTRY_JSON: &str = include_str!("fixtures/json/store_entry.json");
pub const PUSHUPS_DOCUMENT_JSON: &str = include_str!("fixtures/json/pushups_document_v0_1_0.json");

// JSON -> DTO (transport shape)
#[derive(Debug, Clone, Deserialize)]
pub struct StoreEntryDto {
    pub tag: String,
    pub count: f64,
    pub date: String,
}

pub struct StoreEntryBuilder {
    inner: StoreEntry,
}

impl Default for StoreEntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl StoreEntryBuilder {
    pub fn new() -> Self {
        let dto: StoreEntryDto = serde_json::from_str(STORE_ENTRY_JSON).unwrap();
        Self {
            inner: StoreEntry {
                tag: dto.tag,
                count: dto.count,
                date: parse_date(&dto.date),
            },
        }
    }

    pub fn tag(mut self, v: impl Into<String>) -> Self {
        self.inner.tag = v.into();
        self
    }

    pub fn count(mut self, v: f64) -> Self {
        self.inner.count = v;
        self
    }

    pub fn date(mut self, v: &str) -> Self {
        self.inner.date = parse_date(v);
        self
    }

    pub fn build(self) -> StoreEntry {
        self.inner
    }
}

pub fn parse_date(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn pushups_document() -> serde_json::Value {
    serde_json::from_str(PUSHUPS_DOCUMENT_JSON).unwrap()
}

/// A cache over a fresh in memory remote, returning both so tests can inspect the remote calls.
pub fn cache_with_remote() -> (SyncCache, Arc<InMemoryRemoteFiles>) {
    let remote = Arc::new(InMemoryRemoteFiles::new());
    (SyncCache::new(remote.clone()), remote)
}

/// App state whose dispatcher holds a cache over a fresh in memory remote.
/// The session is not wired, logging in does not swap the cache.
pub fn make_test_state() -> (AppState, Arc<InMemoryRemoteFiles>) {
    let (cache, remote) = cache_with_remote();
    let state = AppState {
        dispatcher: Arc::new(StoreDispatcher::new(cache)),
        authenticator: Arc::new(StaticTokenAuthenticator::new("Ada", Some("secret".into()))),
        alerts: Arc::new(RecordedAlerts::new()),
    };
    (state, remote)
}
