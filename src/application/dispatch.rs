// Dispatch surface over the active sync cache.
//
// Purpose
// - Name every mutation of the session's tally data as a StoreAction.
// - Hold exactly one active SyncCache and swap it wholesale on NewStore.
//
// Boundaries
// - Inbound adapters translate their wire shapes into StoreAction and call `dispatch`.
// - Reads go through `store()`, which hands out the current cache.

use crate::application::sync_cache::SyncCache;
use crate::core::ports::RemoteFileRef;
use crate::core::tally::entry::StoreEntry;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

#[derive(Debug)]
pub enum StoreAction {
    Write(StoreEntry),
    Delete(StoreEntry),
    Update { old: StoreEntry, new: StoreEntry },
    Clear,
    AddFiles(Vec<RemoteFileRef>),
    NewStore(SyncCache),
}

/// Applies `action` to `store` and returns the cache that is active afterwards.
pub fn reduce(store: SyncCache, action: StoreAction) -> SyncCache {
    match action {
        StoreAction::Write(entry) => store.write(entry),
        StoreAction::Delete(entry) => store.delete(&entry),
        StoreAction::Update { old, new } => store.update(&old, new),
        StoreAction::Clear => store.clear(),
        StoreAction::AddFiles(files) => store.add_files(files),
        StoreAction::NewStore(next) => {
            info!("switching to a new tally cache");
            return next;
        }
    }
    store
}

#[derive(Debug)]
pub struct StoreDispatcher {
    current: RwLock<SyncCache>,
}

impl StoreDispatcher {
    pub fn new(initial: SyncCache) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    pub fn dispatch(&self, action: StoreAction) {
        debug!(?action, "dispatching store action");
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = reduce(current.clone(), action);
    }

    pub fn store(&self) -> SyncCache {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
