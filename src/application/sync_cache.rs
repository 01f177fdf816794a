// Sync cache between the in-memory entry store and the per-tag remote documents.
//
// Purpose
// - Serve reads synchronously from the entry store.
// - Load the remote listing once per session and each remote document at most once.
// - Write every local mutation through to the tag's remote document.
//
// Responsibilities
// - Deduplicate concurrent fetches: one shared future per document id, kept after it
//   resolves so later requests reuse it instead of fetching again.
// - Reserve a placeholder header before creating a new document so concurrent writes
//   to a brand new tag never create two documents.
// - Track fire-and-forget persist tasks so callers can await them with `settle`.
//
// Concurrency
// - All state sits behind one mutex that is never held across an await. Every
//   check-then-set on the registries happens inside a single critical section.
// - Persists of the same tag are not ordered against each other. The remote document
//   ends up with the content of whichever persist completed last.
// - `clear` bumps a generation counter. Fetches and persists started before the clear
//   drop their results instead of writing into the fresh state.

use crate::application::errors::SyncError;
use crate::core::ports::{JSON_FILES_QUERY, RemoteFileRef, RemoteFileService};
use crate::core::tally::content::{parse_content, serialize_entries};
use crate::core::tally::entry::{Entry, StoreEntry};
use crate::core::tally::entry_store::EntryStore;
use crate::core::tally::file_header::{FileHeader, FileHeaders, file_name_for_tag};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info};

type SharedLoad = Shared<BoxFuture<'static, Result<(), SyncError>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum LoadStatus {
    /// No local entries and no remote document.
    Empty,
    /// Known to exist remotely (or not listed yet) and never fetched.
    NotFetched,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Clone)]
pub struct SyncCache {
    inner: Arc<Inner>,
}

struct Inner {
    remote: Arc<dyn RemoteFileService>,
    state: Mutex<CacheState>,
    persists: Mutex<PersistTasks>,
}

#[derive(Default)]
struct CacheState {
    generation: u64,
    store: EntryStore,
    headers: FileHeaders,
    // Headers added before the listing was loaded, applied on top of it.
    picked: Vec<FileHeader>,
    listing: Option<SharedLoad>,
    requests: HashMap<String, SharedLoad>,
    failures: HashMap<String, SyncError>,
    // Tags written while their document creation was still in flight.
    dirty: HashSet<String>,
    // Tags whose remote document was merged into the store or created this session.
    loaded: HashSet<String>,
}

#[derive(Default)]
struct PersistTasks {
    running: Vec<JoinHandle<Result<(), SyncError>>>,
    failed: Vec<SyncError>,
}

enum SavePlan {
    Deferred,
    Update(FileHeader),
    Create,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persists(&self) -> MutexGuard<'_, PersistTasks> {
        self.persists.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SyncCache {
    pub fn new(remote: Arc<dyn RemoteFileService>) -> Self {
        Self {
            inner: Arc::new(Inner {
                remote,
                state: Mutex::default(),
                persists: Mutex::default(),
            }),
        }
    }

    pub fn same_cache(&self, other: &SyncCache) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn read(&self) -> Vec<StoreEntry> {
        self.inner.state().store.read()
    }

    /// Persists run on the current Tokio runtime. Without one the persist is reported
    /// as a failure by the next `settle`.
    pub fn write(&self, entry: StoreEntry) {
        let tag = entry.tag.clone();
        self.inner.state().store.write(entry);
        self.schedule_save(tag);
    }

    pub fn delete(&self, entry: &StoreEntry) {
        self.inner.state().store.delete(entry);
        self.schedule_save(entry.tag.clone());
    }

    /// Moving an entry to another tag persists both documents.
    pub fn update(&self, old: &StoreEntry, new: StoreEntry) {
        let moved_to = (old.tag != new.tag).then(|| new.tag.clone());
        self.inner.state().store.update(old, new);
        self.schedule_save(old.tag.clone());
        if let Some(tag) = moved_to {
            self.schedule_save(tag);
        }
    }

    pub fn clear(&self) {
        let mut state = self.inner.state();
        let generation = state.generation + 1;
        *state = CacheState {
            generation,
            ..CacheState::default()
        };
        info!(generation, "tally cache cleared");
    }

    pub fn tags(&self) -> Vec<String> {
        let state = self.inner.state();
        let tags: BTreeSet<String> = state
            .store
            .tags()
            .into_iter()
            .chain(state.headers.tags())
            .collect();
        tags.into_iter().collect()
    }

    /// Whatever is resident right now. Use `request_by_tag` to trigger the remote fetch.
    pub fn entries_by_tag(&self, tag: &str) -> Vec<Entry> {
        self.inner.state().store.entries_by_tag(tag)
    }

    pub fn file_headers(&self) -> FileHeaders {
        self.inner.state().headers.clone()
    }

    pub async fn request_tags(&self) -> Result<Vec<String>, SyncError> {
        self.ensure_file_headers().await?;
        Ok(self.tags())
    }

    pub async fn request_by_tag(&self, tag: &str) -> Result<Vec<Entry>, SyncError> {
        let entries = self.entries_by_tag(tag);
        self.ensure_file_headers().await?;
        let load = {
            let mut state = self.inner.state();
            match state.headers.find(tag).cloned() {
                Some(listed) if entries.is_empty() && !listed.is_placeholder() => {
                    self.document_load(&mut state, listed)
                }
                _ => return Ok(entries),
            }
        };
        load.await?;
        Ok(self.entries_by_tag(tag))
    }

    /// Registers documents discovered outside the listing. The last header registered
    /// for a tag wins.
    pub fn add_files(&self, files: Vec<RemoteFileRef>) {
        let mut state = self.inner.state();
        for header in files.iter().filter_map(FileHeader::from_remote) {
            debug!(tag = %header.tag, id = %header.id, "registering tally document");
            if !state.headers.register(header.clone()) {
                state.picked.push(header);
            }
        }
    }

    pub fn load_status(&self, tag: &str) -> LoadStatus {
        let state = self.inner.state();
        if let Some(failure) = state.failures.get(tag) {
            return LoadStatus::Failed(failure.to_string());
        }
        match state.headers.find(tag) {
            Some(header) if !header.is_placeholder() => match state.requests.get(&header.id) {
                Some(load) if load.peek().is_some() => LoadStatus::Loaded,
                Some(_) => LoadStatus::Loading,
                None if state.loaded.contains(tag) => LoadStatus::Loaded,
                None => LoadStatus::NotFetched,
            },
            Some(_) => LoadStatus::Loaded,
            None if !state.store.entries_by_tag(tag).is_empty() => LoadStatus::Loaded,
            None if state.headers.is_loaded() => LoadStatus::Empty,
            None if state.listing.is_some() => LoadStatus::Loading,
            None => LoadStatus::NotFetched,
        }
    }

    /// Awaits every persist scheduled so far and returns the failures collected since
    /// the previous call.
    pub async fn settle(&self) -> Vec<SyncError> {
        loop {
            let running = std::mem::take(&mut self.inner.persists().running);
            if running.is_empty() {
                break;
            }
            for handle in running {
                if let Err(err) = flatten_join(handle.await) {
                    self.inner.persists().failed.push(err);
                }
            }
        }
        std::mem::take(&mut self.inner.persists().failed)
    }

    async fn ensure_file_headers(&self) -> Result<(), SyncError> {
        let listing = {
            let mut state = self.inner.state();
            if state.headers.is_loaded() {
                return Ok(());
            }
            match state.listing.clone() {
                Some(listing) => listing,
                None => {
                    let listing = list_documents(
                        Arc::downgrade(&self.inner),
                        self.inner.remote.clone(),
                        state.generation,
                    )
                    .boxed()
                    .shared();
                    state.listing = Some(listing.clone());
                    listing
                }
            }
        };
        listing.await
    }

    fn document_load(&self, state: &mut CacheState, listed: FileHeader) -> SharedLoad {
        if let Some(pending) = state.requests.get(&listed.id) {
            debug!(tag = %listed.tag, id = %listed.id, "joining tally document fetch");
            return pending.clone();
        }
        let id = listed.id.clone();
        let load = fetch_document(
            Arc::downgrade(&self.inner),
            self.inner.remote.clone(),
            listed,
            state.generation,
        )
        .boxed()
        .shared();
        state.requests.insert(id, load.clone());
        load
    }

    fn schedule_save(&self, tag: String) {
        let generation = self.inner.state().generation;
        let Ok(runtime) = Handle::try_current() else {
            error!(tag = %tag, "no runtime to persist tally document on");
            self.inner.persists().failed.push(SyncError::NoRuntime);
            return;
        };
        let cache = self.clone();
        let handle = runtime.spawn(async move {
            let saved = cache.save_file(&tag, generation).await;
            if let Err(err) = &saved {
                error!(tag = %tag, %err, "failed to persist tally document");
            }
            saved
        });
        let mut persists = self.inner.persists();
        persists.reap();
        persists.running.push(handle);
    }

    async fn save_file(&self, tag: &str, generation: u64) -> Result<(), SyncError> {
        self.ensure_file_headers().await?;
        let plan = {
            let mut state = self.inner.state();
            if state.generation != generation {
                debug!(tag, "cache cleared before the save ran, skipping");
                return Ok(());
            }
            match state.headers.find(tag).cloned() {
                Some(header) if header.is_placeholder() => {
                    state.dirty.insert(tag.to_string());
                    SavePlan::Deferred
                }
                Some(header) => SavePlan::Update(header),
                None => {
                    state.headers.register(FileHeader::placeholder(tag));
                    SavePlan::Create
                }
            }
        };
        match plan {
            SavePlan::Deferred => {
                debug!(tag, "tally document creation in flight, saving once it lands");
                Ok(())
            }
            SavePlan::Update(header) => self.update_document(header, generation).await,
            SavePlan::Create => self.create_document(tag, generation).await,
        }
    }

    // A tag never loaded this session gets its remote document merged into the store
    // before it is overwritten, so entries written ahead of the first fetch do not
    // replace the remote history.
    async fn update_document(&self, header: FileHeader, generation: u64) -> Result<(), SyncError> {
        let load = {
            let mut state = self.inner.state();
            (!state.loaded.contains(&header.tag))
                .then(|| self.document_load(&mut state, header.clone()))
        };
        if let Some(load) = load {
            load.await?;
        }
        let Some(content) = self.content_if_current(&header.tag, generation) else {
            debug!(tag = %header.tag, "cache cleared during the save, skipping");
            return Ok(());
        };
        info!(tag = %header.tag, id = %header.id, "saving tally document");
        self.inner.remote.update(&header.id, &content).await?;
        Ok(())
    }

    async fn create_document(&self, tag: &str, generation: u64) -> Result<(), SyncError> {
        let name = file_name_for_tag(tag);
        let Some(content) = self.content_if_current(tag, generation) else {
            return Ok(());
        };
        info!(tag, name = %name, "creating tally document");
        let created = self.inner.remote.create(&name, &content).await;
        let resave = {
            let mut state = self.inner.state();
            let current = state.generation == generation;
            match &created {
                Ok(file) if current => {
                    state.headers.register(FileHeader {
                        name: file.name.clone(),
                        tag: tag.to_string(),
                        id: file.id.clone(),
                    });
                    // Content is resident already, nothing to fetch for this id.
                    state
                        .requests
                        .insert(file.id.clone(), futures::future::ready(Ok(())).boxed().shared());
                    state.loaded.insert(tag.to_string());
                    state.dirty.remove(tag)
                }
                Err(_) if current => {
                    state.headers.remove_placeholder(tag);
                    state.dirty.remove(tag);
                    false
                }
                _ => false,
            }
        };
        let created = created?;
        if resave {
            let Some(content) = self.content_if_current(tag, generation) else {
                debug!(tag, "cache cleared during the save, skipping");
                return Ok(());
            };
            info!(tag, id = %created.id, "saving tally document written during creation");
            self.inner.remote.update(&created.id, &content).await?;
        }
        Ok(())
    }

    // None once a clear has replaced the state the save was scheduled against.
    fn content_if_current(&self, tag: &str, generation: u64) -> Option<serde_json::Value> {
        let state = self.inner.state();
        (state.generation == generation)
            .then(|| serialize_entries(&state.store.entries_by_tag(tag)))
    }
}

impl fmt::Debug for SyncCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("SyncCache")
            .field("generation", &state.generation)
            .field("tags", &state.store.tags())
            .field("headers_loaded", &state.headers.is_loaded())
            .finish_non_exhaustive()
    }
}

impl PersistTasks {
    // Drops finished handles, keeping their failures for the next `settle`.
    fn reap(&mut self) {
        let mut running = Vec::with_capacity(self.running.len());
        for handle in self.running.drain(..) {
            if !handle.is_finished() {
                running.push(handle);
                continue;
            }
            if let Some(Err(err)) = handle.now_or_never().map(flatten_join) {
                self.failed.push(err);
            }
        }
        self.running = running;
    }
}

fn flatten_join(joined: Result<Result<(), SyncError>, JoinError>) -> Result<(), SyncError> {
    joined.unwrap_or_else(|err| Err(SyncError::TaskAborted(err.to_string())))
}

async fn list_documents(
    inner: Weak<Inner>,
    remote: Arc<dyn RemoteFileService>,
    generation: u64,
) -> Result<(), SyncError> {
    info!("listing remote tally documents");
    let listed = remote.list(JSON_FILES_QUERY).await;
    let Some(inner) = inner.upgrade() else {
        return Ok(());
    };
    let mut state = inner.state();
    if state.generation != generation {
        return Ok(());
    }
    state.listing = None;
    match listed {
        Ok(files) => {
            let mut headers = FileHeaders::from_listing(&files);
            for header in std::mem::take(&mut state.picked) {
                headers.register(header);
            }
            info!(documents = headers.tags().len(), "listed remote tally documents");
            state.headers = headers;
            Ok(())
        }
        Err(err) => {
            error!(%err, "failed to list remote tally documents");
            Err(err.into())
        }
    }
}

async fn fetch_document(
    inner: Weak<Inner>,
    remote: Arc<dyn RemoteFileService>,
    header: FileHeader,
    generation: u64,
) -> Result<(), SyncError> {
    info!(tag = %header.tag, id = %header.id, "fetching tally document");
    let fetched = remote.get(&header.id).await;
    let Some(inner) = inner.upgrade() else {
        return Ok(());
    };
    let mut state = inner.state();
    if state.generation != generation {
        return Ok(());
    }
    match fetched {
        Ok(file) => {
            let entries = parse_content(&header.tag, &file.content);
            info!(tag = %header.tag, entries = entries.len(), "loaded tally document");
            for entry in entries {
                state.store.write(entry);
            }
            state.failures.remove(&header.tag);
            state.loaded.insert(header.tag);
            Ok(())
        }
        Err(err) => {
            error!(tag = %header.tag, id = %header.id, %err, "failed to fetch tally document");
            let err = SyncError::from(err);
            state.requests.remove(&header.id);
            state.failures.insert(header.tag, err.clone());
            Err(err)
        }
    }
}

#[cfg(test)]
mod sync_cache_tests {
    use super::*;
    use crate::adapters::in_memory::in_memory_remote_files::{InMemoryRemoteFiles, RemoteCall};
    use crate::core::ports::RemoteFileError;
    use crate::test_support::fixtures::{
        StoreEntryBuilder, cache_with_remote, parse_date, pushups_document,
    };
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn before_each() -> (SyncCache, Arc<InMemoryRemoteFiles>) {
        cache_with_remote()
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_create_a_single_document_for_concurrent_writes_to_a_new_tag(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        remote.set_delay_ms(5);
        let first = StoreEntryBuilder::new().tag("situps").build();
        let second = StoreEntryBuilder::new().tag("situps").count(8.0).build();
        cache.write(first.clone());
        cache.write(second.clone());
        assert!(cache.settle().await.is_empty());

        let created = remote.created().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, "situps-TA.json");

        let stored = remote.content_by_name("situps-TA.json").await.unwrap();
        assert_eq!(stored, serialize_entries(&[first.entry(), second.entry()]));

        let header = cache.file_headers().find("situps").cloned().unwrap();
        assert!(!header.is_placeholder());
        assert_eq!(header.name, "situps-TA.json");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_resave_entries_written_while_the_document_was_being_created(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        remote.set_delay_ms(20);
        let first = StoreEntryBuilder::new().build();
        cache.write(first.clone());
        // Let the first persist list and reserve the placeholder before the second write.
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        assert!(cache.file_headers().find("pushups").unwrap().is_placeholder());

        let second = StoreEntryBuilder::new().count(1.0).build();
        cache.write(second.clone());
        assert!(cache.settle().await.is_empty());

        assert_eq!(remote.created().await.len(), 1);
        assert_eq!(
            remote.content_by_name("pushups-TA.json").await.unwrap(),
            serialize_entries(&[first.entry(), second.entry()])
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_release_the_placeholder_when_creation_fails(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        cache.request_tags().await.unwrap();
        remote.toggle_offline();
        cache.write(StoreEntryBuilder::new().build());
        let failures = cache.settle().await;
        assert_eq!(failures.len(), 1);
        assert!(cache.file_headers().find("pushups").is_none());
        assert_eq!(cache.entries_by_tag("pushups").len(), 1);

        remote.toggle_offline();
        cache.write(StoreEntryBuilder::new().count(2.0).build());
        assert!(cache.settle().await.is_empty());
        assert_eq!(remote.created().await.len(), 2);
        assert_eq!(remote.files().await.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_merge_the_remote_document_before_updating_it(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        remote
            .seed("abc", "pushups-TA.json", pushups_document())
            .await;
        let local = StoreEntryBuilder::new().build();
        cache.write(local.clone());
        assert!(cache.settle().await.is_empty());

        assert_eq!(remote.get_calls().await, vec!["abc".to_string()]);
        assert_eq!(
            remote.content_by_name("pushups-TA.json").await.unwrap(),
            json!({"version":"0.1.0","entries":[
                {"count":20,"date":"2024-01-01T10:00:00Z"},
                {"count":7,"date":"2024-02-01T00:00:00Z"}
            ]})
        );
        assert_eq!(cache.load_status("pushups"), LoadStatus::Loaded);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_persist_both_tags_when_an_update_moves_an_entry(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        let old = StoreEntryBuilder::new().build();
        cache.write(old.clone());
        assert!(cache.settle().await.is_empty());

        let new = StoreEntryBuilder::new().tag("situps").build();
        cache.update(&old, new.clone());
        assert!(cache.settle().await.is_empty());

        assert_eq!(
            remote.content_by_name("pushups-TA.json").await.unwrap(),
            json!({"version":"0.1.0","entries":[]})
        );
        assert_eq!(
            remote.content_by_name("situps-TA.json").await.unwrap(),
            serialize_entries(&[new.entry()])
        );
        assert_eq!(cache.tags(), vec!["pushups".to_string(), "situps".to_string()]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_record_a_failed_fetch_and_retry_on_the_next_request(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        remote
            .seed("abc", "pushups-TA.json", pushups_document())
            .await;
        cache.request_tags().await.unwrap();
        assert_eq!(cache.load_status("pushups"), LoadStatus::NotFetched);

        remote.toggle_offline();
        let failed = cache.request_by_tag("pushups").await;
        assert!(matches!(
            failed,
            Err(SyncError::Remote(RemoteFileError::Backend(_)))
        ));
        assert!(matches!(cache.load_status("pushups"), LoadStatus::Failed(_)));
        assert!(cache.entries_by_tag("pushups").is_empty());

        remote.toggle_offline();
        let entries = cache.request_by_tag("pushups").await.unwrap();
        assert_eq!(
            entries,
            vec![Entry::new(7.0, parse_date("2024-02-01T00:00:00Z"))]
        );
        assert_eq!(cache.load_status("pushups"), LoadStatus::Loaded);
        assert_eq!(remote.get_calls().await.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_not_refetch_a_document_emptied_locally(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        remote
            .seed("abc", "pushups-TA.json", pushups_document())
            .await;
        let entries = cache.request_by_tag("pushups").await.unwrap();
        cache.delete(&entries[0].tagged("pushups"));
        assert!(cache.settle().await.is_empty());

        assert!(cache.request_by_tag("pushups").await.unwrap().is_empty());
        assert_eq!(remote.get_calls().await.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_report_the_load_status_of_a_tag(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        assert_eq!(cache.load_status("pushups"), LoadStatus::NotFetched);
        cache.request_tags().await.unwrap();
        assert_eq!(cache.load_status("pushups"), LoadStatus::Empty);

        remote
            .seed("abc", "pushups-TA.json", pushups_document())
            .await;
        cache.add_files(vec![RemoteFileRef {
            id: "abc".into(),
            name: "pushups-TA.json".into(),
        }]);
        assert_eq!(cache.load_status("pushups"), LoadStatus::NotFetched);
        cache.request_by_tag("pushups").await.unwrap();
        assert_eq!(cache.load_status("pushups"), LoadStatus::Loaded);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_apply_files_added_before_the_listing_on_top_of_it(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        remote.seed("abc", "pushups-TA.json", json!({})).await;
        cache.add_files(vec![
            RemoteFileRef {
                id: "def".into(),
                name: "pushups-2-TA.json".into(),
            },
            RemoteFileRef {
                id: "ignored".into(),
                name: "shopping-list.json".into(),
            },
        ]);
        assert_eq!(cache.file_headers(), FileHeaders::NotLoaded);

        assert_eq!(cache.request_tags().await.unwrap(), vec!["pushups".to_string()]);
        assert_eq!(cache.file_headers().find("pushups").unwrap().id, "def");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_drop_fetch_results_that_land_after_a_clear(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        remote
            .seed("abc", "pushups-TA.json", pushups_document())
            .await;
        cache.request_tags().await.unwrap();
        remote.set_delay_ms(20);

        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.request_by_tag("pushups").await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        cache.clear();
        pending.await.unwrap().unwrap();

        assert!(cache.entries_by_tag("pushups").is_empty());
        assert_eq!(cache.file_headers(), FileHeaders::NotLoaded);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_not_overwrite_the_remote_document_when_cleared_during_a_persist(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        remote
            .seed("abc", "pushups-TA.json", pushups_document())
            .await;
        cache.request_tags().await.unwrap();
        remote.set_delay_ms(30);

        cache.write(StoreEntryBuilder::new().build());
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        cache.clear();
        assert!(cache.settle().await.is_empty());

        assert!(remote.updated().await.is_empty());
        assert_eq!(
            remote.content_by_name("pushups-TA.json").await.unwrap(),
            pushups_document()
        );
        assert!(cache.read().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_not_merge_a_replacement_document_into_a_loaded_tag(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        remote
            .seed("abc", "pushups-TA.json", pushups_document())
            .await;
        remote
            .seed("def", "pushups-2-TA.json", pushups_document())
            .await;
        cache.request_by_tag("pushups").await.unwrap();
        cache.add_files(vec![RemoteFileRef {
            id: "def".into(),
            name: "pushups-2-TA.json".into(),
        }]);
        assert_eq!(cache.load_status("pushups"), LoadStatus::Loaded);

        let local = StoreEntryBuilder::new().build();
        cache.write(local.clone());
        assert!(cache.settle().await.is_empty());

        let expected = vec![
            Entry::new(7.0, parse_date("2024-02-01T00:00:00Z")),
            local.entry(),
        ];
        assert_eq!(cache.entries_by_tag("pushups"), expected);
        assert_eq!(remote.get_calls().await, vec!["abc".to_string()]);
        assert_eq!(
            remote.updated().await,
            vec![("def".to_string(), serialize_entries(&expected))]
        );
    }

    #[rstest]
    fn it_should_report_a_persist_scheduled_outside_a_runtime(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, _remote) = before_each;
        let entry = StoreEntryBuilder::new().build();
        cache.write(entry.clone());
        assert_eq!(cache.entries_by_tag("pushups"), vec![entry.entry()]);
        assert_eq!(
            futures::executor::block_on(cache.settle()),
            vec![SyncError::NoRuntime]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_local_state_when_a_persist_fails(
        before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
    ) {
        let (cache, remote) = before_each;
        remote.toggle_offline();
        let entry = StoreEntryBuilder::new().build();
        cache.write(entry.clone());
        let failures = cache.settle().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(cache.entries_by_tag("pushups"), vec![entry.entry()]);
        assert!(cache.settle().await.is_empty());
        assert!(matches!(remote.calls().await[0], RemoteCall::List(_)));
    }
}
