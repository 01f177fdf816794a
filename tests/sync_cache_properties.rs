// Observable properties of the sync cache against the in memory remote file service.
//
// Each test builds a fresh cache so remote call counts start at zero.

use chrono::{DateTime, Utc};
use rstest::{fixture, rstest};
use serde_json::json;
use std::sync::Arc;

use tally_anything::adapters::in_memory::in_memory_remote_files::InMemoryRemoteFiles;
use tally_anything::application::sync_cache::SyncCache;
use tally_anything::core::tally::content::{parse_content, serialize_entries};
use tally_anything::core::tally::entry::{Entry, StoreEntry};
use tally_anything::core::tally::file_header::FileHeaders;

fn date(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap()
        .with_timezone(&Utc)
}

fn pushups(count: f64) -> StoreEntry {
    StoreEntry::new("pushups", count, date("2024-01-01T10:00:00Z"))
}

fn golden_document() -> serde_json::Value {
    json!({"version": "0.1.0", "entries": [{"count": 7, "date": "2024-02-01T00:00:00Z"}]})
}

#[fixture]
fn before_each() -> (SyncCache, Arc<InMemoryRemoteFiles>) {
    let remote = Arc::new(InMemoryRemoteFiles::new());
    (SyncCache::new(remote.clone()), remote)
}

#[rstest]
#[tokio::test]
async fn it_should_read_back_what_was_written(before_each: (SyncCache, Arc<InMemoryRemoteFiles>)) {
    let (cache, _remote) = before_each;
    cache.write(pushups(20.0));
    assert!(cache.read().contains(&pushups(20.0)));
    assert_eq!(cache.entries_by_tag("pushups"), vec![pushups(20.0).entry()]);
    assert!(cache.settle().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn it_should_delete_exactly_one_copy_of_a_duplicate(
    before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
) {
    let (cache, _remote) = before_each;
    cache.write(pushups(20.0));
    cache.write(pushups(20.0));
    cache.delete(&pushups(20.0));
    assert_eq!(cache.read(), vec![pushups(20.0)]);
    assert!(cache.settle().await.is_empty());
}

#[rstest]
#[case(StoreEntry::new("pushups", 25.0, date("2024-01-01T10:00:00Z")))]
#[case(StoreEntry::new("situps", 20.0, date("2024-01-01T10:00:00Z")))]
#[tokio::test]
async fn it_should_update_like_a_delete_followed_by_a_write(
    #[case] new: StoreEntry,
    #[values(true, false)] through_update: bool,
) {
    let remote = Arc::new(InMemoryRemoteFiles::new());
    let cache = SyncCache::new(remote);
    cache.write(pushups(20.0));
    cache.write(pushups(3.0));
    if through_update {
        cache.update(&pushups(20.0), new.clone());
    } else {
        cache.delete(&pushups(20.0));
        cache.write(new.clone());
    }
    assert_eq!(cache.entries_by_tag("pushups").len(), if new.tag == "pushups" { 2 } else { 1 });
    assert!(cache.entries_by_tag(&new.tag).contains(&new.entry()));
    assert!(cache.settle().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn it_should_fetch_a_document_once_for_concurrent_requests(
    before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
) {
    let (cache, remote) = before_each;
    remote.seed("abc", "pushups-TA.json", golden_document()).await;
    remote.set_delay_ms(5);

    let (first, second, third) = tokio::join!(
        cache.request_by_tag("pushups"),
        cache.request_by_tag("pushups"),
        cache.request_by_tag("pushups"),
    );
    let expected = vec![Entry::new(7.0, date("2024-02-01T00:00:00Z"))];
    assert_eq!(first.unwrap(), expected);
    assert_eq!(second.unwrap(), expected);
    assert_eq!(third.unwrap(), expected);
    assert_eq!(remote.get_calls().await, vec!["abc".to_string()]);
    assert_eq!(remote.list_calls().await, 1);
}

#[rstest]
#[tokio::test]
async fn it_should_fetch_a_document_once_across_sequential_requests(
    before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
) {
    let (cache, remote) = before_each;
    remote.seed("abc", "pushups-TA.json", golden_document()).await;

    let first = cache.request_by_tag("pushups").await.unwrap();
    let second = cache.request_by_tag("pushups").await.unwrap();
    assert_eq!(first, vec![Entry::new(7.0, date("2024-02-01T00:00:00Z"))]);
    assert_eq!(first, second);
    assert_eq!(remote.get_calls().await, vec!["abc".to_string()]);
}

#[rstest]
#[tokio::test]
async fn it_should_list_once_for_repeated_tag_requests(
    before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
) {
    let (cache, remote) = before_each;
    remote.seed("abc", "pushups-TA.json", golden_document()).await;
    remote.set_delay_ms(2);

    let (first, second) = tokio::join!(cache.request_tags(), cache.request_tags());
    assert_eq!(first.unwrap(), vec!["pushups".to_string()]);
    assert_eq!(second.unwrap(), vec!["pushups".to_string()]);
    cache.request_tags().await.unwrap();
    assert_eq!(remote.list_calls().await, 1);
}

#[rstest]
#[case(20.0, "2024-01-01T10:00:00Z")]
#[case(0.5, "2023-12-31T23:59:59Z")]
#[case(-3.0, "2024-06-30T12:00:00Z")]
fn it_should_reproduce_entries_through_the_wire_format(#[case] count: f64, #[case] when: &str) {
    let entries = vec![Entry::new(count, date(when)), Entry::new(count, date(when))];
    let parsed: Vec<Entry> = parse_content("pushups", &serialize_entries(&entries))
        .iter()
        .map(StoreEntry::entry)
        .collect();
    assert_eq!(parsed, entries);
}

#[rstest]
#[tokio::test]
async fn it_should_ignore_documents_of_an_unknown_version(
    before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
) {
    let (cache, remote) = before_each;
    remote
        .seed(
            "abc",
            "pushups-TA.json",
            json!({"version": "9.9.9", "entries": [{"count": 1, "date": "2024-01-01T00:00:00Z"}]}),
        )
        .await;
    assert!(cache.request_by_tag("pushups").await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn it_should_list_again_after_a_clear(before_each: (SyncCache, Arc<InMemoryRemoteFiles>)) {
    let (cache, remote) = before_each;
    remote.seed("abc", "pushups-TA.json", golden_document()).await;
    cache.request_by_tag("pushups").await.unwrap();

    cache.clear();
    assert_eq!(cache.file_headers(), FileHeaders::NotLoaded);
    assert!(cache.read().is_empty());

    assert_eq!(cache.request_tags().await.unwrap(), vec!["pushups".to_string()]);
    cache.request_by_tag("pushups").await.unwrap();
    assert_eq!(remote.list_calls().await, 2);
    assert_eq!(remote.get_calls().await.len(), 2);
}

#[rstest]
#[tokio::test]
async fn it_should_create_a_document_for_a_new_tag(
    before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
) {
    let (cache, remote) = before_each;
    cache.write(pushups(20.0));
    assert_eq!(
        cache.request_by_tag("pushups").await.unwrap(),
        vec![pushups(20.0).entry()]
    );
    assert!(cache.settle().await.is_empty());

    let files = remote.files().await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "pushups-TA.json");
    assert_eq!(
        files[0].content,
        json!({"version": "0.1.0", "entries": [{"count": 20, "date": "2024-01-01T10:00:00Z"}]})
    );
}

#[rstest]
#[tokio::test]
async fn it_should_keep_the_last_completed_persist_of_a_tag(
    before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
) {
    let (cache, remote) = before_each;
    cache.write(pushups(1.0));
    assert!(cache.settle().await.is_empty());

    cache.write(pushups(2.0));
    cache.write(pushups(3.0));
    assert!(cache.settle().await.is_empty());

    let stored = remote.content_by_name("pushups-TA.json").await.unwrap();
    assert_eq!(
        stored,
        serialize_entries(&[pushups(1.0).entry(), pushups(2.0).entry(), pushups(3.0).entry()])
    );
    assert_eq!(remote.created().await.len(), 1);
}

#[rstest]
#[tokio::test]
async fn it_should_leave_the_remote_document_alone_when_logging_out_mid_persist(
    before_each: (SyncCache, Arc<InMemoryRemoteFiles>),
) {
    let (cache, remote) = before_each;
    remote.seed("abc", "pushups-TA.json", golden_document()).await;
    cache.request_tags().await.unwrap();
    remote.set_delay_ms(30);

    cache.write(pushups(20.0));
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    cache.clear();
    assert!(cache.settle().await.is_empty());

    remote.set_delay_ms(0);
    assert_eq!(remote.content_by_name("pushups-TA.json").await.unwrap(), golden_document());
    assert_eq!(
        cache.request_by_tag("pushups").await.unwrap(),
        vec![Entry::new(7.0, date("2024-02-01T00:00:00Z"))]
    );
}
