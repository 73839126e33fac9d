use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use proptest::prelude::*;

use super::source::parse_list;
use super::*;
use crate::events::testing::RecordingSink;
use crate::events::{EventKind, EventSink};
use crate::smtp_verify::ErrorKind;

fn registry_with(seed: &[&str]) -> (DisposableRegistry, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let registry =
        DisposableRegistry::with_seed(seed.iter().copied(), sink.clone() as Arc<dyn EventSink>);
    (registry, sink)
}

fn domains(list: &[&str]) -> Vec<String> {
    list.iter().map(|d| d.to_string()).collect()
}

fn fixed_source(list: &'static [&'static str]) -> impl DomainSource {
    FnSource::new("fixed", move || async move { Ok::<_, FetchError>(domains(list)) })
}

fn failing_source() -> impl DomainSource {
    FnSource::new("broken", || async { Err::<Vec<String>, FetchError>("connection reset".into()) })
}

/// Counts fetches; every call returns the same list.
fn counting_source(calls: Arc<AtomicUsize>) -> Arc<dyn DomainSource> {
    Arc::new(FnSource::new("counting", move || {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, FetchError>(domains(&["fresh.test"]))
        }
    }))
}

#[test]
fn builtin_seed_is_loaded() {
    let registry = DisposableRegistry::new();
    assert!(registry.is_disposable("mailinator.com"));
    assert!(registry.is_disposable("YOPMAIL.com."));
    assert!(!registry.is_disposable("example.com"));
    assert!(!registry.is_disposable(""));
    assert!(DisposableRegistry::empty().snapshot().is_empty());
}

#[test]
fn add_domains_merges_and_reports_new_entries() {
    let (registry, _) = registry_with(&["a.test"]);
    assert_eq!(registry.add_domains(["B.test", " c.test. "]), 2);
    assert!(registry.is_disposable("b.test"));
    assert!(registry.is_disposable("c.test"));
    assert_eq!(registry.add_domains(["b.test"]), 0);
    assert_eq!(registry.snapshot().len(), 3);
}

#[tokio::test]
async fn refresh_replaces_base_and_keeps_overrides() {
    let (registry, sink) = registry_with(&["old.test"]);
    registry.add_domains(["mine.test"]);

    let published = registry
        .refresh_now(&fixed_source(&["new.test", "other.test"]))
        .await
        .expect("refresh succeeds");

    assert_eq!(published, 3);
    assert!(!registry.is_disposable("old.test"));
    assert!(registry.is_disposable("new.test"));
    assert!(registry.is_disposable("mine.test"));
    assert_eq!(sink.count(EventKind::RefreshPublished), 1);
}

#[tokio::test]
async fn failed_fetch_keeps_snapshot_and_reports() {
    let (registry, sink) = registry_with(&["keep.test"]);
    let before = registry.snapshot();

    let err = registry
        .refresh_now(&failing_source())
        .await
        .expect_err("fetch fails");

    assert!(matches!(err, RegistryError::Fetch { .. }));
    assert!(Arc::ptr_eq(&before, &registry.snapshot()));
    assert!(registry.is_disposable("keep.test"));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::RefreshFailed);
    assert_eq!(events[0].subject, "broken");
    assert_eq!(events[0].error_kind, Some(ErrorKind::RefreshFetchFailed));
    assert!(events[0].cause.contains("connection reset"));
}

#[tokio::test]
async fn empty_fetch_is_refused() {
    let (registry, sink) = registry_with(&["keep.test"]);
    let err = registry
        .refresh_now(&fixed_source(&["", "  "]))
        .await
        .expect_err("empty list");
    assert!(matches!(err, RegistryError::EmptyList { .. }));
    assert!(registry.is_disposable("keep.test"));
    assert_eq!(sink.count(EventKind::RefreshFailed), 1);
}

#[tokio::test(start_paused = true)]
async fn auto_refresh_ticks_until_stopped() {
    let (registry, _) = registry_with(&[]);
    let calls = Arc::new(AtomicUsize::new(0));

    registry.start_auto_refresh(Duration::from_secs(60), counting_source(calls.clone()));
    assert!(registry.is_auto_refreshing());

    tokio::time::sleep(Duration::from_secs(125)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(registry.is_disposable("fresh.test"));

    registry.stop_auto_refresh();
    registry.stop_auto_refresh();
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(!registry.is_auto_refreshing());
}

#[tokio::test(start_paused = true)]
async fn restarting_replaces_the_running_refresher() {
    let (registry, _) = registry_with(&[]);
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    registry.start_auto_refresh(Duration::from_secs(60), counting_source(first.clone()));
    tokio::time::sleep(Duration::from_secs(1)).await;
    registry.start_auto_refresh(Duration::from_secs(60), counting_source(second.clone()));
    tokio::time::sleep(Duration::from_secs(130)).await;

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 3);
    registry.stop_auto_refresh();
}

#[tokio::test(start_paused = true)]
async fn refresher_survives_fetch_failures() {
    let (registry, sink) = registry_with(&["keep.test"]);
    registry.start_auto_refresh(Duration::from_secs(10), Arc::new(failing_source()));

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(sink.count(EventKind::RefreshFailed), 3);
    assert!(registry.is_auto_refreshing());
    assert!(registry.is_disposable("keep.test"));
    registry.stop_auto_refresh();
}

#[test]
fn stop_without_start_is_a_no_op() {
    let (registry, _) = registry_with(&[]);
    registry.stop_auto_refresh();
    assert!(!registry.is_auto_refreshing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_a_partial_snapshot() {
    const SIZE: usize = 200;
    let list_a: Vec<String> = (0..SIZE).map(|i| format!("a{i}.test")).collect();
    let list_b: Vec<String> = (0..SIZE).map(|i| format!("b{i}.test")).collect();

    let (registry, _) = registry_with(&[]);
    let flip = Arc::new(AtomicUsize::new(0));
    let source = {
        let flip = flip.clone();
        FnSource::new("alternating", move || {
            let list = if flip.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                list_a.clone()
            } else {
                list_b.clone()
            };
            async move { Ok::<_, FetchError>(list) }
        })
    };
    registry.refresh_now(&source).await.expect("first refresh");

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move {
                for _ in 0..2_000 {
                    let snapshot = registry.snapshot();
                    let a = (0..SIZE)
                        .filter(|i| snapshot.contains(&format!("a{i}.test")))
                        .count();
                    let b = (0..SIZE)
                        .filter(|i| snapshot.contains(&format!("b{i}.test")))
                        .count();
                    assert!((a, b) == (SIZE, 0) || (a, b) == (0, SIZE), "torn: {a}/{b}");
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for _ in 0..200 {
        registry.refresh_now(&source).await.expect("refresh");
        tokio::task::yield_now().await;
    }
    for reader in readers {
        reader.await.expect("reader finished");
    }
}

#[tokio::test]
async fn file_source_reads_one_domain_per_line() {
    let path = std::env::temp_dir().join(format!(
        "mailprobe-disposable-{}.txt",
        std::process::id()
    ));
    tokio::fs::write(&path, "# list\nfoo.test\n\n  Bar.test  # trailing\n")
        .await
        .expect("write list");

    let (registry, _) = registry_with(&[]);
    let published = registry
        .refresh_now(&FileSource::new(&path))
        .await
        .expect("file refresh");
    tokio::fs::remove_file(&path).await.ok();

    assert_eq!(published, 2);
    assert!(registry.is_disposable("bar.test"));
}

#[tokio::test]
async fn missing_file_is_a_fetch_failure() {
    let (registry, sink) = registry_with(&["keep.test"]);
    let source = FileSource::new("/nonexistent/mailprobe/disposable.txt");
    assert!(registry.refresh_now(&source).await.is_err());
    assert_eq!(sink.count(EventKind::RefreshFailed), 1);
}

#[test]
fn parse_list_skips_comments_and_blanks() {
    assert_eq!(
        parse_list("a.test\n# comment\n\n b.test \nc.test # note\n"),
        vec!["a.test", "b.test", "c.test"]
    );
}

proptest! {
    #[test]
    fn add_domains_is_idempotent(
        list in prop::collection::vec("[a-z]{1,8}\\.(test|com)", 0..20),
        probes in prop::collection::vec("[a-z]{1,8}\\.(test|com)", 0..20),
    ) {
        let (registry, _) = registry_with(&["seed.test"]);
        registry.add_domains(&list);
        let first: Vec<bool> = probes.iter().map(|d| registry.is_disposable(d)).collect();
        let len = registry.snapshot().len();

        prop_assert_eq!(registry.add_domains(&list), 0);
        let second: Vec<bool> = probes.iter().map(|d| registry.is_disposable(d)).collect();
        prop_assert_eq!(first, second);
        prop_assert_eq!(registry.snapshot().len(), len);
        for domain in &list {
            prop_assert!(registry.is_disposable(domain));
        }
    }
}
