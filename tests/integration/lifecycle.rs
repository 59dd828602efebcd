//! Monitor lifecycle: start / stop / restart / list / remove / shutdown.

use crate::helpers::{
    FailingStore, GLEAM_URL, GatedSource, RecordingNotifier, ScriptedSource, TestClock, at, issue,
    wait_until,
};
use issue_net::{
    InMemoryMonitorStore, Monitor, MonitorError, MonitorManager, MonitorSpec, MonitorStatus,
    MonitorStore,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Long enough that only the immediate first cycle runs during a test.
const SLOW_POLL: Duration = Duration::from_secs(3600);

struct Fixture {
    store: Arc<InMemoryMonitorStore>,
    source: Arc<ScriptedSource>,
    notifier: Arc<RecordingNotifier>,
    clock: TestClock,
    manager: Arc<MonitorManager>,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryMonitorStore::new());
    let source = ScriptedSource::new();
    let notifier = RecordingNotifier::new();
    let clock = TestClock::new(at(1, 0, 0));
    let manager = Arc::new(
        MonitorManager::new(store.clone(), source.clone(), notifier.clone())
            .with_poll_interval(SLOW_POLL)
            .with_clock(clock.clock()),
    );
    Fixture {
        store,
        source,
        notifier,
        clock,
        manager,
    }
}

fn gleam_spec(name: &str) -> MonitorSpec {
    MonitorSpec::new(name, GLEAM_URL, "123456789").with_checkpoint(at(0, 0, 0))
}

#[tokio::test]
async fn start_persists_running_monitor_and_polls_immediately() {
    let f = fixture();
    f.manager.start(gleam_spec("gleam-issues")).await.unwrap();

    let saved = f.store.get("gleam-issues").unwrap().unwrap();
    assert_eq!(saved.status, MonitorStatus::Running);
    assert_eq!(saved.checkpoint, at(0, 0, 0));
    assert_eq!(saved.destination, "123456789");
    assert!(f.manager.is_active("gleam-issues"));

    wait_until("first poll", || f.source.call_count() >= 1).await;
    let (repo, filter) = f.source.calls().remove(0);
    assert_eq!(repo.to_string(), "gleam-lang/gleam");
    assert_eq!(filter.since, Some(at(0, 0, 0)));

    f.manager.shutdown().await;
}

#[tokio::test]
async fn duplicate_name_is_rejected_while_running() {
    let f = fixture();
    f.manager.start(gleam_spec("gleam-issues")).await.unwrap();

    let err = f
        .manager
        .start(MonitorSpec::new("gleam-issues", "https://github.com/rust-lang/rust", "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, MonitorError::DuplicateMonitorName { ref name } if name == "gleam-issues"));

    // The first record is untouched.
    let saved = f.store.get("gleam-issues").unwrap().unwrap();
    assert_eq!(saved.url, GLEAM_URL);
    assert_eq!(f.manager.active_names(), vec!["gleam-issues".to_owned()]);

    f.manager.shutdown().await;
}

#[tokio::test]
async fn duplicate_name_is_rejected_for_stopped_record() {
    let f = fixture();
    f.manager.start(gleam_spec("gleam-issues")).await.unwrap();
    f.manager.stop("gleam-issues").await.unwrap();

    let err = f.manager.start(gleam_spec("gleam-issues")).await.unwrap_err();
    assert!(matches!(err, MonitorError::DuplicateMonitorName { .. }));
    assert!(!f.manager.is_active("gleam-issues"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_with_same_name_admit_exactly_one() {
    let f = fixture();
    let starts = (0..8).map(|_| {
        let manager = f.manager.clone();
        tokio::spawn(async move { manager.start(gleam_spec("race")).await })
    });
    let results = futures_util::future::join_all(starts).await;

    let ok = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(()))))
        .count();
    let dup = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(MonitorError::DuplicateMonitorName { .. }))))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(dup, 7);
    assert_eq!(f.manager.active_names(), vec!["race".to_owned()]);

    f.manager.shutdown().await;
}

#[tokio::test]
async fn invalid_url_writes_nothing() {
    let f = fixture();
    for url in ["https://gitlab.com/a/b", "https://github.com/only-owner", "not a url at all"] {
        let err = f
            .manager
            .start(MonitorSpec::new("bad", url, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::InvalidUrl { .. }), "{url}");
    }
    assert!(f.store.get_all().unwrap().is_empty());
    assert!(f.manager.active_names().is_empty());
}

#[tokio::test]
async fn stop_unknown_monitor_leaves_others_running() {
    let f = fixture();
    f.manager.start(gleam_spec("a")).await.unwrap();

    let err = f.manager.stop("nope").await.unwrap_err();
    assert!(matches!(err, MonitorError::MonitorNotFound { ref name } if name == "nope"));
    assert!(f.manager.is_active("a"));
    assert_eq!(
        f.store.get("a").unwrap().unwrap().status,
        MonitorStatus::Running
    );

    f.manager.shutdown().await;
}

#[tokio::test]
async fn stop_persists_stopped_and_clears_active_entry() {
    let f = fixture();
    f.manager.start(gleam_spec("a")).await.unwrap();
    f.manager.stop("a").await.unwrap();

    assert!(!f.manager.is_active("a"));
    assert!(f.manager.active_names().is_empty());
    assert_eq!(
        f.store.get("a").unwrap().unwrap().status,
        MonitorStatus::Stopped
    );

    // Stopping twice reports the missing task.
    let err = f.manager.stop("a").await.unwrap_err();
    assert!(matches!(err, MonitorError::MonitorNotFound { .. }));
}

#[tokio::test]
async fn stop_during_fetch_is_the_last_write() {
    let store = Arc::new(InMemoryMonitorStore::new());
    let source = GatedSource::new(vec![issue(1, "Late arrival")]);
    let notifier = RecordingNotifier::new();
    let clock = TestClock::new(at(1, 0, 0));
    let manager = MonitorManager::new(store.clone(), source.clone(), notifier.clone())
        .with_poll_interval(SLOW_POLL)
        .with_clock(clock.clock());

    manager.start(gleam_spec("gleam-issues")).await.unwrap();
    wait_until("fetch in flight", || source.started()).await;

    tokio::time::timeout(Duration::from_secs(1), manager.stop("gleam-issues"))
        .await
        .expect("stop must not wait for the pending fetch")
        .unwrap();
    assert!(!manager.is_active("gleam-issues"));

    // Let the abandoned fetch "complete"; the task is already gone.
    source.release();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let saved = store.get("gleam-issues").unwrap().unwrap();
    assert_eq!(saved.status, MonitorStatus::Stopped);
    assert_eq!(saved.checkpoint, at(0, 0, 0));
    assert!(notifier.deliveries().is_empty());
}

#[tokio::test]
async fn restart_resumes_from_persisted_checkpoint() {
    let f = fixture();
    f.source.push(Ok(vec![issue(1, "Crash"), issue(2, "Typo")]));
    f.clock.set(at(1, 0, 0));

    f.manager.start(gleam_spec("gleam-issues")).await.unwrap();
    wait_until("first delivery", || f.notifier.deliveries().len() == 1).await;
    wait_until("checkpoint persisted", || {
        f.store.get("gleam-issues").unwrap().unwrap().checkpoint == at(1, 0, 0)
    })
    .await;

    f.manager.stop("gleam-issues").await.unwrap();
    f.manager.restart("gleam-issues").await.unwrap();

    assert!(f.manager.is_active("gleam-issues"));
    assert_eq!(
        f.store.get("gleam-issues").unwrap().unwrap().status,
        MonitorStatus::Running
    );
    wait_until("poll after restart", || f.source.call_count() == 2).await;
    assert_eq!(f.source.calls()[1].1.since, Some(at(1, 0, 0)));

    f.manager.shutdown().await;
}

#[tokio::test]
async fn restart_unknown_monitor_is_not_found() {
    let f = fixture();
    let err = f.manager.restart("ghost").await.unwrap_err();
    assert!(matches!(err, MonitorError::MonitorNotFound { .. }));
    assert!(f.manager.active_names().is_empty());
}

#[tokio::test]
async fn restart_of_running_monitor_is_a_no_op() {
    let f = fixture();
    f.manager.start(gleam_spec("a")).await.unwrap();
    f.manager.restart("a").await.unwrap();
    f.manager.restart("a").await.unwrap();
    assert_eq!(f.manager.active_names(), vec!["a".to_owned()]);
    f.manager.shutdown().await;
}

#[tokio::test]
async fn list_filters_by_status() {
    let f = fixture();
    f.manager.start(gleam_spec("a")).await.unwrap();
    f.manager.start(gleam_spec("b")).await.unwrap();
    f.manager.stop("b").await.unwrap();

    let names = |ms: Vec<issue_net::Monitor>| ms.into_iter().map(|m| m.name).collect::<Vec<_>>();
    assert_eq!(names(f.manager.list(None).await.unwrap()), vec!["a", "b"]);
    assert_eq!(
        names(f.manager.list(Some(MonitorStatus::Running)).await.unwrap()),
        vec!["a"]
    );
    assert_eq!(
        names(f.manager.list(Some(MonitorStatus::Stopped)).await.unwrap()),
        vec!["b"]
    );
    assert!(f
        .manager
        .list(Some(MonitorStatus::Error))
        .await
        .unwrap()
        .is_empty());

    f.manager.shutdown().await;
}

#[tokio::test]
async fn remove_stops_and_deletes() {
    let f = fixture();
    f.manager.start(gleam_spec("a")).await.unwrap();
    f.manager.remove("a").await.unwrap();

    assert!(!f.manager.is_active("a"));
    assert!(f.store.get("a").unwrap().is_none());

    let err = f.manager.remove("a").await.unwrap_err();
    assert!(matches!(err, MonitorError::MonitorNotFound { .. }));
}

#[tokio::test]
async fn shutdown_keeps_running_status_for_recovery() {
    let f = fixture();
    f.manager.start(gleam_spec("a")).await.unwrap();
    f.manager.start(gleam_spec("b")).await.unwrap();

    f.manager.shutdown().await;

    assert!(f.manager.active_names().is_empty());
    let statuses: Vec<_> = f
        .store
        .get_all()
        .unwrap()
        .into_iter()
        .map(|m| m.status)
        .collect();
    assert_eq!(statuses, vec![MonitorStatus::Running, MonitorStatus::Running]);
}

#[test]
fn start_without_runtime_marks_monitor_error() {
    let store = Arc::new(InMemoryMonitorStore::new());
    let manager = MonitorManager::new(
        store.clone(),
        ScriptedSource::new(),
        RecordingNotifier::new(),
    );

    let err = futures::executor::block_on(manager.start(gleam_spec("a"))).unwrap_err();
    assert!(matches!(err, MonitorError::TaskStart { ref name, .. } if name == "a"));
    assert_eq!(store.get("a").unwrap().unwrap().status, MonitorStatus::Error);
    assert!(!manager.is_active("a"));
}

#[test]
fn restart_without_runtime_marks_monitor_error() {
    let store = Arc::new(InMemoryMonitorStore::new());
    store
        .put(&Monitor {
            name: "a".into(),
            url: GLEAM_URL.into(),
            checkpoint: at(0, 0, 0),
            filter: None,
            status: MonitorStatus::Stopped,
            destination: "1".into(),
        })
        .unwrap();
    let manager = MonitorManager::new(
        store.clone(),
        ScriptedSource::new(),
        RecordingNotifier::new(),
    );

    let err = futures::executor::block_on(manager.restart("a")).unwrap_err();
    assert!(matches!(err, MonitorError::TaskStart { ref name, .. } if name == "a"));
    let saved = store.get("a").unwrap().unwrap();
    assert_eq!(saved.status, MonitorStatus::Error);
    assert_eq!(saved.checkpoint, at(0, 0, 0));
    assert!(!manager.is_active("a"));
}

#[tokio::test]
async fn store_failures_surface_as_store_errors() {
    let store = FailingStore::new();
    let manager = MonitorManager::new(store.clone(), ScriptedSource::new(), RecordingNotifier::new())
        .with_poll_interval(SLOW_POLL);

    store.fail_put.store(true, Ordering::SeqCst);
    let err = manager.start(gleam_spec("a")).await.unwrap_err();
    assert!(matches!(err, MonitorError::Store(ref e) if e.operation == "put"));
    assert!(!manager.is_active("a"));
    store.fail_put.store(false, Ordering::SeqCst);

    store.fail_get_all.store(true, Ordering::SeqCst);
    let err = manager.list(None).await.unwrap_err();
    assert!(matches!(err, MonitorError::Store(ref e) if e.operation == "get_all"));
}

#[tokio::test]
async fn restart_rolls_back_task_when_status_write_fails() {
    let store = FailingStore::new();
    let manager = MonitorManager::new(store.clone(), ScriptedSource::new(), RecordingNotifier::new())
        .with_poll_interval(SLOW_POLL);

    manager.start(gleam_spec("a")).await.unwrap();
    manager.stop("a").await.unwrap();

    store.fail_status.store(true, Ordering::SeqCst);
    let err = manager.restart("a").await.unwrap_err();
    assert!(matches!(err, MonitorError::Store(_)));
    assert!(!manager.is_active("a"));
    assert!(manager.active_names().is_empty());
}
