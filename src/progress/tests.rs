//! Tests for progress reporting

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn test_progress_default() {
    let progress = Progress::new();
    let snapshot = progress.snapshot();
    assert_eq!(snapshot.total, 0);
    assert_eq!(snapshot.done, 0);
    assert_eq!(snapshot.pages, 0);
    assert!(snapshot.fraction.abs() < f32::EPSILON);
    assert!(!progress.is_cancelled());
}

#[test]
fn test_progress_work_accounting() {
    let progress = Progress::new();
    progress.add_work(4);
    progress.finish(1);
    assert!((progress.fraction() - 0.25).abs() < f32::EPSILON);

    progress.page_completed();
    assert_eq!(progress.pages_completed(), 1);
    assert_eq!(progress.snapshot().done, 2);

    // finishing more than expected clamps to the total
    progress.finish(10);
    assert_eq!(progress.snapshot().done, 4);
    assert!((progress.fraction() - 1.0).abs() < f32::EPSILON);

    progress.set_work(2);
    assert_eq!(progress.snapshot().done, 2);
}

#[test]
fn test_listener_fires_only_on_change() {
    let progress = Progress::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    progress.on_update(move |snapshot| sink.lock().unwrap().push(snapshot.fraction));

    progress.add_work(2); // 0.0
    progress.add_work(0); // unchanged
    progress.finish(1); // 0.5
    progress.finish(1); // 1.0
    progress.finish(1); // clamped, unchanged

    assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.5, 1.0]);
}

#[test]
fn test_listener_can_use_the_handle() {
    let progress = Progress::new();
    let late_calls = Arc::new(AtomicUsize::new(0));
    let handle = progress.clone();
    let counter = Arc::clone(&late_calls);
    progress.on_update(move |snapshot| {
        assert_eq!(handle.snapshot().done, snapshot.done);
        if snapshot.done == 1 {
            let counter = Arc::clone(&counter);
            handle.on_update(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
    });

    progress.add_work(4);
    progress.finish(1);
    progress.finish(1);

    assert_eq!(late_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_clones_share_state() {
    let progress = Progress::new();
    let clone = progress.clone();
    clone.add_work(3);
    clone.page_completed();
    assert_eq!(progress.pages_completed(), 1);

    clone.cancel();
    assert!(progress.is_cancelled());
}

#[tokio::test]
async fn test_cancelled_resolves_after_cancel() {
    let progress = Progress::new();
    let waiter = progress.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let handle = tokio::spawn(async move {
        waiter.cancelled().await;
        counter.fetch_add(1, Ordering::SeqCst);
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    progress.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("cancellation should wake the waiter")
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancelled_returns_immediately_when_already_cancelled() {
    let progress = Progress::new();
    progress.cancel();
    tokio::time::timeout(Duration::from_millis(100), progress.cancelled())
        .await
        .expect("already cancelled");
}
