//! Tests for FileLock
//!
//! These tests verify:
//! - Exclusive ownership and release on drop
//! - Bounded retries ending in LockTimeout
//! - Waiting for a holder that releases within the budget
//! - A leftover lock file is not a held lock; a long hold is never stolen

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use votekv::ledger::FileLock;
use votekv::{RetryPolicy, VoteError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_resource() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cars.csv");
    (temp_dir, path)
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10))
}

fn lock_for(path: &Path) -> FileLock {
    FileLock::for_resource(path, fast_policy())
}

// =============================================================================
// Ownership Tests
// =============================================================================

#[test]
fn test_lock_file_named_after_resource() {
    let (_temp, path) = setup_temp_resource();
    let lock = lock_for(&path);

    assert_eq!(lock.path(), path.with_file_name("cars.csv.lock").as_path());
}

#[test]
fn test_acquire_holds_and_drop_releases() {
    let (_temp, path) = setup_temp_resource();
    let lock = lock_for(&path);

    let guard = lock.acquire().unwrap();
    assert!(lock.is_held());
    assert!(guard.path().exists());

    drop(guard);
    assert!(!lock.is_held());
    // The lock file stays; only the OS lock on it is released
    assert!(lock.path().exists());
}

#[test]
fn test_unused_lock_is_not_held() {
    let (_temp, path) = setup_temp_resource();
    let lock = lock_for(&path);

    assert!(!lock.is_held());
    assert!(!lock.path().exists());
}

#[test]
fn test_lock_file_holds_pid() {
    let (_temp, path) = setup_temp_resource();
    let lock = lock_for(&path);

    let _guard = lock.acquire().unwrap();
    let contents = fs::read_to_string(lock.path()).unwrap();

    assert_eq!(contents.trim(), std::process::id().to_string());
}

#[test]
fn test_second_holder_is_refused() {
    let (_temp, path) = setup_temp_resource();
    let first = lock_for(&path);
    let second = lock_for(&path);

    let _guard = first.acquire().unwrap();

    assert!(second.try_acquire().unwrap().is_none());
}

// =============================================================================
// Retry Tests
// =============================================================================

#[test]
fn test_acquire_times_out_after_budget() {
    let (_temp, path) = setup_temp_resource();
    let holder = lock_for(&path);
    let _guard = holder.acquire().unwrap();

    let start = Instant::now();
    let result = lock_for(&path).acquire();

    match result {
        Err(VoteError::LockTimeout { attempts, .. }) => assert_eq!(attempts, 4),
        other => panic!("expected LockTimeout, got {:?}", other),
    }
    // 3 retries x 10ms between 4 attempts
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_timeout_is_busy() {
    let (_temp, path) = setup_temp_resource();
    let _guard = lock_for(&path).acquire().unwrap();

    let err = lock_for(&path).acquire().unwrap_err();

    assert!(err.is_busy());
}

#[test]
fn test_acquire_waits_for_release() {
    let (_temp, path) = setup_temp_resource();
    let guard = lock_for(&path).acquire().unwrap();

    let patient = FileLock::for_resource(&path, RetryPolicy::new(50, Duration::from_millis(10)));

    let waiter = thread::spawn(move || patient.acquire().map(|_| ()));
    thread::sleep(Duration::from_millis(50));
    drop(guard);

    waiter.join().unwrap().unwrap();
}

#[test]
fn test_missing_directory_is_io_error() {
    let (temp, _) = setup_temp_resource();
    let path = temp.path().join("missing").join("cars.csv");

    let result = lock_for(&path).acquire();

    assert!(matches!(result, Err(VoteError::Io(_))));
}

// =============================================================================
// Leftover And Long-Held Lock Tests
// =============================================================================

#[test]
fn test_leftover_lock_file_is_not_held() {
    let (_temp, path) = setup_temp_resource();
    let lock = lock_for(&path);

    // Left behind by a holder that exited without cleaning up
    fs::write(lock.path(), "99999\n").unwrap();
    assert!(!lock.is_held());

    let guard = lock.acquire().unwrap();
    let contents = fs::read_to_string(guard.path()).unwrap();

    assert_eq!(contents.trim(), std::process::id().to_string());
}

#[test]
fn test_long_hold_is_never_taken_over() {
    let (_temp, path) = setup_temp_resource();
    let holder = lock_for(&path);
    let guard = holder.acquire().unwrap();

    // Several times the contender's whole retry budget
    let contender = lock_for(&path);
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(150) {
        assert!(contender.try_acquire().unwrap().is_none());
        thread::sleep(Duration::from_millis(10));
    }
    assert!(contender.acquire().unwrap_err().is_busy());

    drop(guard);
    let taken = contender.acquire().unwrap();

    // Releasing an old guard never touches the new holder's lock
    assert!(holder.is_held());
    drop(taken);
    assert!(!holder.is_held());
}

#[test]
fn test_holders_never_overlap() {
    let (_temp, path) = setup_temp_resource();
    let inside = Arc::new(AtomicBool::new(false));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            let inside = Arc::clone(&inside);
            thread::spawn(move || {
                let policy = RetryPolicy::new(1000, Duration::from_millis(2));
                let lock = FileLock::for_resource(&path, policy);
                for _ in 0..10 {
                    let _guard = lock.acquire().unwrap();
                    assert!(!inside.swap(true, Ordering::SeqCst), "two holders at once");
                    thread::sleep(Duration::from_millis(2));
                    inside.store(false, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}
