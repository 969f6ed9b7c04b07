//! transact: generation monotonicity, retry exhaustion, failure propagation

use super::test_utils::*;
use recmap::{Error, Generation, Key, RetryConfig, Session, StoreClient};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn counter_key() -> Key {
    Key::new("test", "counters", 1i64)
}

fn seed(session: &Session) {
    let mut c = Counter {
        id: 1,
        hits: 0,
        generation: 0,
    };
    session.insert(&mut c).unwrap();
}

fn increment(session: &Session, max_retries: usize) -> recmap::Result<Key> {
    session.transact(max_retries, |ctx| {
        let mut c: Counter = ctx.get_by(1i64)?.unwrap_or_default();
        c.id = 1;
        c.hits += 1;
        ctx.put(&mut c)
    })
}

// ============================================================================
// Generation monotonicity
// ============================================================================

#[test]
fn test_sequential_increments_each_bump_generation_once() {
    let f = Fixture::new(0);
    seed(&f.session);

    let n = 100;
    let mut last = Generation::new(1);
    for _ in 0..n {
        increment(&f.session, 5).unwrap();
        let record = f.store.get(&counter_key()).unwrap().unwrap();
        assert_eq!(record.generation, last.next());
        last = record.generation;
    }

    let c: Counter = f.session.load(&counter_key()).unwrap().unwrap();
    assert_eq!(c.hits, n as i64);
    assert_eq!(c.generation, 1 + n as i64);
    assert_eq!(f.session.metrics().commits, n);
    assert_eq!(f.session.metrics().conflicts, 0);
}

#[test]
fn test_concurrent_increments_are_never_lost() {
    let f = Fixture::new(0);
    seed(&f.session);
    let session = Arc::new(f.session);

    let threads = 4;
    let per_thread = 25;
    let barrier = Arc::new(Barrier::new(threads));
    let committed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let session = Arc::clone(&session);
            let barrier = Arc::clone(&barrier);
            let committed = Arc::clone(&committed);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..per_thread {
                    match increment(&session, 5) {
                        Ok(_) => {
                            committed.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(Error::ConcurrencyExhausted { attempts, .. }) => {
                            assert_eq!(attempts, 6);
                        }
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let committed = committed.load(Ordering::SeqCst);
    assert!(committed > 0);
    let c: Counter = session.load(&counter_key()).unwrap().unwrap();
    assert_eq!(c.hits, committed as i64);
    assert_eq!(c.generation, 1 + committed as i64);
}

#[test]
fn test_concurrent_increments_with_ample_budget_all_commit() {
    let f = Fixture::new(0);
    seed(&f.session);
    let session = Arc::new(f.session);

    let threads = 4;
    let per_thread = 25;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let session = Arc::clone(&session);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..per_thread {
                    increment(&session, 10_000).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let total = (threads * per_thread) as i64;
    let c: Counter = session.load(&counter_key()).unwrap().unwrap();
    assert_eq!(c.hits, total);
    assert_eq!(c.generation, 1 + total);
    assert_eq!(session.metrics().commits, total as u64);
}

// ============================================================================
// Retry exhaustion
// ============================================================================

#[test]
fn test_permanent_contention_exhausts_after_max_retries_plus_one() {
    let f = Fixture::new(0);
    seed(&f.session);
    let runs = AtomicUsize::new(0);

    let err = f
        .session
        .transact(5, |ctx| {
            runs.fetch_add(1, Ordering::SeqCst);
            let mut mine: Counter = ctx.get_by(1i64)?.unwrap_or_default();

            // A competing writer lands between the read and the write
            let mut theirs = Counter {
                id: 1,
                hits: 1_000,
                generation: 0,
            };
            f.session.update(&mut theirs)?;

            mine.hits += 1;
            ctx.put(&mut mine)
        })
        .unwrap_err();

    assert_eq!(runs.load(Ordering::SeqCst), 6);
    match err {
        Error::ConcurrencyExhausted { attempts, key } => {
            assert_eq!(attempts, 6);
            assert_eq!(key, Some(counter_key()));
        }
        other => panic!("expected ConcurrencyExhausted, got {}", other),
    }

    // Only the competing writes landed
    let c: Counter = f.session.load(&counter_key()).unwrap().unwrap();
    assert_eq!(c.hits, 1_000);
    assert_eq!(c.generation, 1 + 6);
    assert_eq!(f.session.metrics().exhausted, 1);
}

#[test]
fn test_zero_retries_runs_once() {
    let f = Fixture::new(0);
    seed(&f.session);
    let runs = AtomicUsize::new(0);

    let err = f
        .session
        .transact(0, |ctx| {
            runs.fetch_add(1, Ordering::SeqCst);
            let mut mine: Counter = ctx.get_by(1i64)?.unwrap_or_default();
            f.session.update(&mut Counter {
                id: 1,
                hits: 5,
                generation: 0,
            })?;
            ctx.put(&mut mine)
        })
        .unwrap_err();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(matches!(err, Error::ConcurrencyExhausted { attempts: 1, .. }));
}

#[test]
fn test_transient_conflict_then_success() {
    let f = Fixture::new(0);
    seed(&f.session);
    let runs = AtomicUsize::new(0);

    f.session
        .transact(5, |ctx| {
            let run = runs.fetch_add(1, Ordering::SeqCst);
            let mut mine: Counter = ctx.get_by(1i64)?.unwrap_or_default();
            if run < 2 {
                f.session.update(&mut Counter {
                    id: 1,
                    hits: 100,
                    generation: 0,
                })?;
            }
            mine.hits += 1;
            ctx.put(&mut mine)
        })
        .unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 3);
    let c: Counter = f.session.load(&counter_key()).unwrap().unwrap();
    assert_eq!(c.hits, 101, "third attempt saw the competing value");
    let metrics = f.session.metrics();
    assert_eq!(metrics.conflicts, 2);
    assert_eq!(metrics.commits, 1);
}

// ============================================================================
// Failures that are not retried
// ============================================================================

#[test]
fn test_mapping_error_inside_transact_is_not_retried() {
    let f = Fixture::new(0);
    let runs = AtomicUsize::new(0);

    let err = f
        .session
        .transact(5, |ctx| {
            runs.fetch_add(1, Ordering::SeqCst);
            let mut p = Profile::new("bad");
            p.expires_at = DAY_MS;
            ctx.put(&mut p)
        })
        .unwrap_err();

    assert!(err.is_mapping());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(f.store.is_empty());
}

#[test]
fn test_store_error_inside_transact_is_not_retried() {
    let f = Fixture::new(0);
    let runs = AtomicUsize::new(0);

    let err = f
        .session
        .transact(5, |ctx| {
            runs.fetch_add(1, Ordering::SeqCst);
            let key = Key::new("missing", "counters", 1i64);
            ctx.get::<Counter>(&key)
        })
        .unwrap_err();

    assert!(matches!(err, Error::NamespaceNotFound { .. }));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transact_default_uses_configured_budget() {
    let f = Fixture::new(0);
    let session = Session::builder(f.store.clone())
        .config(recmap::SessionConfig {
            max_retries: 2,
            ..recmap::SessionConfig::default()
        })
        .build()
        .unwrap();
    seed(&session);
    let runs = AtomicUsize::new(0);

    let err = session
        .transact_default(|ctx| {
            runs.fetch_add(1, Ordering::SeqCst);
            let mut mine: Counter = ctx.get_by(1i64)?.unwrap_or_default();
            session.update(&mut Counter {
                id: 1,
                hits: 9,
                generation: 0,
            })?;
            ctx.put(&mut mine)
        })
        .unwrap_err();

    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert!(matches!(err, Error::ConcurrencyExhausted { attempts: 3, .. }));
    assert_eq!(RetryConfig::default().max_retries, 5);
}
