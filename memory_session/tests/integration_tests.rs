//! Integration tests for the quota-accounted allocation session

use core_types::{CacheAttribute, SessionLabel};
use memory_session::testing::SimPhysAllocator;
use memory_session::{MemorySession, SessionConfig, SessionError, Synced};
use std::sync::Arc;
use std::thread;

type SharedSession = Arc<Synced<MemorySession<SimPhysAllocator>>>;

fn shared_session(quota: u64) -> SharedSession {
    Arc::new(Synced::new(MemorySession::new(
        SimPhysAllocator::with_capacity(u64::MAX),
        SessionConfig::new(quota).with_label(SessionLabel::core()),
    )))
}

#[test]
fn test_quota_boundary_sequence() {
    let session = shared_session(4096);

    session
        .alloc(4096, CacheAttribute::Uncached)
        .expect("fills the quota exactly");
    assert_eq!(session.used(), 4096);

    let err = session
        .alloc(1, CacheAttribute::Uncached)
        .expect_err("one byte over");
    assert!(matches!(err, SessionError::QuotaExceeded { .. }));
    assert_eq!(session.used(), 4096);
}

#[test]
fn test_concurrent_alloc_free_balances_to_zero() {
    const THREADS: u64 = 8;
    const ROUNDS: u64 = 50;
    const BLOCK: u64 = 64;

    let session = shared_session(THREADS * BLOCK);

    let mut workers = Vec::new();
    for _ in 0..THREADS {
        let session = session.clone();
        workers.push(thread::spawn(move || {
            for _ in 0..ROUNDS {
                let ds = session
                    .alloc(BLOCK, CacheAttribute::Cached)
                    .expect("every thread's block fits the quota");
                session.free(ds).expect("own dataspace");
            }
        }));
    }
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    assert_eq!(session.used(), 0);
    assert_eq!(session.quota(), THREADS * BLOCK);
    assert_eq!(session.with(|s| s.dataspace_count()), 0);
}

#[test]
fn test_concurrent_allocs_admit_exactly_quota() {
    const CONTENDERS: u64 = 16;
    const BLOCK: u64 = 512;
    const ADMITTED: u64 = 4;

    let session = shared_session(ADMITTED * BLOCK);

    let mut workers = Vec::new();
    for _ in 0..CONTENDERS {
        let session = session.clone();
        workers.push(thread::spawn(move || {
            session.alloc(BLOCK, CacheAttribute::Cached).is_ok()
        }));
    }

    let successes = workers
        .into_iter()
        .map(|w| w.join().expect("worker panicked"))
        .filter(|ok| *ok)
        .count() as u64;

    // No interleaving may lose an update or admit a torn counter: exactly
    // the quota's worth of blocks succeeds.
    assert_eq!(successes, ADMITTED);
    assert_eq!(session.used(), ADMITTED * BLOCK);
}

#[test]
fn test_concurrent_transfers_conserve_total_quota() {
    const ROUNDS: usize = 200;
    const TOTAL: u64 = 8192;

    let a = shared_session(TOTAL);
    let b = shared_session(0);

    let forward = {
        let (a, b) = (a.clone(), b.clone());
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                let _ = a.transfer_quota(&b, 64);
            }
        })
    };
    let backward = {
        let (a, b) = (a.clone(), b.clone());
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                let _ = b.transfer_quota(&a, 64);
            }
        })
    };

    forward.join().expect("forward panicked");
    backward.join().expect("backward panicked");

    assert_eq!(a.quota() + b.quota(), TOTAL);
    assert_eq!(a.used(), 0);
    assert_eq!(b.used(), 0);
}

#[test]
fn test_concurrent_mixed_operations_linearize() {
    const THREADS: u64 = 6;
    const ROUNDS: u64 = 30;
    const BLOCK: u64 = 128;
    const TOTAL: u64 = THREADS * BLOCK * 2;

    let main = shared_session(TOTAL);
    let side = shared_session(0);

    let mut workers = Vec::new();
    for t in 0..THREADS {
        let main = main.clone();
        let side = side.clone();
        workers.push(thread::spawn(move || {
            for _ in 0..ROUNDS {
                if t % 2 == 0 {
                    if let Ok(ds) = main.alloc(BLOCK, CacheAttribute::Cached) {
                        main.free(ds).expect("own dataspace");
                    }
                } else if main.transfer_quota(&side, BLOCK).is_ok() {
                    side.transfer_quota(&main, BLOCK)
                        .expect("side holds at least the transferred headroom");
                }
            }
        }));
    }
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    // Every alloc was freed and every transfer was returned: the end state
    // must match the sequential identity.
    assert_eq!(main.used(), 0);
    assert_eq!(main.quota() + side.quota(), TOTAL);
    assert_eq!(side.used(), 0);
}

#[test]
fn test_parent_child_quota_donation() {
    let parent = shared_session(1 << 20);
    let child = shared_session(0);

    child.ref_account(&parent).expect("link child to parent");
    parent
        .transfer_quota(&child, 1 << 16)
        .expect("donate within headroom");

    assert_eq!(child.quota(), 1 << 16);
    child
        .alloc(1 << 16, CacheAttribute::Cached)
        .expect("child spends the donated quota");
    assert_eq!(child.used(), 1 << 16);

    // The child cannot return quota it has already spent.
    let err = child
        .transfer_quota(&parent, 1)
        .expect_err("no headroom left");
    assert!(matches!(err, SessionError::InsufficientHeadroom { .. }));
}

#[test]
fn test_audit_log_reflects_quota_rejections() {
    let session = shared_session(1024);
    session
        .alloc(1024, CacheAttribute::Cached)
        .expect("within quota");
    let _ = session.alloc(1, CacheAttribute::Cached);
    let _ = session.alloc(1, CacheAttribute::Cached);

    assert_eq!(session.with(|s| s.audit().exceeded_count()), 2);
    let id = session.session_id();
    assert!(session.with(|s| !s.audit().entries_for(id).is_empty()));
}
