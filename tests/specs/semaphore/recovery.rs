//! Crash-recovery and degraded-store specs

use crate::prelude::*;
use gate_adapters::FlakyStore;

#[tokio::test]
async fn crashed_holder_expires_and_frees_its_slot() {
    for kind in KINDS {
        let (factory, _, clock) = fixture(kind);
        let ttl = Duration::from_secs(30);
        let mut crashed = factory.create("jobs", 1, ttl).unwrap();
        assert!(crashed.try_acquire().await, "{kind}");

        // The holder dies without releasing; nobody gets in before expiry
        let mut waiter = factory.create("jobs", 1, ttl).unwrap();
        assert!(!waiter.try_acquire().await, "{kind}: slot still held");

        clock.advance(Duration::from_secs(31));
        assert!(!crashed.is_acquired_by_me().await, "{kind}: lease lapsed");
        assert!(waiter.try_acquire().await, "{kind}: slot recovered");
    }
}

#[tokio::test]
async fn expiry_is_per_holder_not_per_key() {
    let (factory, _, clock) = fixture(BackendKind::SortedSet);
    let ttl = Duration::from_secs(30);
    let mut early = factory.create("jobs", 2, ttl).unwrap();
    assert!(early.try_acquire().await);

    clock.advance(Duration::from_secs(20));
    let mut late = factory.create("jobs", 2, ttl).unwrap();
    assert!(late.try_acquire().await);

    // 31s after the first acquisition only the early holder has lapsed
    clock.advance(Duration::from_secs(11));
    assert!(!early.is_acquired_by_me().await);
    assert!(late.is_acquired_by_me().await);
    assert_eq!(late.current_count().await, 1);
}

#[tokio::test]
async fn staggered_slot_leases_lapse_independently() {
    let (factory, _, clock) = fixture(BackendKind::SlotKey);
    let ttl = Duration::from_secs(30);
    let mut early = factory.create("jobs", 2, ttl).unwrap();
    assert!(early.try_acquire().await);

    clock.advance(Duration::from_secs(20));
    let mut late = factory.create("jobs", 2, ttl).unwrap();
    assert!(late.try_acquire().await);

    clock.advance(Duration::from_secs(11));
    assert!(!early.is_acquired_by_me().await);
    assert!(late.is_acquired_by_me().await);
    assert_eq!(late.current_count().await, 1);
}

#[tokio::test]
async fn transient_store_outage_is_absorbed_by_bounded_wait() {
    for kind in KINDS {
        let clock = FakeClock::new();
        let flaky = FlakyStore::new(MemoryStore::with_clock(clock.clone()));
        let factory = SemaphoreFactory::with_clock(flaky.clone(), clock, kind)
            .with_backoff(fast_backoff());
        let mut sem = factory.create("jobs", 1, TTL).unwrap();

        // First attempt hits the outage and degrades to false; the retry
        // loop rides through it.
        flaky.fail_next(1);
        assert!(
            sem.acquire(Duration::from_millis(500)).await,
            "{kind}: retry should outlast the outage"
        );
        assert_eq!(flaky.pending_failures(), 0, "{kind}");
    }
}

#[tokio::test]
async fn outage_during_single_attempt_degrades_to_false() {
    for kind in KINDS {
        let clock = FakeClock::new();
        let flaky = FlakyStore::new(MemoryStore::with_clock(clock.clone()));
        let factory = SemaphoreFactory::with_clock(flaky.clone(), clock, kind)
            .with_backoff(fast_backoff());
        let mut sem = factory.create("jobs", 1, TTL).unwrap();

        flaky.fail_next(10);
        assert!(!sem.try_acquire().await, "{kind}: no slot during outage");
    }
}
