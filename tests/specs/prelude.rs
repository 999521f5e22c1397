//! Shared fixtures for the spec suite

pub use gate_core::{
    AnySemaphore, BackendKind, BackoffPolicy, FakeClock, MemoryStore, Semaphore, SemaphoreFactory,
};
pub use std::time::Duration;

pub type SpecStore = MemoryStore<FakeClock>;
pub type SpecFactory = SemaphoreFactory<SpecStore, FakeClock>;
pub type SpecSemaphore = AnySemaphore<SpecStore, FakeClock>;

pub const TTL: Duration = Duration::from_secs(60);

/// Both backend kinds; cross-backend specs run against each in turn.
pub const KINDS: [BackendKind; 2] = [BackendKind::SortedSet, BackendKind::SlotKey];

/// Factory over a fresh in-memory store, with delays shrunk so bounded
/// waits resolve in milliseconds.
pub fn fixture(kind: BackendKind) -> (SpecFactory, SpecStore, FakeClock) {
    let clock = FakeClock::new();
    let store = MemoryStore::with_clock(clock.clone());
    let factory = SemaphoreFactory::with_clock(store.clone(), clock.clone(), kind)
        .with_backoff(fast_backoff());
    (factory, store, clock)
}

pub fn fast_backoff() -> BackoffPolicy {
    BackoffPolicy {
        step: Duration::from_millis(5),
        max_delay: Duration::from_millis(10),
        max_attempts: 1000,
    }
}
