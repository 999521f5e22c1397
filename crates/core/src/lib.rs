//! gate-core: Core library for the gate distributed semaphore
//!
//! This crate provides:
//! - A polymorphic semaphore capability backed by a shared external store
//! - Two interchangeable backend strategies (sorted-set and slot-key)
//! - A validating factory bound to one backend kind per process
//! - Caller-side bounded acquisition with a capped backoff policy

pub mod clock;
pub mod identity;

pub mod error;
pub mod retry;
pub mod stats;
pub mod store;

pub mod semaphore;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::SemaphoreError;
pub use identity::{HolderId, IdentifierGenerator};
pub use retry::{scoped_key, BackoffPolicy, RedispatchPolicy, RetryDecision};
pub use stats::{BackendKind, Stats};
pub use store::{KeyTtl, MemoryStore, SemaphoreStore, StoreError};

pub use semaphore::{
    AnySemaphore, Semaphore, SemaphoreFactory, SlotKeySemaphore, SortedSetSemaphore,
};
