// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store adapter for semaphore backends
//!
//! The shared store is the single source of truth; no backend caches
//! occupancy across calls. Every trait method executes as one atomic step
//! against the store — backends never compose separate read-then-write
//! calls for mutations, which would reintroduce the races the atomicity
//! exists to prevent.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("wrong value type at key: {0}")]
    WrongType(String),
}

/// Remaining lifetime of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key does not exist
    Missing,
    /// Key exists but carries no expiry
    NoExpiry,
    /// Key expires after this many whole seconds
    Remaining(u64),
}

/// Atomic operations a semaphore backend may issue against the shared store
///
/// The `zset_*` methods mirror scripted transactions for the ordered
/// collection: purge, count, and conditional insert run as one step with
/// no interleaving. The plain key methods are each individually atomic;
/// create-if-absent arms its expiry in the same call.
#[async_trait]
pub trait SemaphoreStore: Clone + Send + Sync + 'static {
    // --- ordered-collection transactions (sorted-set backend) ---

    /// Purge entries scored before `now - ttl`, then insert `member` at
    /// score `now` and refresh the collection expiry — but only if fewer
    /// than `max_concurrent` entries remain after the purge. Returns
    /// whether the insert happened.
    async fn zset_try_acquire(
        &self,
        key: &str,
        member: &str,
        now: f64,
        ttl: Duration,
        max_concurrent: u32,
    ) -> Result<bool, StoreError>;

    /// Remove `member` from the collection, deleting the collection
    /// entirely when it empties. Returns whether an entry was removed.
    async fn zset_release(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Check that `member` is present and fresh, evicting it when its
    /// score is older than `now - ttl`. Returns whether the member holds.
    async fn zset_confirm(
        &self,
        key: &str,
        member: &str,
        now: f64,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Purge stale entries, then report the remaining entry count and the
    /// collection's own remaining expiry.
    async fn zset_occupancy(
        &self,
        key: &str,
        now: f64,
        ttl: Duration,
    ) -> Result<(u32, KeyTtl), StoreError>;

    /// Delete the collection outright. Returns whether it existed.
    async fn zset_clear(&self, key: &str) -> Result<bool, StoreError>;

    // --- single-key operations (slot-key backend) ---

    /// Create `key` holding `value` with the given expiry, only if the key
    /// is absent. Returns whether the create happened.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError>;

    /// Arm an expiry on an existing key. Returns false when the key is missing.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;
}
