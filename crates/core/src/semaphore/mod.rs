// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore capability contract and backend strategies
//!
//! This module provides:
//! - **Semaphore** - The contract every backend satisfies identically
//! - **SortedSetSemaphore** - One shared ordered collection per key
//! - **SlotKeySemaphore** - N independently-expiring slot keys (legacy)
//! - **AnySemaphore** - Tagged variant the factory hands out
//! - **SemaphoreFactory** - Parameter validation and backend selection

pub mod factory;
pub mod slot_key;
pub mod sorted_set;

pub use factory::SemaphoreFactory;
pub use slot_key::SlotKeySemaphore;
pub use sorted_set::SortedSetSemaphore;

use crate::clock::Clock;
use crate::error::SemaphoreError;
use crate::identity::HolderId;
use crate::retry::BackoffPolicy;
use crate::stats::Stats;
use crate::store::SemaphoreStore;
use async_trait::async_trait;
use std::time::Duration;

/// The capability contract every backend must satisfy identically
///
/// Contention never surfaces as an error: `acquire` and `release` answer
/// with booleans and absorb transient store failures. There is no FIFO
/// fairness among waiters — a later caller may win a slot freed while an
/// earlier caller sleeps in backoff.
#[async_trait]
pub trait Semaphore: Send + Sync {
    /// One non-blocking atomic acquisition attempt
    async fn try_acquire(&mut self) -> bool;

    /// Retry until a slot is obtained or `wait_budget` elapses, sleeping
    /// with capped backoff between attempts. A zero budget means exactly
    /// one attempt.
    async fn acquire(&mut self, wait_budget: Duration) -> bool;

    /// Release the held slot; only succeeds for the recorded owner.
    /// Safe to call twice — the second call returns false.
    async fn release(&mut self) -> bool;

    /// Reconfirm ownership against the store, evicting an expired own entry
    async fn is_acquired_by_me(&self) -> bool;

    /// Authoritative occupancy after purging stale entries
    async fn current_count(&self) -> u32;

    /// Point-in-time snapshot; the only operation that surfaces store
    /// failure as an error rather than degrading.
    async fn stats(&self) -> Result<Stats, SemaphoreError>;

    /// Delete every entry for this key (use with caution)
    async fn clear(&mut self) -> bool;

    /// Logical key, without the store prefix
    fn key(&self) -> &str;

    /// Derived store key, prefix included
    fn store_key(&self) -> &str;

    fn max_concurrent(&self) -> u32;

    fn ttl(&self) -> Duration;

    fn identifier(&self) -> &HolderId;
}

/// Bounded retry loop shared by both backends.
///
/// Elapsed time is checked before each attempt; the policy's attempt cap
/// bounds the loop even if the clock misbehaves.
pub(crate) async fn acquire_with_backoff<T: Semaphore + ?Sized>(
    sem: &mut T,
    wait_budget: Duration,
    policy: &BackoffPolicy,
) -> bool {
    if wait_budget.is_zero() {
        return sem.try_acquire().await;
    }

    let started = std::time::Instant::now();
    let mut attempt: u32 = 0;
    while started.elapsed() < wait_budget {
        attempt += 1;
        if attempt > policy.max_attempts {
            tracing::warn!(attempt, "acquire attempt cap reached");
            break;
        }
        if sem.try_acquire().await {
            tracing::debug!(attempt, "acquired");
            return true;
        }
        tokio::time::sleep(policy.delay(attempt)).await;
    }
    false
}

/// Backend handed out by the factory, one variant per configured kind
pub enum AnySemaphore<S: SemaphoreStore, C: Clock> {
    SortedSet(SortedSetSemaphore<S, C>),
    SlotKey(SlotKeySemaphore<S, C>),
}

#[async_trait]
impl<S: SemaphoreStore, C: Clock> Semaphore for AnySemaphore<S, C> {
    async fn try_acquire(&mut self) -> bool {
        match self {
            AnySemaphore::SortedSet(sem) => sem.try_acquire().await,
            AnySemaphore::SlotKey(sem) => sem.try_acquire().await,
        }
    }

    async fn acquire(&mut self, wait_budget: Duration) -> bool {
        match self {
            AnySemaphore::SortedSet(sem) => sem.acquire(wait_budget).await,
            AnySemaphore::SlotKey(sem) => sem.acquire(wait_budget).await,
        }
    }

    async fn release(&mut self) -> bool {
        match self {
            AnySemaphore::SortedSet(sem) => sem.release().await,
            AnySemaphore::SlotKey(sem) => sem.release().await,
        }
    }

    async fn is_acquired_by_me(&self) -> bool {
        match self {
            AnySemaphore::SortedSet(sem) => sem.is_acquired_by_me().await,
            AnySemaphore::SlotKey(sem) => sem.is_acquired_by_me().await,
        }
    }

    async fn current_count(&self) -> u32 {
        match self {
            AnySemaphore::SortedSet(sem) => sem.current_count().await,
            AnySemaphore::SlotKey(sem) => sem.current_count().await,
        }
    }

    async fn stats(&self) -> Result<Stats, SemaphoreError> {
        match self {
            AnySemaphore::SortedSet(sem) => sem.stats().await,
            AnySemaphore::SlotKey(sem) => sem.stats().await,
        }
    }

    async fn clear(&mut self) -> bool {
        match self {
            AnySemaphore::SortedSet(sem) => sem.clear().await,
            AnySemaphore::SlotKey(sem) => sem.clear().await,
        }
    }

    fn key(&self) -> &str {
        match self {
            AnySemaphore::SortedSet(sem) => sem.key(),
            AnySemaphore::SlotKey(sem) => sem.key(),
        }
    }

    fn store_key(&self) -> &str {
        match self {
            AnySemaphore::SortedSet(sem) => sem.store_key(),
            AnySemaphore::SlotKey(sem) => sem.store_key(),
        }
    }

    fn max_concurrent(&self) -> u32 {
        match self {
            AnySemaphore::SortedSet(sem) => sem.max_concurrent(),
            AnySemaphore::SlotKey(sem) => sem.max_concurrent(),
        }
    }

    fn ttl(&self) -> Duration {
        match self {
            AnySemaphore::SortedSet(sem) => sem.ttl(),
            AnySemaphore::SlotKey(sem) => sem.ttl(),
        }
    }

    fn identifier(&self) -> &HolderId {
        match self {
            AnySemaphore::SortedSet(sem) => sem.identifier(),
            AnySemaphore::SlotKey(sem) => sem.identifier(),
        }
    }
}
