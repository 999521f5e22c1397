// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slot-key semaphore backend (legacy strategy)
//!
//! Maintains `max_concurrent` independently-expiring keys, one per slot,
//! each guarded by an atomic create-if-absent-with-expiry. Needs no
//! scripted execution, at the cost of O(max_concurrent) keys and a linear
//! scan per attempt. Kept because some deployments cannot run scripts;
//! it satisfies the same contract and invariants as the sorted-set
//! strategy.

use super::Semaphore;
use crate::clock::{Clock, SystemClock};
use crate::error::SemaphoreError;
use crate::identity::{HolderId, IdentifierGenerator};
use crate::retry::BackoffPolicy;
use crate::stats::{BackendKind, Stats};
use crate::store::{KeyTtl, SemaphoreStore, StoreError};
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

/// Store key prefix for slot-key semaphores
const KEY_PREFIX: &str = "semaphore-legacy:";

/// Semaphore backed by one key per concurrency slot
pub struct SlotKeySemaphore<S: SemaphoreStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    key: String,
    store_key: String,
    max_concurrent: u32,
    ttl: Duration,
    identifier: HolderId,
    backoff: BackoffPolicy,
    /// Slot this handle owns, if any
    slot_index: Option<u32>,
}

impl<S: SemaphoreStore, C: Clock> SlotKeySemaphore<S, C> {
    pub fn new(
        store: S,
        clock: C,
        key: impl Into<String>,
        max_concurrent: u32,
        ttl: Duration,
    ) -> Self {
        let key = key.into();
        let store_key = format!("{KEY_PREFIX}{key}");
        let identifier = IdentifierGenerator.generate(&clock);
        Self {
            store,
            clock,
            key,
            store_key,
            max_concurrent,
            ttl,
            identifier,
            backoff: BackoffPolicy::default(),
            slot_index: None,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Index of the slot this handle owns, if acquired
    pub fn slot_index(&self) -> Option<u32> {
        self.slot_index
    }

    /// Store key for a specific slot index
    pub fn slot_store_key(&self, slot: u32) -> String {
        format!("{}{}", self.store_key, slot)
    }

    /// Re-arm any slot key that exists without an expiry. A key created
    /// by a writer that died between create and expire would otherwise
    /// occupy its slot forever.
    async fn heal_bare_slots(&self) -> Result<(), StoreError> {
        for slot in 0..self.max_concurrent {
            let slot_key = self.slot_store_key(slot);
            if self.store.ttl(&slot_key).await? == KeyTtl::NoExpiry {
                self.store.expire(&slot_key, self.ttl).await?;
                tracing::warn!(key = %slot_key, "armed expiry on bare slot key");
            }
        }
        Ok(())
    }

    async fn occupied_slots(&self) -> Result<Vec<u32>, StoreError> {
        let mut occupied = Vec::new();
        for slot in 0..self.max_concurrent {
            if self.store.exists(&self.slot_store_key(slot)).await? {
                occupied.push(slot);
            }
        }
        Ok(occupied)
    }

    /// Minimum positive remaining TTL across occupied slots, 0 if none
    async fn min_slot_ttl(&self) -> Result<u64, StoreError> {
        let mut min_ttl: Option<u64> = None;
        for slot in 0..self.max_concurrent {
            if let KeyTtl::Remaining(secs) = self.store.ttl(&self.slot_store_key(slot)).await? {
                min_ttl = Some(min_ttl.map_or(secs, |m| m.min(secs)));
            }
        }
        Ok(min_ttl.unwrap_or(0))
    }
}

#[async_trait]
impl<S: SemaphoreStore, C: Clock> Semaphore for SlotKeySemaphore<S, C> {
    async fn try_acquire(&mut self) -> bool {
        if let Err(e) = self.heal_bare_slots().await {
            tracing::error!(key = %self.store_key, error = %e, "slot self-heal failed");
            return false;
        }

        for slot in 0..self.max_concurrent {
            let slot_key = self.slot_store_key(slot);
            match self
                .store
                .set_if_absent(&slot_key, self.identifier.as_str(), self.ttl)
                .await
            {
                Ok(true) => {
                    self.slot_index = Some(slot);
                    tracing::debug!(key = %slot_key, identifier = %self.identifier, "slot acquired");
                    return true;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(key = %slot_key, error = %e, "acquire failed");
                    return false;
                }
            }
        }
        false
    }

    async fn acquire(&mut self, wait_budget: Duration) -> bool {
        let policy = self.backoff.clone();
        super::acquire_with_backoff(self, wait_budget, &policy).await
    }

    async fn release(&mut self) -> bool {
        let Some(slot) = self.slot_index else {
            tracing::warn!(key = %self.store_key, "not acquired or already released");
            return false;
        };
        let slot_key = self.slot_store_key(slot);

        let released = match self.store.get(&slot_key).await {
            Ok(Some(value)) if value == self.identifier.as_str() => {
                match self.store.delete(&slot_key).await {
                    Ok(deleted) => {
                        if deleted {
                            tracing::info!(key = %slot_key, "slot released");
                        }
                        deleted
                    }
                    Err(e) => {
                        tracing::error!(key = %slot_key, error = %e, "release failed");
                        false
                    }
                }
            }
            Ok(_) => {
                tracing::warn!(key = %slot_key, "identifier mismatch on release");
                false
            }
            Err(e) => {
                tracing::error!(key = %slot_key, error = %e, "release failed");
                false
            }
        };

        // Local owned state resets regardless of outcome
        self.slot_index = None;
        released
    }

    async fn is_acquired_by_me(&self) -> bool {
        let Some(slot) = self.slot_index else {
            return false;
        };
        match self.store.get(&self.slot_store_key(slot)).await {
            Ok(Some(value)) => value == self.identifier.as_str(),
            Ok(None) => false,
            Err(e) => {
                tracing::error!(key = %self.store_key, error = %e, "ownership check failed");
                false
            }
        }
    }

    async fn current_count(&self) -> u32 {
        match self.occupied_slots().await {
            Ok(occupied) => occupied.len() as u32,
            Err(e) => {
                tracing::error!(key = %self.store_key, error = %e, "count failed");
                0
            }
        }
    }

    async fn stats(&self) -> Result<Stats, SemaphoreError> {
        let occupied = self.occupied_slots().await.map_err(|e| {
            tracing::error!(key = %self.store_key, error = %e, "stats failed");
            SemaphoreError::Stats(e)
        })?;
        let ttl_remaining = self.min_slot_ttl().await.map_err(|e| {
            tracing::error!(key = %self.store_key, error = %e, "stats failed");
            SemaphoreError::Stats(e)
        })?;

        let count = occupied.len() as u32;
        let mut metadata = BTreeMap::new();
        metadata.insert("occupied_slots".to_string(), json!(occupied));
        metadata.insert("my_slot_index".to_string(), json!(self.slot_index));
        metadata.insert("slot_count".to_string(), json!(self.max_concurrent));

        Ok(Stats {
            key: self.key.clone(),
            max_concurrent: self.max_concurrent,
            current_count: count,
            available: self.max_concurrent.saturating_sub(count),
            ttl_remaining,
            is_full: count >= self.max_concurrent,
            identifier: self.identifier.clone(),
            is_acquired_by_me: self.is_acquired_by_me().await,
            created_at: chrono::Utc::now(),
            driver: BackendKind::SlotKey,
            metadata,
        })
    }

    async fn clear(&mut self) -> bool {
        let mut deleted = 0u32;
        for slot in 0..self.max_concurrent {
            let slot_key = self.slot_store_key(slot);
            match self.store.delete(&slot_key).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(key = %slot_key, error = %e, "clear failed");
                    return false;
                }
            }
        }
        tracing::warn!(key = %self.store_key, deleted, "cleared");
        self.slot_index = None;
        deleted > 0
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn store_key(&self) -> &str {
        &self.store_key
    }

    fn max_concurrent(&self) -> u32 {
        self.max_concurrent
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn identifier(&self) -> &HolderId {
        &self.identifier
    }
}

#[cfg(test)]
#[path = "slot_key_tests.rs"]
mod tests;
