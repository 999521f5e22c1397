// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sorted-set semaphore backend
//!
//! One shared ordered collection per logical key, mapping each holder
//! identifier to its acquisition timestamp. The limit check, stale-holder
//! purge, and insert run as a single atomic store transaction, so
//! concurrent callers cannot race past the limit. Storage overhead is one
//! key per semaphore regardless of capacity.

use super::Semaphore;
use crate::clock::{Clock, SystemClock};
use crate::error::SemaphoreError;
use crate::identity::{HolderId, IdentifierGenerator};
use crate::retry::BackoffPolicy;
use crate::stats::{BackendKind, Stats};
use crate::store::{KeyTtl, SemaphoreStore};
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

/// Store key prefix for sorted-set semaphores
const KEY_PREFIX: &str = "semaphore:";

/// Semaphore backed by one timestamp-ordered collection per key
pub struct SortedSetSemaphore<S: SemaphoreStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    key: String,
    store_key: String,
    max_concurrent: u32,
    ttl: Duration,
    identifier: HolderId,
    backoff: BackoffPolicy,
}

impl<S: SemaphoreStore, C: Clock> SortedSetSemaphore<S, C> {
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
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

#[async_trait]
impl<S: SemaphoreStore, C: Clock> Semaphore for SortedSetSemaphore<S, C> {
    async fn try_acquire(&mut self) -> bool {
        let now = self.clock.epoch_secs();
        match self
            .store
            .zset_try_acquire(
                &self.store_key,
                self.identifier.as_str(),
                now,
                self.ttl,
                self.max_concurrent,
            )
            .await
        {
            Ok(true) => {
                tracing::debug!(key = %self.store_key, identifier = %self.identifier, "acquired");
                true
            }
            Ok(false) => {
                tracing::debug!(key = %self.store_key, "semaphore full");
                false
            }
            Err(e) => {
                tracing::error!(key = %self.store_key, error = %e, "acquire failed");
                false
            }
        }
    }

    async fn acquire(&mut self, wait_budget: Duration) -> bool {
        let policy = self.backoff.clone();
        super::acquire_with_backoff(self, wait_budget, &policy).await
    }

    async fn release(&mut self) -> bool {
        match self
            .store
            .zset_release(&self.store_key, self.identifier.as_str())
            .await
        {
            Ok(true) => {
                tracing::info!(key = %self.store_key, identifier = %self.identifier, "released");
                true
            }
            Ok(false) => {
                tracing::warn!(
                    key = %self.store_key,
                    identifier = %self.identifier,
                    "identifier not found for release"
                );
                false
            }
            Err(e) => {
                tracing::error!(key = %self.store_key, error = %e, "release failed");
                false
            }
        }
    }

    async fn is_acquired_by_me(&self) -> bool {
        let now = self.clock.epoch_secs();
        match self
            .store
            .zset_confirm(&self.store_key, self.identifier.as_str(), now, self.ttl)
            .await
        {
            Ok(held) => held,
            Err(e) => {
                tracing::error!(key = %self.store_key, error = %e, "ownership check failed");
                false
            }
        }
    }

    async fn current_count(&self) -> u32 {
        let now = self.clock.epoch_secs();
        match self.store.zset_occupancy(&self.store_key, now, self.ttl).await {
            Ok((count, _)) => count,
            Err(e) => {
                tracing::error!(key = %self.store_key, error = %e, "count failed");
                0
            }
        }
    }

    async fn stats(&self) -> Result<Stats, SemaphoreError> {
        let now = self.clock.epoch_secs();
        let (count, key_ttl) = self
            .store
            .zset_occupancy(&self.store_key, now, self.ttl)
            .await
            .map_err(|e| {
                tracing::error!(key = %self.store_key, error = %e, "stats failed");
                SemaphoreError::Stats(e)
            })?;

        let ttl_remaining = match key_ttl {
            KeyTtl::Remaining(secs) => secs,
            KeyTtl::Missing | KeyTtl::NoExpiry => 0,
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("store_key".to_string(), json!(self.store_key));
        metadata.insert("implementation".to_string(), json!("sorted_set"));

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
            driver: BackendKind::SortedSet,
            metadata,
        })
    }

    async fn clear(&mut self) -> bool {
        match self.store.zset_clear(&self.store_key).await {
            Ok(deleted) => {
                tracing::warn!(key = %self.store_key, deleted, "cleared");
                deleted
            }
            Err(e) => {
                tracing::error!(key = %self.store_key, error = %e, "clear failed");
                false
            }
        }
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
#[path = "sorted_set_tests.rs"]
mod tests;
