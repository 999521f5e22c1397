// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fault-injecting store wrapper
//!
//! Fails the next N operations with `StoreError::Unavailable`, then
//! passes everything through. Exists for exercising the degraded paths
//! of the semaphore backends without a real outage.

use async_trait::async_trait;
use gate_core::{KeyTtl, SemaphoreStore, StoreError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Wrapper that injects transient failures into any SemaphoreStore
#[derive(Clone)]
pub struct FlakyStore<S> {
    inner: S,
    remaining_failures: Arc<Mutex<u32>>,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            remaining_failures: Arc::new(Mutex::new(0)),
        }
    }

    /// Fail the next `n` operations. Clones share the counter.
    pub fn fail_next(&self, n: u32) {
        *self.lock() = n;
    }

    pub fn pending_failures(&self) -> u32 {
        *self.lock()
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        let mut remaining = self.lock();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, u32> {
        self.remaining_failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl<S: SemaphoreStore> SemaphoreStore for FlakyStore<S> {
    async fn zset_try_acquire(
        &self,
        key: &str,
        member: &str,
        now: f64,
        ttl: Duration,
        max_concurrent: u32,
    ) -> Result<bool, StoreError> {
        self.take_failure()?;
        self.inner
            .zset_try_acquire(key, member, now, ttl, max_concurrent)
            .await
    }

    async fn zset_release(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.take_failure()?;
        self.inner.zset_release(key, member).await
    }

    async fn zset_confirm(
        &self,
        key: &str,
        member: &str,
        now: f64,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.take_failure()?;
        self.inner.zset_confirm(key, member, now, ttl).await
    }

    async fn zset_occupancy(
        &self,
        key: &str,
        now: f64,
        ttl: Duration,
    ) -> Result<(u32, KeyTtl), StoreError> {
        self.take_failure()?;
        self.inner.zset_occupancy(key, now, ttl).await
    }

    async fn zset_clear(&self, key: &str) -> Result<bool, StoreError> {
        self.take_failure()?;
        self.inner.zset_clear(key).await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.take_failure()?;
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.take_failure()?;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.take_failure()?;
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.take_failure()?;
        self.inner.exists(key).await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        self.take_failure()?;
        self.inner.ttl(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.take_failure()?;
        self.inner.expire(key, ttl).await
    }
}

#[cfg(test)]
#[path = "flaky_tests.rs"]
mod tests;
