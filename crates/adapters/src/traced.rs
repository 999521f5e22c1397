// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use async_trait::async_trait;
use gate_core::{KeyTtl, SemaphoreStore, StoreError};
use std::time::Duration;

/// Wrapper that adds tracing to any SemaphoreStore
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: SemaphoreStore> SemaphoreStore for TracedStore<S> {
    async fn zset_try_acquire(
        &self,
        key: &str,
        member: &str,
        now: f64,
        ttl: Duration,
        max_concurrent: u32,
    ) -> Result<bool, StoreError> {
        let span = tracing::info_span!("store.zset_acquire", key, max_concurrent);
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let result = self
            .inner
            .zset_try_acquire(key, member, now, ttl, max_concurrent)
            .await;
        let elapsed = start.elapsed();

        match &result {
            Ok(acquired) => tracing::debug!(
                acquired,
                elapsed_ms = elapsed.as_millis() as u64,
                "acquire attempt"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "acquire attempt failed"
            ),
        }

        result
    }

    async fn zset_release(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let span = tracing::info_span!("store.zset_release", key);
        let _guard = span.enter();

        let result = self.inner.zset_release(key, member).await;
        match &result {
            Ok(removed) => tracing::debug!(removed, "release"),
            Err(e) => tracing::error!(error = %e, "release failed"),
        }

        result
    }

    async fn zset_confirm(
        &self,
        key: &str,
        member: &str,
        now: f64,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let result = self.inner.zset_confirm(key, member, now, ttl).await;
        tracing::trace!(key, held = ?result.as_ref().ok(), "confirmed");
        result
    }

    async fn zset_occupancy(
        &self,
        key: &str,
        now: f64,
        ttl: Duration,
    ) -> Result<(u32, KeyTtl), StoreError> {
        let result = self.inner.zset_occupancy(key, now, ttl).await;
        tracing::trace!(
            key,
            count = result.as_ref().map(|(count, _)| *count).ok(),
            "occupancy"
        );
        result
    }

    async fn zset_clear(&self, key: &str) -> Result<bool, StoreError> {
        let span = tracing::info_span!("store.zset_clear", key);
        let _guard = span.enter();

        let result = self.inner.zset_clear(key).await;
        match &result {
            Ok(existed) => tracing::info!(existed, "cleared"),
            Err(e) => tracing::error!(error = %e, "clear failed"),
        }

        result
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let span = tracing::info_span!("store.set_if_absent", key);
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let result = self.inner.set_if_absent(key, value, ttl).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(created) => tracing::debug!(
                created,
                elapsed_ms = elapsed.as_millis() as u64,
                "create attempt"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "create attempt failed"
            ),
        }

        result
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self.inner.get(key).await;
        tracing::trace!(key, found = ?result.as_ref().map(|v| v.is_some()).ok(), "get");
        result
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let result = self.inner.delete(key).await;
        match &result {
            Ok(deleted) => tracing::debug!(key, deleted, "delete"),
            Err(e) => tracing::error!(key, error = %e, "delete failed"),
        }
        result
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.exists(key).await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        self.inner.ttl(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let result = self.inner.expire(key, ttl).await;
        match &result {
            Ok(armed) => tracing::debug!(key, armed, "expire"),
            Err(e) => tracing::error!(key, error = %e, "expire failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
