// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Factory validating parameters and selecting a backend
//!
//! One factory instance carries one configured backend kind for the whole
//! process; it is constructed explicitly and passed where needed — there
//! is no ambient registry. Validation failures never reach a backend
//! constructor.

use super::{AnySemaphore, SlotKeySemaphore, SortedSetSemaphore};
use crate::clock::{Clock, SystemClock};
use crate::error::SemaphoreError;
use crate::retry::BackoffPolicy;
use crate::stats::BackendKind;
use crate::store::SemaphoreStore;
use std::time::Duration;

/// Creates semaphore handles of the configured backend kind
#[derive(Clone)]
pub struct SemaphoreFactory<S: SemaphoreStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    kind: BackendKind,
    backoff: BackoffPolicy,
}

impl<S: SemaphoreStore> SemaphoreFactory<S, SystemClock> {
    pub fn new(store: S, kind: BackendKind) -> Self {
        Self::with_clock(store, SystemClock, kind)
    }
}

impl<S: SemaphoreStore, C: Clock> SemaphoreFactory<S, C> {
    pub fn with_clock(store: S, clock: C, kind: BackendKind) -> Self {
        Self {
            store,
            clock,
            kind,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Override the backoff policy applied to every handle this factory creates
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Validate parameters and construct a handle.
    ///
    /// The key is trimmed before the emptiness check; the trimmed form is
    /// what reaches the store.
    pub fn create(
        &self,
        key: &str,
        max_concurrent: u32,
        ttl: Duration,
    ) -> Result<AnySemaphore<S, C>, SemaphoreError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SemaphoreError::EmptyKey);
        }
        if max_concurrent < 1 {
            return Err(SemaphoreError::MaxConcurrentTooSmall);
        }
        if ttl < Duration::from_secs(1) {
            return Err(SemaphoreError::TtlTooShort);
        }

        Ok(match self.kind {
            BackendKind::SortedSet => AnySemaphore::SortedSet(
                SortedSetSemaphore::new(
                    self.store.clone(),
                    self.clock.clone(),
                    key,
                    max_concurrent,
                    ttl,
                )
                .with_backoff(self.backoff.clone()),
            ),
            BackendKind::SlotKey => AnySemaphore::SlotKey(
                SlotKeySemaphore::new(
                    self.store.clone(),
                    self.clock.clone(),
                    key,
                    max_concurrent,
                    ttl,
                )
                .with_backoff(self.backoff.clone()),
            ),
        })
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
