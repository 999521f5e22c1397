// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process store with real atomicity and lazy expiry
//!
//! Every trait method runs under one mutex, giving it the same atomicity
//! a scripted transaction has against a remote store. Expired keys are
//! reaped lazily on access, matching remote-store semantics where a dead
//! key may linger physically but is logically gone.
//!
//! Clones share state, so handing clones to concurrent handles simulates
//! independent processes coordinating through one store.

use super::{KeyTtl, SemaphoreStore, StoreError};
use crate::clock::{Clock, SystemClock};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    /// member -> score (float seconds since epoch)
    Zset(BTreeMap<String, f64>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<SystemTime>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    offline: bool,
}

impl Inner {
    /// Look up a key, reaping it first if its expiry has lapsed.
    fn live(&mut self, key: &str, now: SystemTime) -> Option<&mut Entry> {
        let expired = self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| at <= now);
        if expired {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }
}

/// Shared in-memory store
#[derive(Clone)]
pub struct MemoryStore<C: Clock = SystemClock> {
    clock: C,
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStore<C> {
    /// Build a store that judges expiry against the given clock.
    ///
    /// Tests share one `FakeClock` between the store and the handles so
    /// advancing it expires entries without sleeping.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Simulate the store becoming unreachable; every operation fails
    /// with `StoreError::Unavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Plant a plain key with no expiry, as a buggy writer would.
    /// Exists for exercising the slot backend's self-heal pass.
    pub fn set_without_expiry(&self, key: &str, value: &str) {
        self.lock().entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: None,
            },
        );
    }

    /// Keys currently live in the store (test inspection)
    pub fn live_keys(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut inner = self.lock();
        let keys: Vec<String> = inner.entries.keys().cloned().collect();
        keys.into_iter()
            .filter(|k| inner.live(k, now).is_some())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        let inner = self.lock();
        if inner.offline {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(inner)
    }
}

fn zset_of<'a>(entry: &'a mut Entry, key: &str) -> Result<&'a mut BTreeMap<String, f64>, StoreError> {
    match &mut entry.value {
        Value::Zset(members) => Ok(members),
        Value::Str(_) => Err(StoreError::WrongType(key.to_string())),
    }
}

#[async_trait]
impl<C: Clock> SemaphoreStore for MemoryStore<C> {
    async fn zset_try_acquire(
        &self,
        key: &str,
        member: &str,
        now: f64,
        ttl: Duration,
        max_concurrent: u32,
    ) -> Result<bool, StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;

        let cutoff = now - ttl.as_secs_f64();
        if let Some(entry) = inner.live(key, wall_now) {
            let members = zset_of(entry, key)?;
            members.retain(|_, score| *score > cutoff);
            if members.len() as u32 >= max_concurrent {
                return Ok(false);
            }
            members.insert(member.to_string(), now);
            entry.expires_at = Some(wall_now + ttl);
            return Ok(true);
        }

        // Collection absent: it is empty by definition, so any positive
        // limit admits the caller.
        if max_concurrent == 0 {
            return Ok(false);
        }
        let mut members = BTreeMap::new();
        members.insert(member.to_string(), now);
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Zset(members),
                expires_at: Some(wall_now + ttl),
            },
        );
        Ok(true)
    }

    async fn zset_release(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;

        let Some(entry) = inner.live(key, wall_now) else {
            return Ok(false);
        };
        let members = zset_of(entry, key)?;
        let removed = members.remove(member).is_some();
        if members.is_empty() {
            inner.entries.remove(key);
        }
        Ok(removed)
    }

    async fn zset_confirm(
        &self,
        key: &str,
        member: &str,
        now: f64,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;

        let Some(entry) = inner.live(key, wall_now) else {
            return Ok(false);
        };
        let members = zset_of(entry, key)?;
        let Some(score) = members.get(member).copied() else {
            return Ok(false);
        };
        if now - score > ttl.as_secs_f64() {
            members.remove(member);
            if members.is_empty() {
                inner.entries.remove(key);
            }
            return Ok(false);
        }
        Ok(true)
    }

    async fn zset_occupancy(
        &self,
        key: &str,
        now: f64,
        ttl: Duration,
    ) -> Result<(u32, KeyTtl), StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;

        let Some(entry) = inner.live(key, wall_now) else {
            return Ok((0, KeyTtl::Missing));
        };
        let cutoff = now - ttl.as_secs_f64();
        let members = zset_of(entry, key)?;
        members.retain(|_, score| *score > cutoff);
        if members.is_empty() {
            inner.entries.remove(key);
            return Ok((0, KeyTtl::Missing));
        }
        let count = members.len() as u32;
        let key_ttl = remaining_ttl(entry.expires_at, wall_now);
        Ok((count, key_ttl))
    }

    async fn zset_clear(&self, key: &str) -> Result<bool, StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;
        let existed = inner.live(key, wall_now).is_some();
        inner.entries.remove(key);
        Ok(existed)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;

        if inner.live(key, wall_now).is_some() {
            return Ok(false);
        }
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: Some(wall_now + ttl),
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;

        let Some(entry) = inner.live(key, wall_now) else {
            return Ok(None);
        };
        match &entry.value {
            Value::Str(s) => Ok(Some(s.clone())),
            Value::Zset(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;
        let existed = inner.live(key, wall_now).is_some();
        inner.entries.remove(key);
        Ok(existed)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;
        Ok(inner.live(key, wall_now).is_some())
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;
        let Some(entry) = inner.live(key, wall_now) else {
            return Ok(KeyTtl::Missing);
        };
        Ok(remaining_ttl(entry.expires_at, wall_now))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let wall_now = self.clock.now();
        let mut inner = self.guard()?;
        let Some(entry) = inner.live(key, wall_now) else {
            return Ok(false);
        };
        entry.expires_at = Some(wall_now + ttl);
        Ok(true)
    }
}

/// Remaining whole seconds, rounded up like a remote store reports TTLs.
fn remaining_ttl(expires_at: Option<SystemTime>, now: SystemTime) -> KeyTtl {
    match expires_at {
        None => KeyTtl::NoExpiry,
        Some(at) => match at.duration_since(now) {
            Ok(remaining) => KeyTtl::Remaining(remaining.as_secs_f64().ceil() as u64),
            Err(_) => KeyTtl::Missing,
        },
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
