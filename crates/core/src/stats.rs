// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore statistics snapshot
//!
//! A `Stats` value is constructed fresh per query and never mutates
//! semaphore state; observability consumers may serialize and report it
//! at any interval.

use crate::identity::HolderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Backend strategy tag carried in snapshots and selected by the factory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// One shared ordered collection per key, scripted atomicity
    SortedSet,
    /// N independently-expiring keys, one per slot; no scripting required
    SlotKey,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::SortedSet => "sorted_set",
            BackendKind::SlotKey => "slot_key",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable snapshot of semaphore state at a point in time
#[derive(Clone, Debug, Serialize)]
pub struct Stats {
    /// Logical key (without the store prefix)
    pub key: String,
    pub max_concurrent: u32,
    pub current_count: u32,
    pub available: u32,
    /// Remaining store-side expiry in whole seconds; 0 when nothing is occupied
    pub ttl_remaining: u64,
    pub is_full: bool,
    /// Identifier of the handle that took this snapshot
    pub identifier: HolderId,
    pub is_acquired_by_me: bool,
    pub created_at: DateTime<Utc>,
    pub driver: BackendKind,
    /// Backend-specific details (store key, occupied slot indices, ...)
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Stats {
    pub fn has_available_slots(&self) -> bool {
        self.available > 0
    }

    /// Occupancy as a percentage, rounded to two decimals.
    ///
    /// A zero capacity reports 0.0 rather than dividing by zero.
    pub fn usage_percentage(&self) -> f64 {
        if self.max_concurrent == 0 {
            return 0.0;
        }
        let pct = f64::from(self.current_count) / f64::from(self.max_concurrent) * 100.0;
        (pct * 100.0).round() / 100.0
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
