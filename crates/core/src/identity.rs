// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Holder identity for semaphore handles
//!
//! Every semaphore handle carries an identifier unique across hosts,
//! processes, and handle instances. Ownership checks compare stored
//! identifiers, so two handles must never collide — even within one
//! process acquiring the same key.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};

/// Unique identifier for a semaphore holder
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates holder identities of the form `host:pid:random:timestamp`
///
/// The random segment disambiguates handles created in the same process;
/// the high-resolution timestamp disambiguates generator restarts.
#[derive(Clone, Default)]
pub struct IdentifierGenerator;

impl IdentifierGenerator {
    pub fn generate(&self, clock: &impl Clock) -> HolderId {
        let host = hostname();
        let pid = std::process::id();
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        let random = &uuid[..8];
        HolderId(format!("{host}:{pid}:{random}:{:.6}", clock.epoch_secs()))
    }
}

/// Get the system hostname, or "unknown" if it can't be determined.
fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("HOST"))
        .unwrap_or_else(|_| "unknown".into())
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
