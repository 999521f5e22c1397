// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the semaphore core
//!
//! Contention is never an error: boolean-returning operations absorb
//! transient store failures locally (log, then degrade to `false`) so a
//! flaky store cannot crash a caller's work loop. Only construction-time
//! misuse and explicit statistics failures propagate.

use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by semaphore construction and statistics
#[derive(Debug, Error)]
pub enum SemaphoreError {
    #[error("semaphore key cannot be empty")]
    EmptyKey,
    #[error("max concurrent must be at least 1")]
    MaxConcurrentTooSmall,
    #[error("ttl must be at least 1 second")]
    TtlTooShort,
    /// A caller needs to distinguish "empty" from "unknown", so stats
    /// surface store failure instead of zeroing out.
    #[error("failed to get semaphore statistics: {0}")]
    Stats(#[from] StoreError),
}
