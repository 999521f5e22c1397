// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acquisition retry policies
//!
//! Two distinct layers. `BackoffPolicy` paces attempts inside a single
//! bounded `acquire` call. `RedispatchPolicy` decides whether a consumer
//! whose bounded wait failed should re-enqueue itself as a brand-new unit
//! of work instead of holding a worker while it waits.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay schedule between failed attempts inside one acquire call
///
/// The delay grows with the attempt number and is capped so heavy
/// contention cannot hammer the store. The attempt cap bounds the loop
/// even if the caller's clock misbehaves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Per-attempt delay increment
    #[serde(with = "humantime_serde")]
    pub step: Duration,
    /// Upper bound on any single delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Hard cap on attempts within one acquire call
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            max_attempts: 1000,
        }
    }
}

impl BackoffPolicy {
    /// Delay to sleep after the given failed attempt (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.max_delay)
    }
}

/// Outcome of a consumer-level retry decision
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Enqueue a fresh unit of work carrying `next_attempt`, after `delay`
    Redispatch { next_attempt: u32, delay: Duration },
    /// Attempt budget exhausted; report terminal failure
    GiveUp,
}

/// Queue-level rescheduling for consumers whose bounded wait failed
///
/// Trades immediate retry for a scheduled re-dispatch, decoupling
/// "waiting for a slot" from "holding a worker".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RedispatchPolicy {
    /// Total attempts a unit of work may make
    pub max_attempts: u32,
    /// Delay schedule indexed by attempt number
    pub delays: Vec<Duration>,
    /// Fallback delay once the schedule is exhausted
    #[serde(with = "humantime_serde")]
    pub fallback: Duration,
}

impl Default for RedispatchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 9,
            delays: vec![
                Duration::from_secs(2),
                Duration::from_secs(5),
                Duration::from_secs(10),
            ],
            fallback: Duration::from_secs(2),
        }
    }
}

impl RedispatchPolicy {
    /// Decide what a consumer should do after `current_attempt` (1-based)
    /// failed to acquire within its bounded wait.
    pub fn decide(&self, current_attempt: u32) -> RetryDecision {
        if current_attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        let idx = current_attempt.saturating_sub(1) as usize;
        let delay = self.delays.get(idx).copied().unwrap_or(self.fallback);
        RetryDecision::Redispatch {
            next_attempt: current_attempt + 1,
            delay,
        }
    }
}

/// Derive the semaphore key for a logical resource and its concurrency
/// limit, so consumers of the same resource with different limits do not
/// collide on one semaphore.
pub fn scoped_key(resource: &str, max_concurrent: u32) -> String {
    format!("{resource}:{max_concurrent}")
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
