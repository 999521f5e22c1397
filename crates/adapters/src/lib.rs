// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Store adapters wrapping the core store contract
//!
//! - **TracedStore** - adds tracing spans and timings to any store
//! - **FlakyStore** - fault injection for exercising degraded paths

pub mod flaky;
pub mod traced;

pub use flaky::FlakyStore;
pub use traced::TracedStore;
