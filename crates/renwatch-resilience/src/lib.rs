// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for Renwatch.
//!
//! Currently a per-actor sliding-window limiter guarding the command surface.

pub mod rate_limit;

pub use rate_limit::SlidingWindowLimiter;
