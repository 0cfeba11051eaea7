// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention policy for Renwatch.
//!
//! [`RetentionSweeper`] runs three independent sweeps, each on its own
//! timer: expired evals, subscriptions whose account has gone quiet, and
//! expired game-state cache rows.

pub mod retention;

pub use retention::{RetentionSweeper, SubscriptionSweep};
