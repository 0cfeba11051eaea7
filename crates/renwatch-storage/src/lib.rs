// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite repository backend for Renwatch.
//!
//! Provides subscription, eval-ledger, and game-state cache persistence
//! through a single tokio-rusqlite connection with embedded refinery
//! migrations.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteRepository;
pub use database::Database;
