// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PostgreSQL repository backend for Renwatch.
//!
//! Selected with `storage.backend = "postgres"`. Migrations under
//! `migrations/` are embedded with `sqlx::migrate!` and applied on connect.

mod repository;
mod rows;

pub use repository::PostgresRepository;
