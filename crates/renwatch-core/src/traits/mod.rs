// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod game_state;
pub mod message;
pub mod repository;
pub mod translator;

pub use adapter::PluginAdapter;
pub use game_state::GameStateProvider;
pub use message::MessageServer;
pub use repository::Repository;
pub use translator::Translator;
