// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache-aside layers over the upstream game-state provider and the
//! translation backend.
//!
//! Entries live in the repository so every backend shares the same
//! semantics and a restart does not cold-start the upstreams.

pub mod game_state;
pub mod translations;

pub use game_state::GameStateCache;
pub use translations::TranslationCache;
