// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Renwatch integration tests.
//!
//! Provides mock collaborators and a test harness for fast, deterministic
//! tests without Riot, Discord, or Anthropic.
//!
//! # Components
//!
//! - [`MockGameState`] - scripted accounts and match states, with call counters
//! - [`MockTranslator`] - dictionary translator with failure injection
//! - [`MockMessageServer`] - captures sends and replies; can fail or stall sends
//! - [`ManualClock`] - a clock tests move by hand
//! - [`TestHarness`] - temp SQLite repository plus all of the above

pub mod clock;
pub mod harness;
pub mod mock_game_state;
pub mod mock_message_server;
pub mod mock_translator;

pub use clock::ManualClock;
pub use harness::TestHarness;
pub use mock_game_state::MockGameState;
pub use mock_message_server::{MockMessageServer, SentMessage, SentReply};
pub use mock_translator::MockTranslator;
