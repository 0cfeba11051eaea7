// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a temp SQLite repository, the game-state cache,
//! and mock collaborators sharing one [`ManualClock`]. Pipeline components
//! are built by the tests themselves from the public fields.

use std::sync::Arc;

use renwatch_cache::GameStateCache;
use renwatch_config::model::{RenwatchConfig, StorageConfig};
use renwatch_core::types::NewSubscription;
use renwatch_core::{
    Account, ChannelId, Clock, OrgId, Region, RenwatchError, Repository, RiotId, Subscription,
};
use renwatch_storage::SqliteRepository;

use crate::clock::ManualClock;
use crate::mock_game_state::MockGameState;
use crate::mock_message_server::MockMessageServer;
use crate::mock_translator::MockTranslator;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: RenwatchConfig,
    translations: Vec<(String, String)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: RenwatchConfig::default(),
            translations: Vec::new(),
        }
    }

    /// Adjust the configuration before components are built.
    pub fn with_config(mut self, edit: impl FnOnce(&mut RenwatchConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Preload the mock translator's dictionary.
    pub fn with_translation(mut self, original: &str, translated: &str) -> Self {
        self.translations
            .push((original.to_string(), translated.to_string()));
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(mut self) -> Result<TestHarness, RenwatchError> {
        let temp_dir = tempfile::TempDir::new().map_err(RenwatchError::storage)?;
        let db_path = temp_dir.path().join("test.db");
        self.config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };

        let repo = Arc::new(SqliteRepository::open(&self.config.storage).await?);
        let clock = Arc::new(ManualClock::default());
        let game_state = Arc::new(MockGameState::new());
        let translator = Arc::new(MockTranslator::new());
        for (original, translated) in &self.translations {
            translator.insert(original, translated).await;
        }
        let messages = Arc::new(MockMessageServer::new());
        let cache = Arc::new(GameStateCache::new(
            repo.clone(),
            game_state.clone(),
            clock.clone(),
            &self.config.cache,
        ));

        Ok(TestHarness {
            repo,
            cache,
            game_state,
            translator,
            messages,
            clock,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock collaborators and temp storage.
pub struct TestHarness {
    /// SQLite repository (temp DB, cleaned up on drop).
    pub repo: Arc<SqliteRepository>,
    /// Cache over `game_state`, backed by `repo`.
    pub cache: Arc<GameStateCache>,
    pub game_state: Arc<MockGameState>,
    pub translator: Arc<MockTranslator>,
    pub messages: Arc<MockMessageServer>,
    /// Shared by the cache and anything else the test builds.
    pub clock: Arc<ManualClock>,
    pub config: RenwatchConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Register `riot_id` upstream and subscribe `channel` to it.
    pub async fn subscribe(
        &self,
        org: &str,
        channel: &str,
        riot_id: &str,
        region: Region,
    ) -> Result<(Subscription, Account), RenwatchError> {
        let riot_id = RiotId::parse(riot_id)?;
        let account = self.game_state.add_account(&riot_id).await;
        let sub = self
            .repo
            .create_subscription(&NewSubscription {
                org_id: OrgId(org.to_string()),
                channel_id: ChannelId(channel.to_string()),
                account: account.riot_id.clone(),
                region,
                created_at: self.clock.now(),
            })
            .await?;
        Ok((sub, account))
    }
}
