// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Riot Games game-state adapter for Renwatch.
//!
//! This crate implements [`GameStateProvider`] on top of the Riot account-v1
//! and spectator-v5 endpoints. A missing account is reported as
//! [`RenwatchError::NotFound`]; a player without a live game is
//! [`MatchState::NotInMatch`], not an error.

pub mod client;
pub mod routing;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use renwatch_config::model::RiotConfig;
use renwatch_core::types::Participant;
use renwatch_core::{
    Account, AccountId, AdapterType, GameStateProvider, HealthStatus, MatchInfo, MatchState,
    PluginAdapter, Region, RenwatchError, RiotId,
};
use tracing::{debug, info};

use crate::client::RiotClient;
use crate::types::CurrentGameDto;

/// Riot API provider implementing [`GameStateProvider`].
pub struct RiotProvider {
    client: RiotClient,
}

impl RiotProvider {
    /// Creates a new provider from configuration.
    ///
    /// The API key comes from `riot.api_key` (or `RIOT_API_KEY`, mapped by
    /// the config loader).
    pub fn new(config: &RiotConfig) -> Result<Self, RenwatchError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                RenwatchError::Config(
                    "Riot API key not found. Set riot.api_key or RIOT_API_KEY.".into(),
                )
            })?;
        let client = RiotClient::new(api_key, Duration::from_secs(config.timeout_secs))?;
        info!("Riot provider initialized");
        Ok(Self { client })
    }

    #[cfg(test)]
    fn with_client(client: RiotClient) -> Self {
        Self { client }
    }
}

fn to_match_info(game: CurrentGameDto) -> MatchInfo {
    let participants = game
        .participants
        .into_iter()
        .filter_map(|p| {
            let riot_id = p.riot_id.filter(|id| !id.trim().is_empty())?;
            Some(Participant {
                riot_id,
                account_id: p.puuid.map(AccountId),
            })
        })
        .collect();
    MatchInfo {
        match_id: game.game_id,
        participants,
    }
}

#[async_trait]
impl PluginAdapter for RiotProvider {
    fn name(&self) -> &str {
        "riot"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::GameState
    }

    async fn health_check(&self) -> Result<HealthStatus, RenwatchError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RenwatchError> {
        Ok(())
    }
}

#[async_trait]
impl GameStateProvider for RiotProvider {
    async fn lookup_account(
        &self,
        riot_id: &RiotId,
        region: Region,
    ) -> Result<Account, RenwatchError> {
        let dto = self
            .client
            .account_by_riot_id(&riot_id.game_name, &riot_id.tag_line, region)
            .await?
            .ok_or_else(|| RenwatchError::not_found(format!("account {riot_id}")))?;
        debug!(riot_id = %riot_id, %region, "account resolved");
        Ok(Account {
            id: AccountId(dto.puuid),
            riot_id: RiotId::new(dto.game_name, dto.tag_line),
        })
    }

    async fn lookup_match_state(
        &self,
        account_id: &AccountId,
        region: Region,
    ) -> Result<MatchState, RenwatchError> {
        match self.client.active_game(&account_id.0, region).await? {
            Some(game) => Ok(MatchState::InMatch(to_match_info(game))),
            None => Ok(MatchState::NotInMatch),
        }
    }
}
