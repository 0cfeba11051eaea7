// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock game-state provider for deterministic testing.
//!
//! Accounts are registered by Riot ID (matched case-insensitively, like the
//! real account API) and resolve to their registered canonical spelling.
//! Match states are set per account id; unset accounts are not in a match.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use renwatch_core::types::Participant;
use renwatch_core::{
    Account, AccountId, AdapterType, GameStateProvider, HealthStatus, MatchInfo, MatchState,
    PluginAdapter, Region, RenwatchError, RiotId,
};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MockGameState {
    accounts: Mutex<HashMap<String, Account>>,
    states: Mutex<HashMap<AccountId, MatchState>>,
    account_calls: AtomicUsize,
    match_calls: AtomicUsize,
    fail_match_lookups: AtomicBool,
    shut_down: AtomicBool,
}

impl MockGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account; its id is `puuid-{name}` lowercased.
    pub async fn add_account(&self, riot_id: &RiotId) -> Account {
        let account = Account {
            id: AccountId(format!("puuid-{}", riot_id.game_name.to_lowercase())),
            riot_id: riot_id.clone(),
        };
        self.accounts
            .lock()
            .await
            .insert(riot_id.to_string().to_lowercase(), account.clone());
        account
    }

    /// Put `account` into match `match_id` with the given participant Riot IDs.
    pub async fn start_match(&self, account: &AccountId, match_id: i64, participants: &[&str]) {
        let info = MatchInfo {
            match_id,
            participants: participants
                .iter()
                .map(|riot_id| Participant {
                    riot_id: (*riot_id).to_string(),
                    account_id: None,
                })
                .collect(),
        };
        self.states
            .lock()
            .await
            .insert(account.clone(), MatchState::InMatch(info));
    }

    pub async fn end_match(&self, account: &AccountId) {
        self.states.lock().await.remove(account);
    }

    /// Make every match-state lookup fail with an upstream error.
    pub fn set_failing(&self, failing: bool) {
        self.fail_match_lookups.store(failing, Ordering::SeqCst);
    }

    pub fn account_calls(&self) -> usize {
        self.account_calls.load(Ordering::SeqCst)
    }

    pub fn match_calls(&self) -> usize {
        self.match_calls.load(Ordering::SeqCst)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockGameState {
    fn name(&self) -> &str {
        "mock-game-state"
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
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl GameStateProvider for MockGameState {
    async fn lookup_account(
        &self,
        riot_id: &RiotId,
        _region: Region,
    ) -> Result<Account, RenwatchError> {
        self.account_calls.fetch_add(1, Ordering::SeqCst);
        self.accounts
            .lock()
            .await
            .get(&riot_id.to_string().to_lowercase())
            .cloned()
            .ok_or_else(|| RenwatchError::not_found(format!("account {riot_id}")))
    }

    async fn lookup_match_state(
        &self,
        account_id: &AccountId,
        _region: Region,
    ) -> Result<MatchState, RenwatchError> {
        self.match_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_match_lookups.load(Ordering::SeqCst) {
            return Err(RenwatchError::Upstream {
                message: "mock upstream unavailable".into(),
                source: None,
            });
        }
        Ok(self
            .states
            .lock()
            .await
            .get(account_id)
            .cloned()
            .unwrap_or(MatchState::NotInMatch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_case_insensitively_to_canonical_spelling() {
        let mock = MockGameState::new();
        mock.add_account(&RiotId::new("Faker", "KR1")).await;

        let account = mock
            .lookup_account(&RiotId::new("faker", "kr1"), Region::Kr)
            .await
            .unwrap();
        assert_eq!(account.riot_id, RiotId::new("Faker", "KR1"));
        assert_eq!(mock.account_calls(), 1);
    }

    #[tokio::test]
    async fn match_state_follows_script() {
        let mock = MockGameState::new();
        let account = mock.add_account(&RiotId::new("Faker", "KR1")).await;
        assert_eq!(
            mock.lookup_match_state(&account.id, Region::Kr).await.unwrap(),
            MatchState::NotInMatch
        );

        mock.start_match(&account.id, 5, &["Faker#KR1"]).await;
        assert!(matches!(
            mock.lookup_match_state(&account.id, Region::Kr).await.unwrap(),
            MatchState::InMatch(info) if info.match_id == 5
        ));

        mock.set_failing(true);
        assert!(mock.lookup_match_state(&account.id, Region::Kr).await.is_err());
    }
}
