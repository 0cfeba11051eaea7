// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upstream game-state API contract.

use async_trait::async_trait;

use crate::account::{Account, AccountId, Region, RiotId};
use crate::error::RenwatchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::MatchState;

/// Resolves accounts and reports whether they are in a live match.
#[async_trait]
pub trait GameStateProvider: PluginAdapter {
    /// Resolve a Riot ID. An unknown account is [`RenwatchError::NotFound`].
    async fn lookup_account(
        &self,
        riot_id: &RiotId,
        region: Region,
    ) -> Result<Account, RenwatchError>;

    /// Current match for an account. Not being in a match is not an error.
    async fn lookup_match_state(
        &self,
        account_id: &AccountId,
        region: Region,
    ) -> Result<MatchState, RenwatchError>;
}
