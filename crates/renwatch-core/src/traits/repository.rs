// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contract shared by every storage backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::account::{AccountId, Region, RiotId};
use crate::error::RenwatchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    CachedAccount, CachedMatchState, ChannelId, Eval, InactiveSubscription, NewSubscription,
    OrgId, StoredTranslation, Subscription, SubscriptionKey, TxOp, TxOutcome,
};

/// Storage backend for subscriptions, the eval ledger, translations and the game-state cache.
///
/// Backends must behave identically: single-row lookups that match nothing
/// return `Ok(None)`, duplicate subscriptions map to
/// [`UserError::AlreadySubscribed`](crate::error::UserError::AlreadySubscribed),
/// and [`Repository::with_transaction`] commits all of its operations or none.
#[async_trait]
pub trait Repository: PluginAdapter {
    // --- Subscriptions ---

    /// Insert a subscription. Duplicate (channel, account, region) is a user error.
    async fn create_subscription(
        &self,
        new: &NewSubscription,
    ) -> Result<Subscription, RenwatchError>;

    async fn get_subscription(&self, id: i64) -> Result<Option<Subscription>, RenwatchError>;

    /// Up to `limit` subscriptions, least recently evaluated first (never-evaluated leading).
    async fn list_subscriptions(&self, limit: u32) -> Result<Vec<Subscription>, RenwatchError>;

    async fn list_subscriptions_by_channel(
        &self,
        channel_id: &ChannelId,
    ) -> Result<Vec<Subscription>, RenwatchError>;

    async fn count_subscriptions_by_org(&self, org_id: &OrgId) -> Result<u64, RenwatchError>;

    /// Delete by natural key. Returns the number of rows removed.
    async fn delete_subscription(&self, key: &SubscriptionKey) -> Result<u64, RenwatchError>;

    /// Delete by id, cascading to evals. Returns the number of subscriptions removed.
    async fn delete_subscriptions(&self, ids: &[i64]) -> Result<u64, RenwatchError>;

    // --- Eval ledger ---

    async fn find_eval(
        &self,
        subscription_id: i64,
        match_id: i64,
    ) -> Result<Option<Eval>, RenwatchError>;

    /// Delete every eval recorded strictly before `cutoff`.
    async fn delete_evals_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RenwatchError>;

    /// Subscriptions whose newest non-offline eval is strictly older than `cutoff`.
    ///
    /// Subscriptions with no such eval are not returned.
    async fn find_inactive_subscriptions(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<InactiveSubscription>, RenwatchError>;

    /// Count subscriptions created before `cutoff` that have no evals at all.
    async fn count_unevaluated_subscriptions(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RenwatchError>;

    /// Apply `ops` atomically, returning one outcome per op in order.
    ///
    /// Any failure rolls back every op.
    async fn with_transaction(&self, ops: Vec<TxOp>) -> Result<Vec<TxOutcome>, RenwatchError>;

    // --- Game-state cache ---

    /// Unexpired entry for (riot id, region) as of `now`.
    async fn get_cached_account(
        &self,
        riot_id: &RiotId,
        region: Region,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedAccount>, RenwatchError>;

    async fn put_cached_account(&self, entry: &CachedAccount) -> Result<(), RenwatchError>;

    /// Unexpired entry for (account id, region) as of `now`.
    async fn get_cached_match_state(
        &self,
        account_id: &AccountId,
        region: Region,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedMatchState>, RenwatchError>;

    async fn put_cached_match_state(&self, entry: &CachedMatchState)
    -> Result<(), RenwatchError>;

    /// Delete every cache entry whose expiry is at or before `now`.
    async fn purge_expired_cache(&self, now: DateTime<Utc>) -> Result<u64, RenwatchError>;

    // --- Translations ---

    /// Stored translations for whichever of `originals` have one. Order is unspecified.
    async fn get_translations(
        &self,
        originals: &[String],
    ) -> Result<Vec<StoredTranslation>, RenwatchError>;

    /// Upsert by original name; a later entry replaces the earlier translation.
    async fn put_translations(&self, entries: &[StoredTranslation]) -> Result<(), RenwatchError>;
}
