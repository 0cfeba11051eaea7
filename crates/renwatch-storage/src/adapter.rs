// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the Repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use renwatch_config::model::StorageConfig;
use renwatch_core::types::{
    CachedAccount, CachedMatchState, InactiveSubscription, NewSubscription, StoredTranslation,
    SubscriptionKey, TxOp, TxOutcome,
};
use renwatch_core::{
    AccountId, AdapterType, ChannelId, Eval, HealthStatus, OrgId, PluginAdapter, Region,
    RenwatchError, Repository, RiotId, Subscription,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed repository.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
pub struct SqliteRepository {
    db: Database,
    path: String,
}

impl SqliteRepository {
    /// Open the database described by `config`, running migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, RenwatchError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite repository opened");
        Ok(Self {
            db,
            path: config.database_path.clone(),
        })
    }

    /// Open a database at `path` with default settings.
    pub async fn open_path(path: &str) -> Result<Self, RenwatchError> {
        Ok(Self {
            db: Database::open(path).await?,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl PluginAdapter for SqliteRepository {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Repository
    }

    async fn health_check(&self) -> Result<HealthStatus, RenwatchError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RenwatchError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn create_subscription(
        &self,
        new: &NewSubscription,
    ) -> Result<Subscription, RenwatchError> {
        queries::subscriptions::create_subscription(&self.db, new).await
    }

    async fn get_subscription(&self, id: i64) -> Result<Option<Subscription>, RenwatchError> {
        queries::subscriptions::get_subscription(&self.db, id).await
    }

    async fn list_subscriptions(&self, limit: u32) -> Result<Vec<Subscription>, RenwatchError> {
        queries::subscriptions::list_subscriptions(&self.db, limit).await
    }

    async fn list_subscriptions_by_channel(
        &self,
        channel_id: &ChannelId,
    ) -> Result<Vec<Subscription>, RenwatchError> {
        queries::subscriptions::list_subscriptions_by_channel(&self.db, channel_id).await
    }

    async fn count_subscriptions_by_org(&self, org_id: &OrgId) -> Result<u64, RenwatchError> {
        queries::subscriptions::count_subscriptions_by_org(&self.db, org_id).await
    }

    async fn delete_subscription(&self, key: &SubscriptionKey) -> Result<u64, RenwatchError> {
        queries::subscriptions::delete_subscription(&self.db, key).await
    }

    async fn delete_subscriptions(&self, ids: &[i64]) -> Result<u64, RenwatchError> {
        queries::subscriptions::delete_subscriptions(&self.db, ids).await
    }

    async fn find_eval(
        &self,
        subscription_id: i64,
        match_id: i64,
    ) -> Result<Option<Eval>, RenwatchError> {
        queries::evals::find_eval(&self.db, subscription_id, match_id).await
    }

    async fn delete_evals_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RenwatchError> {
        queries::evals::delete_evals_before(&self.db, cutoff).await
    }

    async fn find_inactive_subscriptions(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<InactiveSubscription>, RenwatchError> {
        queries::evals::find_inactive_subscriptions(&self.db, cutoff).await
    }

    async fn count_unevaluated_subscriptions(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RenwatchError> {
        queries::evals::count_unevaluated_subscriptions(&self.db, cutoff).await
    }

    async fn with_transaction(&self, ops: Vec<TxOp>) -> Result<Vec<TxOutcome>, RenwatchError> {
        queries::evals::with_transaction(&self.db, ops).await
    }

    async fn get_cached_account(
        &self,
        riot_id: &RiotId,
        region: Region,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedAccount>, RenwatchError> {
        queries::cache::get_cached_account(&self.db, riot_id, region, now).await
    }

    async fn put_cached_account(&self, entry: &CachedAccount) -> Result<(), RenwatchError> {
        queries::cache::put_cached_account(&self.db, entry).await
    }

    async fn get_cached_match_state(
        &self,
        account_id: &AccountId,
        region: Region,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedMatchState>, RenwatchError> {
        queries::cache::get_cached_match_state(&self.db, account_id, region, now).await
    }

    async fn put_cached_match_state(
        &self,
        entry: &CachedMatchState,
    ) -> Result<(), RenwatchError> {
        queries::cache::put_cached_match_state(&self.db, entry).await
    }

    async fn purge_expired_cache(&self, now: DateTime<Utc>) -> Result<u64, RenwatchError> {
        queries::cache::purge_expired(&self.db, now).await
    }

    async fn get_translations(
        &self,
        originals: &[String],
    ) -> Result<Vec<StoredTranslation>, RenwatchError> {
        queries::translations::get_translations(&self.db, originals).await
    }

    async fn put_translations(&self, entries: &[StoredTranslation]) -> Result<(), RenwatchError> {
        queries::translations::put_translations(&self.db, entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use renwatch_core::types::NewEval;
    use renwatch_core::{EvalStatus, MessageId, UserError};
    use tempfile::{tempdir, TempDir};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    async fn open_repo() -> (TempDir, SqliteRepository) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repo.db");
        let repo = SqliteRepository::open_path(path.to_str().unwrap())
            .await
            .unwrap();
        (dir, repo)
    }

    fn new_sub(org: &str, channel: &str, name: &str) -> NewSubscription {
        NewSubscription {
            org_id: OrgId(org.into()),
            channel_id: ChannelId(channel.into()),
            account: RiotId::new(name, "KR1"),
            region: Region::Kr,
            created_at: t0(),
        }
    }

    fn eval_op(subscription_id: i64, match_id: i64, status: EvalStatus, at: DateTime<Utc>) -> TxOp {
        TxOp::CreateEval(NewEval {
            subscription_id,
            match_id: Some(match_id),
            status,
            message_id: Some(MessageId(format!("msg-{match_id}"))),
            evaluated_at: at,
        })
    }

    #[tokio::test]
    async fn implements_plugin_adapter() {
        let (_dir, repo) = open_repo().await;
        assert_eq!(repo.name(), "sqlite");
        assert_eq!(repo.adapter_type(), AdapterType::Repository);
        assert_eq!(repo.health_check().await.unwrap(), HealthStatus::Healthy);
        repo.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_subscription_is_already_subscribed() {
        let (_dir, repo) = open_repo().await;
        let created = repo.create_subscription(&new_sub("g1", "c1", "Faker")).await.unwrap();
        assert!(created.id > 0);
        assert!(created.last_evaluated_at.is_none());

        let err = repo
            .create_subscription(&new_sub("g1", "c1", "Faker"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RenwatchError::User(UserError::AlreadySubscribed { .. })
        ));

        // Same account in another channel is a separate subscription.
        repo.create_subscription(&new_sub("g1", "c2", "Faker")).await.unwrap();
        assert_eq!(repo.count_subscriptions_by_org(&OrgId("g1".into())).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn missing_rows_are_none() {
        let (_dir, repo) = open_repo().await;
        assert!(repo.get_subscription(999).await.unwrap().is_none());
        assert!(repo.find_eval(1, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_orders_never_evaluated_first() {
        let (_dir, repo) = open_repo().await;
        let a = repo.create_subscription(&new_sub("g", "c", "A")).await.unwrap();
        let b = repo.create_subscription(&new_sub("g", "c", "B")).await.unwrap();
        let c = repo.create_subscription(&new_sub("g", "c", "C")).await.unwrap();

        repo.with_transaction(vec![
            TxOp::TouchSubscription { id: a.id, at: t0() + Duration::minutes(5) },
            TxOp::TouchSubscription { id: c.id, at: t0() + Duration::minutes(1) },
        ])
        .await
        .unwrap();

        let ids: Vec<i64> = repo
            .list_subscriptions(10)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![b.id, c.id, a.id]);

        assert_eq!(repo.list_subscriptions(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn transaction_creates_eval_and_touches_subscription() {
        let (_dir, repo) = open_repo().await;
        let sub = repo.create_subscription(&new_sub("g", "c", "Faker")).await.unwrap();
        let at = t0() + Duration::minutes(3);

        let outcomes = repo
            .with_transaction(vec![
                eval_op(sub.id, 77, EvalStatus::NewTranslations, at),
                TxOp::TouchSubscription { id: sub.id, at },
            ])
            .await
            .unwrap();

        assert!(matches!(&outcomes[0], TxOutcome::EvalCreated(e) if e.match_id == Some(77)));
        assert_eq!(outcomes[1], TxOutcome::Touched);

        let eval = repo.find_eval(sub.id, 77).await.unwrap().unwrap();
        assert_eq!(eval.status, EvalStatus::NewTranslations);
        assert_eq!(eval.message_id, Some(MessageId("msg-77".into())));
        assert_eq!(eval.evaluated_at, at);

        let stored = repo.get_subscription(sub.id).await.unwrap().unwrap();
        assert_eq!(stored.last_evaluated_at, Some(at));
    }

    #[tokio::test]
    async fn failed_touch_rolls_back_eval() {
        let (_dir, repo) = open_repo().await;
        let sub = repo.create_subscription(&new_sub("g", "c", "Faker")).await.unwrap();

        let err = repo
            .with_transaction(vec![
                eval_op(sub.id, 5, EvalStatus::NewTranslations, t0()),
                TxOp::TouchSubscription { id: sub.id + 100, at: t0() },
            ])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(repo.find_eval(sub.id, 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_eval_for_match_fails_atomically() {
        let (_dir, repo) = open_repo().await;
        let sub = repo.create_subscription(&new_sub("g", "c", "Faker")).await.unwrap();
        repo.with_transaction(vec![eval_op(sub.id, 9, EvalStatus::NewTranslations, t0())])
            .await
            .unwrap();

        let later = t0() + Duration::hours(1);
        let result = repo
            .with_transaction(vec![
                TxOp::TouchSubscription { id: sub.id, at: later },
                eval_op(sub.id, 9, EvalStatus::NewTranslations, later),
            ])
            .await;
        assert!(result.is_err());

        let stored = repo.get_subscription(sub.id).await.unwrap().unwrap();
        assert_eq!(stored.last_evaluated_at, None, "touch must roll back too");
    }

    #[tokio::test]
    async fn deleting_subscription_cascades_to_evals() {
        let (_dir, repo) = open_repo().await;
        let sub = repo.create_subscription(&new_sub("g", "c", "Faker")).await.unwrap();
        repo.with_transaction(vec![eval_op(sub.id, 1, EvalStatus::NewTranslations, t0())])
            .await
            .unwrap();

        let key = SubscriptionKey {
            channel_id: ChannelId("c".into()),
            account: RiotId::new("Faker", "KR1"),
            region: Region::Kr,
        };
        assert_eq!(repo.delete_subscription(&key).await.unwrap(), 1);
        assert_eq!(repo.delete_subscription(&key).await.unwrap(), 0);
        assert!(repo.find_eval(sub.id, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_evals_before_is_strict() {
        let (_dir, repo) = open_repo().await;
        let sub = repo.create_subscription(&new_sub("g", "c", "Faker")).await.unwrap();
        repo.with_transaction(vec![
            eval_op(sub.id, 1, EvalStatus::NewTranslations, t0()),
            eval_op(sub.id, 2, EvalStatus::NewTranslations, t0() + Duration::hours(2)),
        ])
        .await
        .unwrap();

        assert_eq!(repo.delete_evals_before(t0()).await.unwrap(), 0);
        assert_eq!(repo.delete_evals_before(t0() + Duration::hours(1)).await.unwrap(), 1);
        assert!(repo.find_eval(sub.id, 2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn inactive_query_ignores_offline_and_unevaluated() {
        let (_dir, repo) = open_repo().await;
        let stale = repo.create_subscription(&new_sub("g", "c", "Stale")).await.unwrap();
        let fresh = repo.create_subscription(&new_sub("g", "c", "Fresh")).await.unwrap();
        let offline_only = repo.create_subscription(&new_sub("g", "c", "Off")).await.unwrap();
        let _never = repo.create_subscription(&new_sub("g", "c", "Never")).await.unwrap();

        let old = t0() - Duration::days(30);
        repo.with_transaction(vec![
            eval_op(stale.id, 1, EvalStatus::NewTranslations, old),
            eval_op(fresh.id, 2, EvalStatus::NewTranslations, old),
            eval_op(fresh.id, 3, EvalStatus::NewTranslations, t0()),
            // An offline check newer than the cutoff does not count as activity.
            eval_op(stale.id, 4, EvalStatus::Offline, t0()),
            eval_op(offline_only.id, 5, EvalStatus::Offline, old),
        ])
        .await
        .unwrap();

        let cutoff = t0() - Duration::days(21);
        let inactive = repo.find_inactive_subscriptions(cutoff).await.unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].subscription_id, stale.id);
        assert_eq!(inactive[0].newest_online_eval, old);

        assert_eq!(
            repo.count_unevaluated_subscriptions(t0() + Duration::seconds(1))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn delete_subscriptions_in_transaction_reports_count() {
        let (_dir, repo) = open_repo().await;
        let a = repo.create_subscription(&new_sub("g", "c", "A")).await.unwrap();
        let b = repo.create_subscription(&new_sub("g", "c", "B")).await.unwrap();

        let outcomes = repo
            .with_transaction(vec![TxOp::DeleteSubscriptions(vec![a.id, b.id, 12345])])
            .await
            .unwrap();
        assert_eq!(outcomes, vec![TxOutcome::Deleted(2)]);
        assert_eq!(repo.delete_subscriptions(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cache_entries_expire_at_boundary() {
        let (_dir, repo) = open_repo().await;
        let riot_id = RiotId::new("Faker", "KR1");
        let expires_at = t0() + Duration::hours(24);
        repo.put_cached_account(&CachedAccount {
            riot_id: riot_id.clone(),
            region: Region::Kr,
            account_id: AccountId("puuid-1".into()),
            expires_at,
        })
        .await
        .unwrap();

        let before = expires_at - Duration::seconds(1);
        let hit = repo.get_cached_account(&riot_id, Region::Kr, before).await.unwrap();
        assert_eq!(hit.unwrap().account_id, AccountId("puuid-1".into()));

        assert!(repo.get_cached_account(&riot_id, Region::Kr, expires_at).await.unwrap().is_none());
        assert!(repo.get_cached_account(&riot_id, Region::Na, before).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn match_cache_upserts_and_purges() {
        let (_dir, repo) = open_repo().await;
        let account = AccountId("puuid-1".into());
        let entry = CachedMatchState {
            account_id: account.clone(),
            region: Region::Kr,
            in_match: false,
            match_id: None,
            participants: Vec::new(),
            expires_at: t0() + Duration::minutes(2),
        };
        repo.put_cached_match_state(&entry).await.unwrap();

        let updated = CachedMatchState {
            in_match: true,
            match_id: Some(42),
            participants: b"[]".to_vec(),
            ..entry
        };
        repo.put_cached_match_state(&updated).await.unwrap();

        let hit = repo
            .get_cached_match_state(&account, Region::Kr, t0())
            .await
            .unwrap()
            .unwrap();
        assert!(hit.in_match);
        assert_eq!(hit.match_id, Some(42));
        assert_eq!(hit.participants, b"[]".to_vec());

        assert_eq!(repo.purge_expired_cache(t0()).await.unwrap(), 0);
        assert_eq!(repo.purge_expired_cache(t0() + Duration::minutes(2)).await.unwrap(), 1);
        assert!(repo
            .get_cached_match_state(&account, Region::Kr, t0())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn translations_survive_reopen_and_upsert() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repo.db");
        let path = path.to_str().unwrap();

        let repo = SqliteRepository::open_path(path).await.unwrap();
        let stored = StoredTranslation {
            original: "玩家2".into(),
            translated: "Player 2".into(),
            provider: "anthropic".into(),
            model: "claude-3-5-haiku-latest".into(),
            created_at: t0(),
        };
        repo.put_translations(std::slice::from_ref(&stored)).await.unwrap();
        repo.shutdown().await.unwrap();
        drop(repo);

        let reopened = SqliteRepository::open_path(path).await.unwrap();
        let names = vec!["玩家2".to_string(), "불꽃".to_string()];
        assert_eq!(reopened.get_translations(&names).await.unwrap(), vec![stored.clone()]);

        let replaced = StoredTranslation {
            translated: "Player Two".into(),
            provider: "gemini".into(),
            model: "gemini-2.0-flash".into(),
            ..stored
        };
        reopened.put_translations(&[replaced.clone()]).await.unwrap();
        assert_eq!(reopened.get_translations(&names).await.unwrap(), vec![replaced]);
        assert!(reopened.get_translations(&[]).await.unwrap().is_empty());
    }
}
