// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PostgreSQL implementation of the Repository trait.
//!
//! Shares the SQLite backend's semantics: the same natural keys, the same
//! eval uniqueness per (subscription, match), and the same cascade from
//! subscriptions to evals. Timestamps are `TIMESTAMPTZ`.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::debug;

use renwatch_config::model::StorageConfig;
use renwatch_core::types::{
    CachedAccount, CachedMatchState, InactiveSubscription, NewEval, NewSubscription,
    StoredTranslation, SubscriptionKey, TxOp, TxOutcome,
};
use renwatch_core::{
    AccountId, AdapterType, ChannelId, Eval, HealthStatus, OrgId, PluginAdapter, Region,
    RenwatchError, Repository, RiotId, Subscription, UserError,
};

use crate::rows::{
    convert_all, DbCachedAccount, DbCachedMatch, DbEval, DbInactive, DbSubscription,
    DbTranslation, EVAL_COLUMNS, SUBSCRIPTION_COLUMNS,
};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres-backed repository over a shared connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Connect using `config.database_url` and run pending migrations.
    ///
    /// Never log the URL; it may carry credentials.
    pub async fn connect(config: &StorageConfig) -> Result<Self, RenwatchError> {
        let url = config.database_url.as_deref().ok_or_else(|| {
            RenwatchError::Config("storage.database_url is required for postgres".into())
        })?;
        let options = PgConnectOptions::from_str(url).map_err(db_err)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(RenwatchError::storage)?;

        debug!(max_connections = config.max_connections, "Postgres repository connected");
        Ok(Self { pool })
    }

    /// Wrap an existing pool. The schema must already be migrated.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> RenwatchError {
    RenwatchError::storage(e)
}

/// True for Postgres `unique_violation` (SQLSTATE 23505).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

async fn insert_eval(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    new: &NewEval,
) -> Result<Eval, RenwatchError> {
    let row = sqlx::query_as::<_, DbEval>(sqlx::AssertSqlSafe(format!(
        "INSERT INTO evals (subscription_id, match_id, status, message_id, evaluated_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {EVAL_COLUMNS}"
    )))
    .bind(new.subscription_id)
    .bind(new.match_id)
    .bind(new.status.to_string())
    .bind(new.message_id.as_ref().map(|m| m.0.clone()))
    .bind(new.evaluated_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(db_err)?;
    Eval::try_from(row)
}

#[async_trait]
impl PluginAdapter for PostgresRepository {
    fn name(&self) -> &str {
        "postgres"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Repository
    }

    async fn health_check(&self) -> Result<HealthStatus, RenwatchError> {
        match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), RenwatchError> {
        self.pool.close().await;
        debug!("shutdown: Postgres pool closed");
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_subscription(
        &self,
        new: &NewSubscription,
    ) -> Result<Subscription, RenwatchError> {
        let already = || -> RenwatchError {
            UserError::AlreadySubscribed {
                riot_id: new.account.to_string(),
                region: new.region.to_string(),
            }
            .into()
        };

        let inserted = sqlx::query_as::<_, DbSubscription>(sqlx::AssertSqlSafe(format!(
            "INSERT INTO subscriptions
                (org_id, channel_id, game_name, tag_line, region, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (channel_id, game_name, tag_line, region) DO NOTHING
             RETURNING {SUBSCRIPTION_COLUMNS}"
        )))
        .bind(&new.org_id.0)
        .bind(&new.channel_id.0)
        .bind(&new.account.game_name)
        .bind(&new.account.tag_line)
        .bind(new.region.to_string())
        .bind(new.created_at)
        .fetch_optional(&self.pool)
        .await;

        match inserted {
            Ok(Some(row)) => Subscription::try_from(row),
            Ok(None) => Err(already()),
            Err(e) if is_unique_violation(&e) => Err(already()),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn get_subscription(&self, id: i64) -> Result<Option<Subscription>, RenwatchError> {
        sqlx::query_as::<_, DbSubscription>(sqlx::AssertSqlSafe(format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(Subscription::try_from)
        .transpose()
    }

    async fn list_subscriptions(&self, limit: u32) -> Result<Vec<Subscription>, RenwatchError> {
        let rows = sqlx::query_as::<_, DbSubscription>(sqlx::AssertSqlSafe(format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
             ORDER BY last_evaluated_at ASC NULLS FIRST, id ASC
             LIMIT $1"
        )))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        convert_all(rows)
    }

    async fn list_subscriptions_by_channel(
        &self,
        channel_id: &ChannelId,
    ) -> Result<Vec<Subscription>, RenwatchError> {
        let rows = sqlx::query_as::<_, DbSubscription>(sqlx::AssertSqlSafe(format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE channel_id = $1 ORDER BY id ASC"
        )))
        .bind(&channel_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        convert_all(rows)
    }

    async fn count_subscriptions_by_org(&self, org_id: &OrgId) -> Result<u64, RenwatchError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions WHERE org_id = $1")
            .bind(&org_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(n as u64)
    }

    async fn delete_subscription(&self, key: &SubscriptionKey) -> Result<u64, RenwatchError> {
        let result = sqlx::query(
            "DELETE FROM subscriptions
             WHERE channel_id = $1 AND game_name = $2 AND tag_line = $3 AND region = $4",
        )
        .bind(&key.channel_id.0)
        .bind(&key.account.game_name)
        .bind(&key.account.tag_line)
        .bind(key.region.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn delete_subscriptions(&self, ids: &[i64]) -> Result<u64, RenwatchError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn find_eval(
        &self,
        subscription_id: i64,
        match_id: i64,
    ) -> Result<Option<Eval>, RenwatchError> {
        sqlx::query_as::<_, DbEval>(sqlx::AssertSqlSafe(format!(
            "SELECT {EVAL_COLUMNS} FROM evals WHERE subscription_id = $1 AND match_id = $2"
        )))
        .bind(subscription_id)
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(Eval::try_from)
        .transpose()
    }

    async fn delete_evals_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RenwatchError> {
        let result = sqlx::query("DELETE FROM evals WHERE evaluated_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn find_inactive_subscriptions(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<InactiveSubscription>, RenwatchError> {
        let rows = sqlx::query_as::<_, DbInactive>(
            "SELECT subscription_id, MAX(evaluated_at) AS newest_online_eval
             FROM evals
             WHERE status <> 'OFFLINE'
             GROUP BY subscription_id
             HAVING MAX(evaluated_at) < $1
             ORDER BY subscription_id",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(InactiveSubscription::from).collect())
    }

    async fn count_unevaluated_subscriptions(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RenwatchError> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subscriptions s
             WHERE s.created_at < $1
               AND NOT EXISTS (SELECT 1 FROM evals e WHERE e.subscription_id = s.id)",
        )
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(n as u64)
    }

    async fn with_transaction(&self, ops: Vec<TxOp>) -> Result<Vec<TxOutcome>, RenwatchError> {
        // Any early return drops `tx` uncommitted, which rolls it back.
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut outcomes = Vec::with_capacity(ops.len());
        for op in &ops {
            let outcome = match op {
                TxOp::CreateEval(new) => TxOutcome::EvalCreated(insert_eval(&mut tx, new).await?),
                TxOp::TouchSubscription { id, at } => {
                    let result =
                        sqlx::query("UPDATE subscriptions SET last_evaluated_at = $1 WHERE id = $2")
                            .bind(*at)
                            .bind(*id)
                            .execute(&mut *tx)
                            .await
                            .map_err(db_err)?;
                    if result.rows_affected() == 0 {
                        return Err(RenwatchError::not_found(format!("subscription {id}")));
                    }
                    TxOutcome::Touched
                }
                TxOp::DeleteSubscriptions(ids) => {
                    let result = sqlx::query("DELETE FROM subscriptions WHERE id = ANY($1)")
                        .bind(ids.as_slice())
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err)?;
                    TxOutcome::Deleted(result.rows_affected())
                }
            };
            outcomes.push(outcome);
        }
        tx.commit().await.map_err(db_err)?;
        Ok(outcomes)
    }

    async fn get_cached_account(
        &self,
        riot_id: &RiotId,
        region: Region,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedAccount>, RenwatchError> {
        let row = sqlx::query_as::<_, DbCachedAccount>(
            "SELECT account_id, expires_at FROM account_cache
             WHERE game_name = $1 AND tag_line = $2 AND region = $3 AND expires_at > $4",
        )
        .bind(&riot_id.game_name)
        .bind(&riot_id.tag_line)
        .bind(region.to_string())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|row| CachedAccount {
            riot_id: riot_id.clone(),
            region,
            account_id: AccountId(row.account_id),
            expires_at: row.expires_at,
        }))
    }

    async fn put_cached_account(&self, entry: &CachedAccount) -> Result<(), RenwatchError> {
        sqlx::query(
            "INSERT INTO account_cache (game_name, tag_line, region, account_id, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (game_name, tag_line, region)
             DO UPDATE SET account_id = EXCLUDED.account_id, expires_at = EXCLUDED.expires_at",
        )
        .bind(&entry.riot_id.game_name)
        .bind(&entry.riot_id.tag_line)
        .bind(entry.region.to_string())
        .bind(&entry.account_id.0)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_cached_match_state(
        &self,
        account_id: &AccountId,
        region: Region,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedMatchState>, RenwatchError> {
        let row = sqlx::query_as::<_, DbCachedMatch>(
            "SELECT in_match, match_id, participants, expires_at FROM match_cache
             WHERE account_id = $1 AND region = $2 AND expires_at > $3",
        )
        .bind(&account_id.0)
        .bind(region.to_string())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|row| CachedMatchState {
            account_id: account_id.clone(),
            region,
            in_match: row.in_match,
            match_id: row.match_id,
            participants: row.participants,
            expires_at: row.expires_at,
        }))
    }

    async fn put_cached_match_state(
        &self,
        entry: &CachedMatchState,
    ) -> Result<(), RenwatchError> {
        sqlx::query(
            "INSERT INTO match_cache (account_id, region, in_match, match_id, participants, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (account_id, region)
             DO UPDATE SET in_match = EXCLUDED.in_match,
                           match_id = EXCLUDED.match_id,
                           participants = EXCLUDED.participants,
                           expires_at = EXCLUDED.expires_at",
        )
        .bind(&entry.account_id.0)
        .bind(entry.region.to_string())
        .bind(entry.in_match)
        .bind(entry.match_id)
        .bind(&entry.participants)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn purge_expired_cache(&self, now: DateTime<Utc>) -> Result<u64, RenwatchError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let accounts = sqlx::query("DELETE FROM account_cache WHERE expires_at <= $1")
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let matches = sqlx::query("DELETE FROM match_cache WHERE expires_at <= $1")
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(accounts.rows_affected() + matches.rows_affected())
    }

    async fn get_translations(
        &self,
        originals: &[String],
    ) -> Result<Vec<StoredTranslation>, RenwatchError> {
        if originals.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, DbTranslation>(
            "SELECT original, translated, provider, model, created_at
             FROM translations WHERE original = ANY($1)",
        )
        .bind(originals)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(StoredTranslation::from).collect())
    }

    async fn put_translations(&self, entries: &[StoredTranslation]) -> Result<(), RenwatchError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for entry in entries {
            sqlx::query(
                "INSERT INTO translations (original, translated, provider, model, created_at)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (original)
                 DO UPDATE SET translated = EXCLUDED.translated,
                               provider = EXCLUDED.provider,
                               model = EXCLUDED.model,
                               created_at = EXCLUDED.created_at",
            )
            .bind(&entry.original)
            .bind(&entry.translated)
            .bind(&entry.provider)
            .bind(&entry.model)
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}
