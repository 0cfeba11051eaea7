// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic deletion of stale ledger rows, inactive subscriptions, and
//! expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use renwatch_config::model::RetentionConfig;
use renwatch_core::{Clock, RenwatchError, Repository};
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of one subscription sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionSweep {
    /// Subscriptions removed for inactivity.
    pub deleted: u64,
    /// Subscriptions older than the threshold that have never been
    /// evaluated. Reported only; they are never removed by the sweep.
    pub unevaluated: u64,
}

pub struct RetentionSweeper {
    repo: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
    config: RetentionConfig,
}

impl RetentionSweeper {
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>, config: RetentionConfig) -> Self {
        Self {
            repo,
            clock,
            config,
        }
    }

    /// Delete evals recorded before `now - eval_expiration`.
    pub async fn sweep_evals(&self) -> Result<u64, RenwatchError> {
        let cutoff = self.cutoff(self.config.eval_expiration())?;
        let deleted = self.repo.delete_evals_before(cutoff).await?;
        info!(deleted, %cutoff, "expired evals deleted");
        Ok(deleted)
    }

    /// Delete subscriptions whose newest non-offline eval predates
    /// `now - offline_activity_threshold`.
    pub async fn sweep_subscriptions(&self) -> Result<SubscriptionSweep, RenwatchError> {
        let cutoff = self.cutoff(self.config.offline_activity_threshold())?;
        let inactive = self.repo.find_inactive_subscriptions(cutoff).await?;

        let deleted = if inactive.is_empty() {
            0
        } else {
            for sub in &inactive {
                debug!(
                    subscription_id = sub.subscription_id,
                    newest_online_eval = %sub.newest_online_eval,
                    "subscription inactive"
                );
            }
            let ids: Vec<i64> = inactive.iter().map(|s| s.subscription_id).collect();
            self.repo.delete_subscriptions(&ids).await?
        };

        let unevaluated = self.repo.count_unevaluated_subscriptions(cutoff).await?;
        info!(deleted, unevaluated, %cutoff, "inactive subscriptions swept");
        Ok(SubscriptionSweep {
            deleted,
            unevaluated,
        })
    }

    /// Delete cache rows that have expired.
    pub async fn sweep_cache(&self) -> Result<u64, RenwatchError> {
        let purged = self.repo.purge_expired_cache(self.clock.now()).await?;
        debug!(purged, "expired cache entries purged");
        Ok(purged)
    }

    /// Run every sweep on its own timer until `cancel` fires.
    ///
    /// Each timer fires once immediately. A failed sweep is logged and
    /// retried on its next tick.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut evals = ticker(self.config.eval_sweep_interval_secs);
        let mut subscriptions = ticker(self.config.subscription_sweep_interval_secs);
        let mut cache = ticker(self.config.cache_sweep_interval_secs);
        info!("retention sweeper started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = evals.tick() => {
                    if let Err(e) = self.sweep_evals().await {
                        warn!(error = %e, "eval sweep failed");
                    }
                }
                _ = subscriptions.tick() => {
                    if let Err(e) = self.sweep_subscriptions().await {
                        warn!(error = %e, "subscription sweep failed");
                    }
                }
                _ = cache.tick() => {
                    if let Err(e) = self.sweep_cache().await {
                        warn!(error = %e, "cache sweep failed");
                    }
                }
            }
        }
        info!("retention sweeper stopped");
    }

    fn cutoff(&self, age: Duration) -> Result<DateTime<Utc>, RenwatchError> {
        let age = chrono::Duration::from_std(age)
            .map_err(|e| RenwatchError::Internal(format!("retention age out of range: {e}")))?;
        Ok(self.clock.now() - age)
    }
}

fn ticker(secs: u64) -> Interval {
    let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as Span;
    use renwatch_core::types::{NewEval, TxOp};
    use renwatch_core::{EvalStatus, Region};
    use renwatch_test_utils::TestHarness;

    fn sweeper(h: &TestHarness) -> RetentionSweeper {
        RetentionSweeper::new(h.repo.clone(), h.clock.clone(), h.config.retention.clone())
    }

    async fn record(
        h: &TestHarness,
        subscription_id: i64,
        match_id: i64,
        status: EvalStatus,
        at: DateTime<Utc>,
    ) {
        h.repo
            .with_transaction(vec![TxOp::CreateEval(NewEval {
                subscription_id,
                match_id: Some(match_id),
                status,
                message_id: None,
                evaluated_at: at,
            })])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn expired_evals_are_deleted() {
        let h = TestHarness::builder().build().await.unwrap();
        let (sub, _) = h.subscribe("org", "chan", "Faker#KR1", Region::Kr).await.unwrap();
        let now = h.clock.now();
        record(&h, sub.id, 1, EvalStatus::NewTranslations, now - Span::days(31)).await;
        record(&h, sub.id, 2, EvalStatus::NewTranslations, now - Span::days(29)).await;

        assert_eq!(sweeper(&h).sweep_evals().await.unwrap(), 1);
        assert!(h.repo.find_eval(sub.id, 1).await.unwrap().is_none());
        assert!(h.repo.find_eval(sub.id, 2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn inactive_subscriptions_are_deleted_by_newest_online_eval() {
        let h = TestHarness::builder().build().await.unwrap();
        let now = h.clock.now();
        h.clock.set(now - Span::days(40));
        let (stale, _) = h.subscribe("org", "chan", "Stale#NA1", Region::Na).await.unwrap();
        let (fresh, _) = h.subscribe("org", "chan", "Fresh#NA1", Region::Na).await.unwrap();
        let (never, _) = h.subscribe("org", "chan", "Never#NA1", Region::Na).await.unwrap();
        let (offline, _) = h.subscribe("org", "chan", "Offline#NA1", Region::Na).await.unwrap();
        h.clock.set(now);

        record(&h, stale.id, 1, EvalStatus::NewTranslations, now - Span::days(25)).await;
        record(&h, fresh.id, 2, EvalStatus::NewTranslations, now - Span::days(25)).await;
        record(&h, fresh.id, 3, EvalStatus::NewTranslations, now - Span::days(1)).await;
        // Recent offline checks do not count as activity.
        record(&h, offline.id, 4, EvalStatus::NewTranslations, now - Span::days(22)).await;
        record(&h, offline.id, 5, EvalStatus::Offline, now - Span::hours(1)).await;

        let sweep = sweeper(&h).sweep_subscriptions().await.unwrap();
        assert_eq!(sweep.deleted, 2);
        assert_eq!(sweep.unevaluated, 1);

        assert!(h.repo.get_subscription(stale.id).await.unwrap().is_none());
        assert!(h.repo.get_subscription(offline.id).await.unwrap().is_none());
        assert!(h.repo.get_subscription(fresh.id).await.unwrap().is_some());
        assert!(h.repo.get_subscription(never.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn expired_cache_rows_are_purged() {
        let h = TestHarness::builder().build().await.unwrap();
        let riot_id = renwatch_core::RiotId::new("Faker", "KR1");
        h.game_state.add_account(&riot_id).await;
        h.cache.get_account(&riot_id, Region::Kr).await.unwrap();

        assert_eq!(sweeper(&h).sweep_cache().await.unwrap(), 0);
        h.clock.advance(Span::hours(25));
        assert_eq!(sweeper(&h).sweep_cache().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn run_sweeps_on_start_and_stops_on_cancel() {
        let h = TestHarness::builder().build().await.unwrap();
        let (sub, _) = h.subscribe("org", "chan", "Faker#KR1", Region::Kr).await.unwrap();
        record(&h, sub.id, 1, EvalStatus::NewTranslations, h.clock.now() - Span::days(31)).await;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(Arc::new(sweeper(&h)).run(cancel.clone()));

        let mut swept = false;
        for _ in 0..100 {
            if h.repo.find_eval(sub.id, 1).await.unwrap().is_none() {
                swept = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        cancel.cancel();
        task.await.unwrap();
        assert!(swept, "eval sweep should run immediately");
    }
}
