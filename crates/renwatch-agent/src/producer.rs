// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The evaluation cycle: find subscriptions whose account is in a match
//! that has not been handled yet, translate the foreign names, and queue
//! one delivery job per (subscription, match).
//!
//! Lookups fan out one task per subscription under a shared semaphore.
//! Tasks are started round-robin across organizations so a server with many
//! subscriptions cannot starve the others. A failure is confined to its own
//! subscription; the next cycle is the retry.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use renwatch_cache::GameStateCache;
use renwatch_config::model::PollerConfig;
use renwatch_core::account::display_name;
use renwatch_core::script::needs_translation;
use renwatch_core::types::Participant;
use renwatch_core::{
    AccountId, DeliveryJob, MatchState, OrgId, RenwatchError, Repository, RiotId, Subscription,
    Translator,
};
use tokio::sync::{Semaphore, mpsc};
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::delivery::InFlight;

/// Summary of one production cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub subscriptions: usize,
    pub failures: usize,
    pub jobs: usize,
    pub queued: usize,
    pub abandoned: usize,
    /// Lookups were cut short by the cycle timeout or shutdown.
    pub interrupted: bool,
}

/// Produces delivery jobs from the subscription roster.
pub struct Producer {
    repo: Arc<dyn Repository>,
    cache: Arc<GameStateCache>,
    translator: Arc<dyn Translator>,
    in_flight: Arc<InFlight>,
    config: PollerConfig,
    offer_timeout: Duration,
}

impl Producer {
    pub fn new(
        repo: Arc<dyn Repository>,
        cache: Arc<GameStateCache>,
        translator: Arc<dyn Translator>,
        in_flight: Arc<InFlight>,
        config: PollerConfig,
        offer_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            cache,
            translator,
            in_flight,
            config,
            offer_timeout,
        }
    }

    /// Run cycles until `cancel` fires, then drop the queue sender.
    pub async fn run(self: Arc<Self>, tx: mpsc::Sender<DeliveryJob>, cancel: CancellationToken) {
        info!(
            interval_secs = self.config.interval_secs,
            batch_limit = self.config.subscription_batch_limit,
            "producer started"
        );
        while !cancel.is_cancelled() {
            match self.run_cycle(&tx, &cancel).await {
                Ok(report) => info!(
                    subscriptions = report.subscriptions,
                    failures = report.failures,
                    jobs = report.jobs,
                    queued = report.queued,
                    abandoned = report.abandoned,
                    interrupted = report.interrupted,
                    "production cycle finished"
                ),
                Err(e) => warn!(error = %e, "production cycle failed"),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval()) => {}
            }
        }
        drop(tx);
        info!("producer stopped");
    }

    /// One full cycle: evaluate, then offer every job to the queue.
    pub async fn run_cycle(
        self: &Arc<Self>,
        tx: &mpsc::Sender<DeliveryJob>,
        cancel: &CancellationToken,
    ) -> Result<CycleReport, RenwatchError> {
        let (mut report, jobs) = self.evaluate(cancel).await?;
        let (queued, abandoned) = self.offer(jobs, tx).await;
        report.queued = queued;
        report.abandoned = abandoned;
        Ok(report)
    }

    /// Evaluate a bounded slice of subscriptions and collect the resulting jobs.
    pub async fn evaluate(
        self: &Arc<Self>,
        cancel: &CancellationToken,
    ) -> Result<(CycleReport, Vec<DeliveryJob>), RenwatchError> {
        let subs = self
            .repo
            .list_subscriptions(self.config.subscription_batch_limit)
            .await?;
        let mut report = CycleReport {
            subscriptions: subs.len(),
            ..CycleReport::default()
        };

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_lookups.max(1)));
        let mut tasks = JoinSet::new();
        for sub in interleave_by_org(subs) {
            let this = Arc::clone(self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let id = sub.id;
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => this.evaluate_subscription(&sub).await,
                    Err(_) => Err(RenwatchError::Internal("lookup semaphore closed".into())),
                };
                (id, result)
            });
        }

        let deadline = tokio::time::Instant::now() + self.config.cycle_timeout();
        let mut jobs = Vec::new();
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => None,
                joined = tokio::time::timeout_at(deadline, tasks.join_next()) => match joined {
                    Ok(next) => Some(next),
                    Err(_) => {
                        warn!(remaining = tasks.len(), "cycle timeout reached; abandoning lookups");
                        None
                    }
                },
            };
            let Some(next) = next else {
                report.interrupted = true;
                tasks.abort_all();
                break;
            };
            match next {
                None => break,
                Some(Ok((_, Ok(Some(job))))) => jobs.push(job),
                Some(Ok((_, Ok(None)))) => {}
                Some(Ok((subscription_id, Err(e)))) => {
                    report.failures += 1;
                    warn!(subscription_id, error = %e, class = %e.class(), "subscription evaluation failed");
                }
                Some(Err(e)) => {
                    report.failures += 1;
                    warn!(error = %e, "evaluation task did not complete");
                }
            }
        }

        // Tasks that finished before the abort still carry claimed jobs.
        while let Some(joined) = tasks.join_next().await {
            if let Ok((_, Ok(Some(job)))) = joined {
                jobs.push(job);
            }
        }

        report.jobs = jobs.len();
        Ok((report, jobs))
    }

    /// Evaluate one subscription. `Ok(None)` means nothing to deliver.
    ///
    /// Account resolution precedes the match lookup, which precedes the
    /// ledger check. A returned job has its pair claimed in [`InFlight`];
    /// whoever ends up holding the job releases it.
    pub async fn evaluate_subscription(
        &self,
        sub: &Subscription,
    ) -> Result<Option<DeliveryJob>, RenwatchError> {
        let account = self.cache.get_account(&sub.account, sub.region).await?;
        let info = match self.cache.get_match_state(&account.id, sub.region).await? {
            MatchState::InMatch(info) => info,
            MatchState::NotInMatch => {
                debug!(subscription_id = sub.id, "account not in a match");
                return Ok(None);
            }
        };
        let match_id = info.match_id;

        if self.in_flight.contains(sub.id, match_id) {
            debug!(subscription_id = sub.id, match_id, "match already queued");
            return Ok(None);
        }
        if self.repo.find_eval(sub.id, match_id).await?.is_some() {
            debug!(subscription_id = sub.id, match_id, "match already evaluated");
            return Ok(None);
        }

        let names = names_to_translate(&sub.account, &account.id, &info.participants);
        if names.is_empty() {
            debug!(subscription_id = sub.id, match_id, "no foreign names in match");
            return Ok(None);
        }

        let translations = self.translator.translate(&names).await?;
        // Claim after the last await: an aborted task holds no claim.
        if !self.in_flight.claim(sub.id, match_id) {
            return Ok(None);
        }
        Ok(Some(DeliveryJob {
            subscription_id: sub.id,
            channel_id: sub.channel_id.clone(),
            account: sub.account.clone(),
            match_id,
            translations,
        }))
    }

    /// Offer jobs to the queue, waiting at most `offer_timeout` per job.
    ///
    /// On a timeout or a closed queue the remaining jobs are dropped and
    /// released; no eval exists for them, so a later cycle finds them again.
    /// Returns (queued, abandoned).
    pub async fn offer(
        &self,
        jobs: Vec<DeliveryJob>,
        tx: &mpsc::Sender<DeliveryJob>,
    ) -> (usize, usize) {
        let total = jobs.len();
        let mut queued = 0;
        let mut jobs = jobs.into_iter();
        while let Some(job) = jobs.next() {
            let (subscription_id, match_id) = (job.subscription_id, job.match_id);
            match tx.send_timeout(job, self.offer_timeout).await {
                Ok(()) => {
                    queued += 1;
                    debug!(subscription_id, match_id, "job queued");
                }
                Err(e) => {
                    let reason = match e {
                        SendTimeoutError::Timeout(_) => "queue full past offer timeout",
                        SendTimeoutError::Closed(_) => "queue closed",
                    };
                    self.in_flight.release(subscription_id, match_id);
                    for rest in jobs.by_ref() {
                        self.in_flight.release(rest.subscription_id, rest.match_id);
                    }
                    warn!(abandoned = total - queued, reason, "abandoning remaining jobs for this cycle");
                    break;
                }
            }
        }
        (queued, total - queued)
    }
}

/// Display names in `participants` that need translation.
///
/// The tracked account itself is skipped. Order follows the participant
/// list; duplicates are dropped.
pub fn names_to_translate(
    tracked: &RiotId,
    tracked_id: &AccountId,
    participants: &[Participant],
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for p in participants {
        if tracked.matches(&p.riot_id) || p.account_id.as_ref() == Some(tracked_id) {
            continue;
        }
        let name = display_name(&p.riot_id);
        if needs_translation(name) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Order subscriptions round-robin across organizations.
///
/// Within an organization the repository's order (least recently
/// evaluated first) is preserved.
pub fn interleave_by_org(subs: Vec<Subscription>) -> Vec<Subscription> {
    let total = subs.len();
    let mut groups: BTreeMap<OrgId, VecDeque<Subscription>> = BTreeMap::new();
    for sub in subs {
        groups.entry(sub.org_id.clone()).or_default().push_back(sub);
    }

    let mut out = Vec::with_capacity(total);
    while out.len() < total {
        for queue in groups.values_mut() {
            if let Some(sub) = queue.pop_front() {
                out.push(sub);
            }
        }
    }
    out
}
