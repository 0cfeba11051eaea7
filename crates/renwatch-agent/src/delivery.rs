// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded delivery queue and the worker pool that drains it.
//!
//! A worker sends the notification first and then records the eval and the
//! subscription touch in one repository transaction. If that transaction
//! fails the message is already out, so the worker replies to it with a
//! warning and reports an invariant violation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use renwatch_core::types::{NewEval, TxOp, TxOutcome};
use renwatch_core::{
    Clock, DeliveryJob, ErrorClass, Eval, EvalStatus, MessageServer, RenwatchError, Repository,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Text posted under a notification whose ledger write failed.
pub const ORPHAN_NOTICE: &str =
    "⚠️ This notification could not be recorded and may be posted again.";

/// Receiving half of the delivery queue, shared by every worker.
pub type JobReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<DeliveryJob>>>;

/// Create the bounded producer-to-worker queue.
pub fn queue(capacity: usize) -> (mpsc::Sender<DeliveryJob>, JobReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, Arc::new(tokio::sync::Mutex::new(rx)))
}

/// (subscription, match) pairs that are queued or being delivered.
///
/// The producer skips pairs listed here so a job that is still waiting in
/// the queue is not discovered and queued a second time.
#[derive(Debug, Default)]
pub struct InFlight {
    pairs: Mutex<HashSet<(i64, i64)>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a pair in flight. False if it already was.
    pub fn claim(&self, subscription_id: i64, match_id: i64) -> bool {
        self.lock().insert((subscription_id, match_id))
    }

    pub fn release(&self, subscription_id: i64, match_id: i64) {
        self.lock().remove(&(subscription_id, match_id));
    }

    pub fn contains(&self, subscription_id: i64, match_id: i64) -> bool {
        self.lock().contains(&(subscription_id, match_id))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<(i64, i64)>> {
        self.pairs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Performs one delivery: send, then record atomically.
#[derive(Clone)]
pub struct Deliverer {
    repo: Arc<dyn Repository>,
    messages: Arc<dyn MessageServer>,
    clock: Arc<dyn Clock>,
    in_flight: Arc<InFlight>,
    send_timeout: Duration,
}

impl Deliverer {
    pub fn new(
        repo: Arc<dyn Repository>,
        messages: Arc<dyn MessageServer>,
        clock: Arc<dyn Clock>,
        in_flight: Arc<InFlight>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            messages,
            clock,
            in_flight,
            send_timeout,
        }
    }

    /// Deliver one job and return the eval that records it.
    pub async fn deliver(&self, job: &DeliveryJob) -> Result<Eval, RenwatchError> {
        let notification = job.notification();
        let message_id = tokio::time::timeout(
            self.send_timeout,
            self.messages.send(&job.channel_id, &notification),
        )
        .await
        .map_err(|_| RenwatchError::Timeout {
            duration: self.send_timeout,
        })??;

        let now = self.clock.now();
        let ops = vec![
            TxOp::CreateEval(NewEval {
                subscription_id: job.subscription_id,
                match_id: Some(job.match_id),
                status: EvalStatus::NewTranslations,
                message_id: Some(message_id.clone()),
                evaluated_at: now,
            }),
            TxOp::TouchSubscription {
                id: job.subscription_id,
                at: now,
            },
        ];

        match self.repo.with_transaction(ops).await {
            Ok(outcomes) => match outcomes.into_iter().next() {
                Some(TxOutcome::EvalCreated(eval)) => Ok(eval),
                other => Err(RenwatchError::Internal(format!(
                    "unexpected transaction outcome {other:?}"
                ))),
            },
            Err(e) => {
                if let Err(reply_err) = self
                    .messages
                    .reply_to(&job.channel_id, &message_id, ORPHAN_NOTICE)
                    .await
                {
                    warn!(
                        subscription_id = job.subscription_id,
                        message_id = %message_id,
                        error = %reply_err,
                        "failed to flag unrecorded notification"
                    );
                }
                Err(RenwatchError::InvariantViolation {
                    message: format!(
                        "notification {message_id} for subscription {} match {} was sent but not recorded",
                        job.subscription_id, job.match_id
                    ),
                    source: Some(Box::new(e)),
                })
            }
        }
    }

    /// Drain the queue until every sender is gone.
    ///
    /// A job that has been dequeued always runs to completion; cancellation
    /// is expressed by the producer dropping its sender.
    pub async fn run_worker(self, worker_id: usize, rx: JobReceiver) {
        debug!(worker_id, "delivery worker started");
        loop {
            let job = { rx.lock().await.recv().await };
            let Some(job) = job else { break };

            let result = self.deliver(&job).await;
            self.in_flight.release(job.subscription_id, job.match_id);

            match result {
                Ok(eval) => info!(
                    worker_id,
                    subscription_id = job.subscription_id,
                    match_id = job.match_id,
                    channel_id = %job.channel_id,
                    eval_id = eval.id,
                    "notification delivered"
                ),
                Err(e) if e.class() == ErrorClass::Invariant => error!(
                    worker_id,
                    subscription_id = job.subscription_id,
                    match_id = job.match_id,
                    error = %e,
                    "delivered notification has no ledger row"
                ),
                Err(e) => warn!(
                    worker_id,
                    subscription_id = job.subscription_id,
                    match_id = job.match_id,
                    error = %e,
                    "delivery failed; will retry next cycle"
                ),
            }
        }
        debug!(worker_id, "delivery worker stopped");
    }
}
