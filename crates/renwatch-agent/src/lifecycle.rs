// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ownership of the long-lived background tasks.
//!
//! Every task is spawned through a [`Lifecycle`], which keeps its handle
//! and name. Shutdown waits for all of them up to a grace period and
//! aborts whatever is left.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info, warn};

/// What happened to the tasks during shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub completed: Vec<String>,
    pub aborted: Vec<String>,
    pub panicked: Vec<String>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.aborted.is_empty() && self.panicked.is_empty()
    }
}

#[derive(Default)]
pub struct Lifecycle {
    tasks: JoinSet<()>,
    names: HashMap<Id, String>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a named background task.
    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let handle = self.tasks.spawn(task);
        debug!(task = %name, "background task spawned");
        self.names.insert(handle.id(), name);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task, aborting stragglers after `grace`.
    ///
    /// Tasks are expected to have been told to stop (cancellation token,
    /// closed queue) before this is called.
    pub async fn shutdown(mut self, grace: Duration) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        let deadline = tokio::time::Instant::now() + grace;

        loop {
            match tokio::time::timeout_at(deadline, self.tasks.join_next_with_id()).await {
                Ok(Some(joined)) => self.record(joined, &mut report),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        remaining = self.tasks.len(),
                        grace_secs = grace.as_secs(),
                        "shutdown grace period elapsed; aborting remaining tasks"
                    );
                    self.tasks.abort_all();
                    while let Some(joined) = self.tasks.join_next_with_id().await {
                        self.record(joined, &mut report);
                    }
                    break;
                }
            }
        }

        if report.is_clean() {
            info!(tasks = report.completed.len(), "all background tasks stopped");
        }
        report
    }

    fn record(
        &mut self,
        joined: Result<(Id, ()), tokio::task::JoinError>,
        report: &mut ShutdownReport,
    ) {
        match joined {
            Ok((id, ())) => {
                let name = self.take_name(id);
                debug!(task = %name, "background task finished");
                report.completed.push(name);
            }
            Err(e) => {
                let name = self.take_name(e.id());
                if e.is_cancelled() {
                    warn!(task = %name, "background task aborted");
                    report.aborted.push(name);
                } else {
                    error!(task = %name, error = %e, "background task panicked");
                    report.panicked.push(name);
                }
            }
        }
    }

    fn take_name(&mut self, id: Id) -> String {
        self.names
            .remove(&id)
            .unwrap_or_else(|| format!("task-{id}"))
    }
}
