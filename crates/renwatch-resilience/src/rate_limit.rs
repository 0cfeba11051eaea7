// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-actor sliding-window rate limiter.
//!
//! Each actor keeps an ordered list of the instants at which its recent
//! commands were accepted. A check first drops instants that have aged out
//! of the window, then rejects if the remaining count is at the limit.
//!
//! Pruning is lazy. Actors who stop sending commands keep a small residual
//! entry until the periodic map-wide cleanup runs (every
//! [`CLEANUP_EVERY`] checks), which bounds memory without a background task.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use renwatch_config::model::RateLimitConfig;
use renwatch_core::UserError;
use tokio::time::Instant;
use tracing::debug;

/// Run a whole-map cleanup once per this many checks.
pub const CLEANUP_EVERY: u64 = 100;

/// Sliding-window limiter keyed by actor id.
pub struct SlidingWindowLimiter {
    max: usize,
    window: Duration,
    state: Mutex<HashMap<String, VecDeque<Instant>>>,
    checks: AtomicU64,
}

impl SlidingWindowLimiter {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            state: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_commands, Duration::from_secs(config.window_secs))
    }

    /// Record an action for `actor` if the window has room.
    ///
    /// Returns [`UserError::RateLimited`] without recording anything when
    /// the actor already has `max` actions inside the window.
    pub fn check(&self, actor: &str) -> Result<(), UserError> {
        let now = Instant::now();

        let count = self.checks.fetch_add(1, Ordering::Relaxed);
        if count > 0 && count % CLEANUP_EVERY == 0 {
            self.cleanup_at(now);
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let stamps = state.entry(actor.to_string()).or_default();
        self.prune(stamps, now);

        if stamps.len() >= self.max {
            debug!(actor, recent = stamps.len(), max = self.max, "command rate limit exceeded");
            return Err(UserError::RateLimited {
                max: self.max,
                window_secs: self.window.as_secs(),
            });
        }

        stamps.push_back(now);
        Ok(())
    }

    /// Drop every actor whose window has fully elapsed.
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    /// Number of actors currently holding window state.
    pub fn tracked_actors(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn cleanup_at(&self, now: Instant) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = state.len();
        state.retain(|_, stamps| {
            self.prune(stamps, now);
            !stamps.is_empty()
        });
        debug!(removed = before - state.len(), "rate limiter cleanup");
    }

    // An instant exactly `window` old has left the window.
    fn prune(&self, stamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = stamps.front() {
            if now.duration_since(oldest) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_test::traced_test;

    #[tokio::test(start_paused = true)]
    async fn allows_exactly_max_within_window() {
        let limiter = SlidingWindowLimiter::new(5, Duration::from_secs(60));
        for _ in 0..5 {
            limiter.check("alice").unwrap();
        }
        let err = limiter.check("alice").unwrap_err();
        assert_eq!(
            err,
            UserError::RateLimited {
                max: 5,
                window_secs: 60
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn window_reopens_after_first_action_ages_out() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(60));
        limiter.check("alice").unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        limiter.check("alice").unwrap();
        assert!(limiter.check("alice").is_err());

        // 59s after the first action it still counts.
        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(limiter.check("alice").is_err());

        // Past 60s the first action leaves the window; the second still counts.
        tokio::time::advance(Duration::from_secs(2)).await;
        limiter.check("alice").unwrap();
        assert!(limiter.check("alice").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_checks_do_not_extend_the_window() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(10));
        limiter.check("bob").unwrap();
        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(1)).await;
            assert!(limiter.check("bob").is_err());
        }
        tokio::time::advance(Duration::from_secs(5)).await;
        limiter.check("bob").unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn actors_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        limiter.check("alice").unwrap();
        limiter.check("bob").unwrap();
        assert!(limiter.check("alice").is_err());
        assert_eq!(limiter.tracked_actors(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_drops_idle_actors() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_secs(60));
        limiter.check("alice").unwrap();
        limiter.check("bob").unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        limiter.check("carol").unwrap();

        limiter.cleanup();
        assert_eq!(limiter.tracked_actors(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_checks_never_exceed_limit() {
        let limiter = Arc::new(SlidingWindowLimiter::new(10, Duration::from_secs(60)));
        let mut handles = Vec::new();
        for _ in 0..50 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move { limiter.check("mob").is_ok() }));
        }
        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 10);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn rejections_stay_below_warn() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        limiter.check("alice").unwrap();
        assert!(limiter.check("alice").is_err());

        assert!(logs_contain("command rate limit exceeded"));
        assert!(!logs_contain("WARN"));
    }

    #[test]
    fn from_config_uses_configured_limits() {
        let config = RateLimitConfig {
            max_commands: 3,
            window_secs: 15,
        };
        let limiter = SlidingWindowLimiter::from_config(&config);
        assert_eq!(limiter.max, 3);
        assert_eq!(limiter.window, Duration::from_secs(15));
    }
}
