// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`GameStateCache`]: read-through account and match-state lookups.
//!
//! A fresh entry is returned without calling upstream, including a cached
//! "not in match". On a miss the upstream is called once and the result is
//! written back before returning. Upstream errors are never cached.

use std::sync::Arc;

use chrono::Duration;
use renwatch_config::model::CacheConfig;
use renwatch_core::types::{CachedAccount, CachedMatchState, Participant};
use renwatch_core::{
    Account, AccountId, Clock, GameStateProvider, MatchInfo, MatchState, Region, RenwatchError,
    Repository, RiotId,
};
use tracing::{debug, warn};

/// Cache-aside wrapper around a [`GameStateProvider`].
pub struct GameStateCache {
    repo: Arc<dyn Repository>,
    upstream: Arc<dyn GameStateProvider>,
    clock: Arc<dyn Clock>,
    account_ttl: Duration,
    match_ttl: Duration,
}

impl GameStateCache {
    pub fn new(
        repo: Arc<dyn Repository>,
        upstream: Arc<dyn GameStateProvider>,
        clock: Arc<dyn Clock>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            repo,
            upstream,
            clock,
            account_ttl: Duration::seconds(config.account_ttl_secs as i64),
            match_ttl: Duration::seconds(config.match_ttl_secs as i64),
        }
    }

    /// Resolve a Riot ID to an account.
    ///
    /// Entries are keyed by the canonical Riot ID the upstream returns, which
    /// is the form subscriptions store.
    pub async fn get_account(
        &self,
        riot_id: &RiotId,
        region: Region,
    ) -> Result<Account, RenwatchError> {
        let now = self.clock.now();
        if let Some(hit) = self.repo.get_cached_account(riot_id, region, now).await? {
            debug!(riot_id = %riot_id, %region, "account cache hit");
            return Ok(Account {
                id: hit.account_id,
                riot_id: hit.riot_id,
            });
        }

        let account = self.upstream.lookup_account(riot_id, region).await?;
        let entry = CachedAccount {
            riot_id: account.riot_id.clone(),
            region,
            account_id: account.id.clone(),
            expires_at: now + self.account_ttl,
        };
        if let Err(e) = self.repo.put_cached_account(&entry).await {
            warn!(riot_id = %riot_id, error = %e, "failed to cache account lookup");
        }
        Ok(account)
    }

    /// Current match state for an account.
    pub async fn get_match_state(
        &self,
        account_id: &AccountId,
        region: Region,
    ) -> Result<MatchState, RenwatchError> {
        let now = self.clock.now();
        if let Some(hit) = self
            .repo
            .get_cached_match_state(account_id, region, now)
            .await?
        {
            match decode(&hit) {
                Some(state) => {
                    debug!(account_id = %account_id, %region, "match cache hit");
                    return Ok(state);
                }
                None => warn!(account_id = %account_id, "discarding undecodable match cache entry"),
            }
        }

        let state = self.upstream.lookup_match_state(account_id, region).await?;
        let entry = encode(account_id, region, &state, now + self.match_ttl)?;
        if let Err(e) = self.repo.put_cached_match_state(&entry).await {
            warn!(account_id = %account_id, error = %e, "failed to cache match state");
        }
        Ok(state)
    }
}

fn encode(
    account_id: &AccountId,
    region: Region,
    state: &MatchState,
    expires_at: chrono::DateTime<chrono::Utc>,
) -> Result<CachedMatchState, RenwatchError> {
    let (in_match, match_id, participants) = match state {
        MatchState::InMatch(info) => (
            true,
            Some(info.match_id),
            serde_json::to_vec(&info.participants)
                .map_err(|e| RenwatchError::Internal(format!("encode participants: {e}")))?,
        ),
        MatchState::NotInMatch => (false, None, Vec::new()),
    };
    Ok(CachedMatchState {
        account_id: account_id.clone(),
        region,
        in_match,
        match_id,
        participants,
        expires_at,
    })
}

fn decode(entry: &CachedMatchState) -> Option<MatchState> {
    if !entry.in_match {
        return Some(MatchState::NotInMatch);
    }
    let match_id = entry.match_id?;
    let participants: Vec<Participant> = serde_json::from_slice(&entry.participants).ok()?;
    Some(MatchState::InMatch(MatchInfo {
        match_id,
        participants,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use renwatch_core::{AdapterType, HealthStatus, PluginAdapter};
    use renwatch_storage::SqliteRepository;
    use tempfile::TempDir;

    struct StepClock(Mutex<DateTime<Utc>>);

    impl StepClock {
        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    #[derive(Default)]
    struct CountingUpstream {
        account_calls: AtomicUsize,
        match_calls: AtomicUsize,
        state: Mutex<Option<MatchState>>,
        fail: Mutex<bool>,
    }

    #[async_trait]
    impl PluginAdapter for CountingUpstream {
        fn name(&self) -> &str {
            "counting"
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
            Ok(())
        }
    }

    #[async_trait]
    impl GameStateProvider for CountingUpstream {
        async fn lookup_account(
            &self,
            riot_id: &RiotId,
            _region: Region,
        ) -> Result<Account, RenwatchError> {
            self.account_calls.fetch_add(1, Ordering::SeqCst);
            if riot_id.game_name == "ghost" {
                return Err(RenwatchError::not_found("account"));
            }
            Ok(Account {
                id: AccountId(format!("puuid-{}", riot_id.game_name.to_lowercase())),
                riot_id: RiotId::new("Faker", "KR1"),
            })
        }

        async fn lookup_match_state(
            &self,
            _account_id: &AccountId,
            _region: Region,
        ) -> Result<MatchState, RenwatchError> {
            self.match_calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail.lock().unwrap() {
                return Err(RenwatchError::Upstream {
                    message: "503".into(),
                    source: None,
                });
            }
            Ok(self
                .state
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(MatchState::NotInMatch))
        }
    }

    struct Fixture {
        _dir: TempDir,
        cache: GameStateCache,
        upstream: Arc<CountingUpstream>,
        clock: Arc<StepClock>,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let repo = Arc::new(SqliteRepository::open_path(path.to_str().unwrap()).await.unwrap());
        let upstream = Arc::new(CountingUpstream::default());
        let clock = Arc::new(StepClock(Mutex::new(
            Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
        )));
        let config = CacheConfig {
            account_ttl_secs: 3600,
            match_ttl_secs: 120,
        };
        let cache = GameStateCache::new(repo, upstream.clone(), clock.clone(), &config);
        Fixture {
            _dir: dir,
            cache,
            upstream,
            clock,
        }
    }

    fn in_match(id: i64) -> MatchState {
        MatchState::InMatch(MatchInfo {
            match_id: id,
            participants: vec![
                Participant {
                    riot_id: "Faker#KR1".into(),
                    account_id: Some(AccountId("puuid-faker".into())),
                },
                Participant {
                    riot_id: "玩家2#CN1".into(),
                    account_id: None,
                },
            ],
        })
    }

    #[tokio::test]
    async fn account_is_cached_under_canonical_id() {
        let f = fixture().await;
        let canonical = RiotId::new("Faker", "KR1");

        let first = f.cache.get_account(&canonical, Region::Kr).await.unwrap();
        let second = f.cache.get_account(&canonical, Region::Kr).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(f.upstream.account_calls.load(Ordering::SeqCst), 1);

        f.clock.advance(Duration::seconds(3600));
        f.cache.get_account(&canonical, Region::Kr).await.unwrap();
        assert_eq!(f.upstream.account_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_account_is_not_cached() {
        let f = fixture().await;
        let ghost = RiotId::new("ghost", "NA1");
        for _ in 0..2 {
            let err = f.cache.get_account(&ghost, Region::Na).await.unwrap_err();
            assert!(err.is_not_found());
        }
        assert_eq!(f.upstream.account_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn not_in_match_is_negatively_cached() {
        let f = fixture().await;
        let account = AccountId("puuid-faker".into());

        assert_eq!(
            f.cache.get_match_state(&account, Region::Kr).await.unwrap(),
            MatchState::NotInMatch
        );
        // Upstream changes, but the negative entry is still fresh.
        *f.upstream.state.lock().unwrap() = Some(in_match(7));
        assert_eq!(
            f.cache.get_match_state(&account, Region::Kr).await.unwrap(),
            MatchState::NotInMatch
        );
        assert_eq!(f.upstream.match_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn match_entry_expires_exactly_at_ttl() {
        let f = fixture().await;
        let account = AccountId("puuid-faker".into());
        *f.upstream.state.lock().unwrap() = Some(in_match(7));

        let state = f.cache.get_match_state(&account, Region::Kr).await.unwrap();
        assert_eq!(state, in_match(7));

        f.clock.advance(Duration::seconds(119));
        assert_eq!(
            f.cache.get_match_state(&account, Region::Kr).await.unwrap(),
            in_match(7)
        );
        assert_eq!(f.upstream.match_calls.load(Ordering::SeqCst), 1);

        f.clock.advance(Duration::seconds(2));
        *f.upstream.state.lock().unwrap() = Some(MatchState::NotInMatch);
        assert_eq!(
            f.cache.get_match_state(&account, Region::Kr).await.unwrap(),
            MatchState::NotInMatch
        );
        assert_eq!(f.upstream.match_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn upstream_errors_propagate_and_are_not_cached() {
        let f = fixture().await;
        let account = AccountId("puuid-faker".into());
        *f.upstream.fail.lock().unwrap() = true;
        assert!(f.cache.get_match_state(&account, Region::Kr).await.is_err());

        *f.upstream.fail.lock().unwrap() = false;
        assert_eq!(
            f.cache.get_match_state(&account, Region::Kr).await.unwrap(),
            MatchState::NotInMatch
        );
        assert_eq!(f.upstream.match_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn corrupt_participants_decode_as_miss() {
        let entry = CachedMatchState {
            account_id: AccountId("a".into()),
            region: Region::Kr,
            in_match: true,
            match_id: Some(1),
            participants: b"not json".to_vec(),
            expires_at: Utc::now(),
        };
        assert!(decode(&entry).is_none());
    }
}
