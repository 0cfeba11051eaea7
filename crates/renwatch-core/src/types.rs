// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain records shared by storage, the producer, and delivery workers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::account::{AccountId, Region, RiotId};

/// Chat server (guild) identifier. Used as the subscription grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrgId(pub String);

/// Chat channel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

/// Identifier of a message posted by the message server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Identifies the role an adapter plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Repository,
    GameState,
    Translator,
    MessageServer,
}

/// A (channel, account, region) watch registered from a chat server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub org_id: OrgId,
    pub channel_id: ChannelId,
    pub account: RiotId,
    pub region: Region,
    pub created_at: DateTime<Utc>,
    /// `None` until the first notification has been recorded.
    pub last_evaluated_at: Option<DateTime<Utc>>,
}

/// Input for creating a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub org_id: OrgId,
    pub channel_id: ChannelId,
    pub account: RiotId,
    pub region: Region,
    pub created_at: DateTime<Utc>,
}

/// Natural key of a subscription: unique per (channel, account, region).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub channel_id: ChannelId,
    pub account: RiotId,
    pub region: Region,
}

/// Outcome recorded for an evaluation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvalStatus {
    /// A notification with translations was delivered.
    NewTranslations,
    /// The match had no names needing translation.
    NoForeignNames,
    /// The account was checked while not in a match.
    Offline,
}

/// Ledger record: "subscription S was handled for match M".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eval {
    pub id: i64,
    pub subscription_id: i64,
    pub match_id: Option<i64>,
    pub status: EvalStatus,
    pub message_id: Option<MessageId>,
    pub evaluated_at: DateTime<Utc>,
}

/// Input for creating an eval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEval {
    pub subscription_id: i64,
    pub match_id: Option<i64>,
    pub status: EvalStatus,
    pub message_id: Option<MessageId>,
    pub evaluated_at: DateTime<Utc>,
}

/// A subscription whose newest non-offline eval predates the inactivity cutoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InactiveSubscription {
    pub subscription_id: i64,
    pub newest_online_eval: DateTime<Utc>,
}

/// One write inside an atomic repository transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOp {
    CreateEval(NewEval),
    /// Set `last_evaluated_at`. Fails the transaction if the row is gone.
    TouchSubscription { id: i64, at: DateTime<Utc> },
    DeleteSubscriptions(Vec<i64>),
}

/// Result of one [`TxOp`], in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    EvalCreated(Eval),
    Touched,
    Deleted(u64),
}

/// A single player in a live match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Raw `name#tag` as reported upstream.
    pub riot_id: String,
    #[serde(default)]
    pub account_id: Option<AccountId>,
}

/// A live match and its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub match_id: i64,
    pub participants: Vec<Participant>,
}

/// Whether an account is currently in a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchState {
    InMatch(MatchInfo),
    NotInMatch,
}

/// Cached account resolution, keyed by (riot id, region).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAccount {
    pub riot_id: RiotId,
    pub region: Region,
    pub account_id: AccountId,
    pub expires_at: DateTime<Utc>,
}

/// Cached match state, keyed by (account id, region).
///
/// `participants` is opaque to storage; the cache layer owns its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMatchState {
    pub account_id: AccountId,
    pub region: Region,
    pub in_match: bool,
    pub match_id: Option<i64>,
    pub participants: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

/// A source name and its rendering in the notification language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedName {
    pub original: String,
    pub translated: String,
}

/// A translation persisted for reuse, keyed by the original name.
///
/// `provider` and `model` record which backend produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTranslation {
    pub original: String,
    pub translated: String,
    pub provider: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// The rendered content of a match notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub account: RiotId,
    pub match_id: i64,
    pub translations: Vec<TranslatedName>,
}

/// Work item handed from the producer to delivery workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryJob {
    pub subscription_id: i64,
    pub channel_id: ChannelId,
    pub account: RiotId,
    pub match_id: i64,
    pub translations: Vec<TranslatedName>,
}

impl DeliveryJob {
    pub fn notification(&self) -> Notification {
        Notification {
            account: self.account.clone(),
            match_id: self.match_id,
            translations: self.translations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn eval_status_uses_ledger_spelling() {
        assert_eq!(EvalStatus::NewTranslations.to_string(), "NEW_TRANSLATIONS");
        assert_eq!(EvalStatus::NoForeignNames.to_string(), "NO_FOREIGN_NAMES");
        assert_eq!(
            EvalStatus::from_str("OFFLINE").unwrap(),
            EvalStatus::Offline
        );
    }

    #[test]
    fn participants_round_trip_through_json() {
        let info = MatchInfo {
            match_id: 42,
            participants: vec![Participant {
                riot_id: "玩家2#KR1".into(),
                account_id: None,
            }],
        };
        let bytes = serde_json::to_vec(&info.participants).unwrap();
        let back: Vec<Participant> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, info.participants);
    }

    #[test]
    fn job_renders_notification() {
        let job = DeliveryJob {
            subscription_id: 1,
            channel_id: ChannelId("c1".into()),
            account: RiotId::new("Faker", "KR1"),
            match_id: 9,
            translations: vec![TranslatedName {
                original: "玩家2".into(),
                translated: "Player 2".into(),
            }],
        };
        let n = job.notification();
        assert_eq!(n.match_id, 9);
        assert_eq!(n.translations.len(), 1);
    }
}
