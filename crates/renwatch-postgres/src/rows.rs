// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row shapes read back from Postgres and their conversion into domain records.

use chrono::{DateTime, Utc};
use renwatch_core::types::{InactiveSubscription, StoredTranslation};
use renwatch_core::{
    ChannelId, Eval, EvalStatus, MessageId, OrgId, Region, RenwatchError, RiotId, Subscription,
};
use sqlx::FromRow;

pub(crate) const SUBSCRIPTION_COLUMNS: &str =
    "id, org_id, channel_id, game_name, tag_line, region, created_at, last_evaluated_at";

pub(crate) const EVAL_COLUMNS: &str =
    "id, subscription_id, match_id, status, message_id, evaluated_at";

#[derive(Debug, Clone, FromRow)]
pub(crate) struct DbSubscription {
    pub id: i64,
    pub org_id: String,
    pub channel_id: String,
    pub game_name: String,
    pub tag_line: String,
    pub region: String,
    pub created_at: DateTime<Utc>,
    pub last_evaluated_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbSubscription> for Subscription {
    type Error = RenwatchError;

    fn try_from(row: DbSubscription) -> Result<Self, Self::Error> {
        let region = row
            .region
            .parse::<Region>()
            .map_err(RenwatchError::storage)?;
        Ok(Subscription {
            id: row.id,
            org_id: OrgId(row.org_id),
            channel_id: ChannelId(row.channel_id),
            account: RiotId::new(row.game_name, row.tag_line),
            region,
            created_at: row.created_at,
            last_evaluated_at: row.last_evaluated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct DbEval {
    pub id: i64,
    pub subscription_id: i64,
    pub match_id: Option<i64>,
    pub status: String,
    pub message_id: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl TryFrom<DbEval> for Eval {
    type Error = RenwatchError;

    fn try_from(row: DbEval) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<EvalStatus>()
            .map_err(RenwatchError::storage)?;
        Ok(Eval {
            id: row.id,
            subscription_id: row.subscription_id,
            match_id: row.match_id,
            status,
            message_id: row.message_id.map(MessageId),
            evaluated_at: row.evaluated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct DbInactive {
    pub subscription_id: i64,
    pub newest_online_eval: DateTime<Utc>,
}

impl From<DbInactive> for InactiveSubscription {
    fn from(row: DbInactive) -> Self {
        InactiveSubscription {
            subscription_id: row.subscription_id,
            newest_online_eval: row.newest_online_eval,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct DbCachedAccount {
    pub account_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct DbCachedMatch {
    pub in_match: bool,
    pub match_id: Option<i64>,
    pub participants: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct DbTranslation {
    pub original: String,
    pub translated: String,
    pub provider: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbTranslation> for StoredTranslation {
    fn from(row: DbTranslation) -> Self {
        Self {
            original: row.original,
            translated: row.translated,
            provider: row.provider,
            model: row.model,
            created_at: row.created_at,
        }
    }
}

/// Convert a list of rows, failing on the first one that does not decode.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, RenwatchError>
where
    T: TryFrom<R, Error = RenwatchError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn subscription_row_maps_fields() {
        let row = DbSubscription {
            id: 3,
            org_id: "g1".into(),
            channel_id: "c1".into(),
            game_name: "Faker".into(),
            tag_line: "KR1".into(),
            region: "KR".into(),
            created_at: ts(),
            last_evaluated_at: None,
        };
        let sub = Subscription::try_from(row).unwrap();
        assert_eq!(sub.id, 3);
        assert_eq!(sub.account.to_string(), "Faker#KR1");
        assert_eq!(sub.region, Region::Kr);
        assert!(sub.last_evaluated_at.is_none());
    }

    #[test]
    fn unknown_region_is_a_storage_error() {
        let row = DbSubscription {
            id: 1,
            org_id: "g".into(),
            channel_id: "c".into(),
            game_name: "a".into(),
            tag_line: "b".into(),
            region: "MOON".into(),
            created_at: ts(),
            last_evaluated_at: None,
        };
        let err = Subscription::try_from(row).unwrap_err();
        assert!(matches!(err, RenwatchError::Storage { .. }));
    }

    #[test]
    fn eval_row_maps_status_and_message() {
        let rows = vec![DbEval {
            id: 10,
            subscription_id: 3,
            match_id: Some(99),
            status: "NEW_TRANSLATIONS".into(),
            message_id: Some("m-1".into()),
            evaluated_at: ts(),
        }];
        let evals: Vec<Eval> = convert_all(rows).unwrap();
        assert_eq!(evals[0].status, EvalStatus::NewTranslations);
        assert_eq!(evals[0].message_id, Some(MessageId("m-1".into())));
    }
}
