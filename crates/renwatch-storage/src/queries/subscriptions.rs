// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription CRUD operations.

use renwatch_core::types::{NewSubscription, SubscriptionKey};
use renwatch_core::{ChannelId, OrgId, RenwatchError, RiotId, Subscription, UserError};
use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::database::{fmt_ts, map_tr_err, opt_ts_column, parsed_column, ts_column, Database};

const COLUMNS: &str =
    "id, org_id, channel_id, game_name, tag_line, region, created_at, last_evaluated_at";

fn row_to_subscription(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        org_id: OrgId(row.get(1)?),
        channel_id: ChannelId(row.get(2)?),
        account: RiotId::new(row.get::<_, String>(3)?, row.get::<_, String>(4)?),
        region: parsed_column(row, 5)?,
        created_at: ts_column(row, 6)?,
        last_evaluated_at: opt_ts_column(row, 7)?,
    })
}

/// Insert a subscription; a duplicate natural key is reported as a user error.
pub async fn create_subscription(
    db: &Database,
    new: &NewSubscription,
) -> Result<Subscription, RenwatchError> {
    let sub = Subscription {
        id: 0,
        org_id: new.org_id.clone(),
        channel_id: new.channel_id.clone(),
        account: new.account.clone(),
        region: new.region,
        created_at: new.created_at,
        last_evaluated_at: None,
    };

    let inserted = {
        let sub = sub.clone();
        db.connection()
            .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
                let n = conn.execute(
                    "INSERT INTO subscriptions
                        (org_id, channel_id, game_name, tag_line, region, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT (channel_id, game_name, tag_line, region) DO NOTHING",
                    params![
                        sub.org_id.0,
                        sub.channel_id.0,
                        sub.account.game_name,
                        sub.account.tag_line,
                        sub.region.to_string(),
                        fmt_ts(sub.created_at),
                    ],
                )?;
                Ok((n > 0).then(|| conn.last_insert_rowid()))
            })
            .await
            .map_err(map_tr_err)?
    };

    match inserted {
        Some(id) => Ok(Subscription { id, ..sub }),
        None => Err(UserError::AlreadySubscribed {
            riot_id: sub.account.to_string(),
            region: sub.region.to_string(),
        }
        .into()),
    }
}

pub async fn get_subscription(db: &Database, id: i64) -> Result<Option<Subscription>, RenwatchError> {
    db.connection()
        .call(move |conn| -> Result<Option<Subscription>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM subscriptions WHERE id = ?1"),
                params![id],
                row_to_subscription,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Least recently evaluated first; never-evaluated subscriptions lead.
pub async fn list_subscriptions(db: &Database, limit: u32) -> Result<Vec<Subscription>, RenwatchError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Subscription>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM subscriptions
                 ORDER BY last_evaluated_at ASC NULLS FIRST, id ASC
                 LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], row_to_subscription)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_subscriptions_by_channel(
    db: &Database,
    channel_id: &ChannelId,
) -> Result<Vec<Subscription>, RenwatchError> {
    let channel_id = channel_id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<Subscription>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM subscriptions WHERE channel_id = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![channel_id], row_to_subscription)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_subscriptions_by_org(db: &Database, org_id: &OrgId) -> Result<u64, RenwatchError> {
    let org_id = org_id.0.clone();
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM subscriptions WHERE org_id = ?1",
                params![org_id],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n as u64)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_subscription(db: &Database, key: &SubscriptionKey) -> Result<u64, RenwatchError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            let n = conn.execute(
                "DELETE FROM subscriptions
                 WHERE channel_id = ?1 AND game_name = ?2 AND tag_line = ?3 AND region = ?4",
                params![
                    key.channel_id.0,
                    key.account.game_name,
                    key.account.tag_line,
                    key.region.to_string(),
                ],
            )?;
            Ok(n as u64)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_subscriptions(db: &Database, ids: &[i64]) -> Result<u64, RenwatchError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> { delete_by_ids(conn, &ids) })
        .await
        .map_err(map_tr_err)
}

/// Delete subscriptions by id on an open connection or transaction. Evals cascade.
pub(crate) fn delete_by_ids(conn: &rusqlite::Connection, ids: &[i64]) -> rusqlite::Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let n = conn.execute(
        &format!("DELETE FROM subscriptions WHERE id IN ({placeholders})"),
        params_from_iter(ids.iter()),
    )?;
    Ok(n as u64)
}

/// Record the time a subscription was last evaluated. Returns rows touched.
pub(crate) fn touch(
    conn: &rusqlite::Connection,
    id: i64,
    at: chrono::DateTime<chrono::Utc>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE subscriptions SET last_evaluated_at = ?1 WHERE id = ?2",
        params![fmt_ts(at), id],
    )
}
