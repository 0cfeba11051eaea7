// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Game-state cache rows. Reads only return entries still valid at `now`.

use chrono::{DateTime, Utc};
use renwatch_core::types::{CachedAccount, CachedMatchState};
use renwatch_core::{AccountId, Region, RenwatchError, RiotId};
use rusqlite::{params, OptionalExtension};

use crate::database::{fmt_ts, map_tr_err, ts_column, Database};

pub async fn get_cached_account(
    db: &Database,
    riot_id: &RiotId,
    region: Region,
    now: DateTime<Utc>,
) -> Result<Option<CachedAccount>, RenwatchError> {
    let riot_id = riot_id.clone();
    let now = fmt_ts(now);
    db.connection()
        .call(move |conn| -> Result<Option<CachedAccount>, rusqlite::Error> {
            conn.query_row(
                "SELECT account_id, expires_at FROM account_cache
                 WHERE game_name = ?1 AND tag_line = ?2 AND region = ?3 AND expires_at > ?4",
                params![riot_id.game_name, riot_id.tag_line, region.to_string(), now],
                |row| {
                    Ok(CachedAccount {
                        riot_id: riot_id.clone(),
                        region,
                        account_id: AccountId(row.get(0)?),
                        expires_at: ts_column(row, 1)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn put_cached_account(db: &Database, entry: &CachedAccount) -> Result<(), RenwatchError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO account_cache (game_name, tag_line, region, account_id, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (game_name, tag_line, region)
                 DO UPDATE SET account_id = excluded.account_id, expires_at = excluded.expires_at",
                params![
                    entry.riot_id.game_name,
                    entry.riot_id.tag_line,
                    entry.region.to_string(),
                    entry.account_id.0,
                    fmt_ts(entry.expires_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_cached_match_state(
    db: &Database,
    account_id: &AccountId,
    region: Region,
    now: DateTime<Utc>,
) -> Result<Option<CachedMatchState>, RenwatchError> {
    let account_id = account_id.clone();
    let now = fmt_ts(now);
    db.connection()
        .call(move |conn| -> Result<Option<CachedMatchState>, rusqlite::Error> {
            conn.query_row(
                "SELECT in_match, match_id, participants, expires_at FROM match_cache
                 WHERE account_id = ?1 AND region = ?2 AND expires_at > ?3",
                params![account_id.0, region.to_string(), now],
                |row| {
                    Ok(CachedMatchState {
                        account_id: account_id.clone(),
                        region,
                        in_match: row.get(0)?,
                        match_id: row.get(1)?,
                        participants: row.get(2)?,
                        expires_at: ts_column(row, 3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn put_cached_match_state(
    db: &Database,
    entry: &CachedMatchState,
) -> Result<(), RenwatchError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO match_cache (account_id, region, in_match, match_id, participants, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (account_id, region)
                 DO UPDATE SET in_match = excluded.in_match,
                               match_id = excluded.match_id,
                               participants = excluded.participants,
                               expires_at = excluded.expires_at",
                params![
                    entry.account_id.0,
                    entry.region.to_string(),
                    entry.in_match,
                    entry.match_id,
                    entry.participants,
                    fmt_ts(entry.expires_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Remove entries whose expiry is at or before `now` from both cache tables.
pub async fn purge_expired(db: &Database, now: DateTime<Utc>) -> Result<u64, RenwatchError> {
    let now = fmt_ts(now);
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            let accounts =
                conn.execute("DELETE FROM account_cache WHERE expires_at <= ?1", params![now])?;
            let matches =
                conn.execute("DELETE FROM match_cache WHERE expires_at <= ?1", params![now])?;
            Ok((accounts + matches) as u64)
        })
        .await
        .map_err(map_tr_err)
}
