// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Eval ledger operations and the atomic transaction runner.

use chrono::{DateTime, Utc};
use renwatch_core::types::{InactiveSubscription, NewEval, TxOp, TxOutcome};
use renwatch_core::{Eval, EvalStatus, MessageId, RenwatchError};
use rusqlite::{params, OptionalExtension};

use crate::database::{fmt_ts, map_tr_err, parsed_column, ts_column, Database};
use crate::queries::subscriptions;

fn row_to_eval(row: &rusqlite::Row<'_>) -> rusqlite::Result<Eval> {
    Ok(Eval {
        id: row.get(0)?,
        subscription_id: row.get(1)?,
        match_id: row.get(2)?,
        status: parsed_column(row, 3)?,
        message_id: row.get::<_, Option<String>>(4)?.map(MessageId),
        evaluated_at: ts_column(row, 5)?,
    })
}

pub async fn find_eval(
    db: &Database,
    subscription_id: i64,
    match_id: i64,
) -> Result<Option<Eval>, RenwatchError> {
    db.connection()
        .call(move |conn| -> Result<Option<Eval>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, subscription_id, match_id, status, message_id, evaluated_at
                 FROM evals WHERE subscription_id = ?1 AND match_id = ?2",
                params![subscription_id, match_id],
                row_to_eval,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_evals_before(db: &Database, cutoff: DateTime<Utc>) -> Result<u64, RenwatchError> {
    let cutoff = fmt_ts(cutoff);
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            let n = conn.execute("DELETE FROM evals WHERE evaluated_at < ?1", params![cutoff])?;
            Ok(n as u64)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find_inactive_subscriptions(
    db: &Database,
    cutoff: DateTime<Utc>,
) -> Result<Vec<InactiveSubscription>, RenwatchError> {
    let cutoff = fmt_ts(cutoff);
    db.connection()
        .call(move |conn| -> Result<Vec<InactiveSubscription>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT subscription_id, MAX(evaluated_at) AS newest
                 FROM evals
                 WHERE status != ?1
                 GROUP BY subscription_id
                 HAVING MAX(evaluated_at) < ?2
                 ORDER BY subscription_id",
            )?;
            let rows = stmt.query_map(
                params![EvalStatus::Offline.to_string(), cutoff],
                |row| {
                    Ok(InactiveSubscription {
                        subscription_id: row.get(0)?,
                        newest_online_eval: ts_column(row, 1)?,
                    })
                },
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_unevaluated_subscriptions(
    db: &Database,
    cutoff: DateTime<Utc>,
) -> Result<u64, RenwatchError> {
    let cutoff = fmt_ts(cutoff);
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM subscriptions s
                 WHERE s.created_at < ?1
                   AND NOT EXISTS (SELECT 1 FROM evals e WHERE e.subscription_id = s.id)",
                params![cutoff],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n as u64)
        })
        .await
        .map_err(map_tr_err)
}

fn insert_eval(conn: &rusqlite::Connection, new: &NewEval) -> rusqlite::Result<Eval> {
    conn.execute(
        "INSERT INTO evals (subscription_id, match_id, status, message_id, evaluated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new.subscription_id,
            new.match_id,
            new.status.to_string(),
            new.message_id.as_ref().map(|m| m.0.as_str()),
            fmt_ts(new.evaluated_at),
        ],
    )?;
    Ok(Eval {
        id: conn.last_insert_rowid(),
        subscription_id: new.subscription_id,
        match_id: new.match_id,
        status: new.status,
        message_id: new.message_id.clone(),
        evaluated_at: new.evaluated_at,
    })
}

/// Apply every op inside one SQLite transaction.
///
/// Touching a subscription that no longer exists aborts the whole batch
/// with [`RenwatchError::NotFound`]; dropping the uncommitted transaction
/// rolls it back.
pub async fn with_transaction(db: &Database, ops: Vec<TxOp>) -> Result<Vec<TxOutcome>, RenwatchError> {
    db.connection()
        .call(
            move |conn| -> Result<Result<Vec<TxOutcome>, RenwatchError>, rusqlite::Error> {
                let tx = conn.transaction()?;
                let mut outcomes = Vec::with_capacity(ops.len());
                for op in &ops {
                    let outcome = match op {
                        TxOp::CreateEval(new) => TxOutcome::EvalCreated(insert_eval(&tx, new)?),
                        TxOp::TouchSubscription { id, at } => {
                            if subscriptions::touch(&tx, *id, *at)? == 0 {
                                return Ok(Err(RenwatchError::not_found(format!(
                                    "subscription {id}"
                                ))));
                            }
                            TxOutcome::Touched
                        }
                        TxOp::DeleteSubscriptions(ids) => {
                            TxOutcome::Deleted(subscriptions::delete_by_ids(&tx, ids)?)
                        }
                    };
                    outcomes.push(outcome);
                }
                tx.commit()?;
                Ok(Ok(outcomes))
            },
        )
        .await
        .map_err(map_tr_err)?
}
