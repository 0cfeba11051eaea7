// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted name translations.

use renwatch_core::types::StoredTranslation;
use renwatch_core::RenwatchError;
use rusqlite::{params, params_from_iter};

use crate::database::{fmt_ts, map_tr_err, ts_column, Database};

pub async fn get_translations(
    db: &Database,
    originals: &[String],
) -> Result<Vec<StoredTranslation>, RenwatchError> {
    if originals.is_empty() {
        return Ok(Vec::new());
    }
    let originals = originals.to_vec();
    db.connection()
        .call(move |conn| -> Result<Vec<StoredTranslation>, rusqlite::Error> {
            let placeholders = vec!["?"; originals.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT original, translated, provider, model, created_at
                 FROM translations WHERE original IN ({placeholders})"
            ))?;
            let rows = stmt.query_map(params_from_iter(originals.iter()), |row| {
                Ok(StoredTranslation {
                    original: row.get(0)?,
                    translated: row.get(1)?,
                    provider: row.get(2)?,
                    model: row.get(3)?,
                    created_at: ts_column(row, 4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Upsert every entry in one transaction.
pub async fn put_translations(
    db: &Database,
    entries: &[StoredTranslation],
) -> Result<(), RenwatchError> {
    if entries.is_empty() {
        return Ok(());
    }
    let entries = entries.to_vec();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            for entry in &entries {
                tx.execute(
                    "INSERT INTO translations (original, translated, provider, model, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (original)
                     DO UPDATE SET translated = excluded.translated,
                                   provider = excluded.provider,
                                   model = excluded.model,
                                   created_at = excluded.created_at",
                    params![
                        entry.original,
                        entry.translated,
                        entry.provider,
                        entry.model,
                        fmt_ts(entry.created_at),
                    ],
                )?;
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}
