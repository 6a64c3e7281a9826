// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit log operations.
//!
//! Entries are created at enqueue or immediate send and mutated once, when
//! the corresponding message reaches a terminal state. Nothing here deletes.

use courier_core::CourierError;
use rusqlite::{params, types::Value};
use serde::Serialize;

use crate::database::{map_tr_err, Database};
use crate::models::AuditEntry;

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        session_id: row.get(2)?,
        recipient: row.get(3)?,
        recipient_name: row.get(4)?,
        payload: row.get(5)?,
        message_type: row.get(6)?,
        status: row.get(7)?,
        scheduled_at: row.get(8)?,
        sent_at: row.get(9)?,
        error_message: row.get(10)?,
        batch_id: row.get(11)?,
        sequence_number: row.get(12)?,
        actual_delay: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

const ENTRY_COLUMNS: &str = "id, user_id, session_id, recipient, recipient_name, payload, \
     message_type, status, scheduled_at, sent_at, error_message, batch_id, \
     sequence_number, actual_delay, created_at, updated_at";

/// Aggregate per-user counts by terminal status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub total: i64,
    pub pending: i64,
    pub sent: i64,
    pub failed: i64,
}

/// Insert a new audit entry.
pub async fn insert_audit(db: &Database, entry: &AuditEntry) -> Result<(), CourierError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO audit_log
                     (id, user_id, session_id, recipient, recipient_name, payload,
                      message_type, status, scheduled_at, sent_at, error_message, batch_id,
                      sequence_number, actual_delay, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    entry.id,
                    entry.user_id,
                    entry.session_id,
                    entry.recipient,
                    entry.recipient_name,
                    entry.payload,
                    entry.message_type,
                    entry.status,
                    entry.scheduled_at,
                    entry.sent_at,
                    entry.error_message,
                    entry.batch_id,
                    entry.sequence_number,
                    entry.actual_delay,
                    entry.created_at,
                    entry.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Move the entry for `(batch_id, sequence_number)` from `pending` to
/// `sending`. Returns whether a row was affected.
pub async fn mark_sending(
    db: &Database,
    batch_id: &str,
    sequence_number: i64,
    now: &str,
) -> Result<bool, CourierError> {
    let batch_id = batch_id.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE audit_log SET status = 'sending', updated_at = ?1
                 WHERE batch_id = ?2 AND sequence_number = ?3 AND status = 'pending'",
                params![now, batch_id, sequence_number],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Write the terminal state of the entry matching `(batch_id, sequence_number)`.
pub async fn finalize_matching(
    db: &Database,
    batch_id: &str,
    sequence_number: i64,
    status: &str,
    error: Option<String>,
    sent_at: &str,
) -> Result<bool, CourierError> {
    let batch_id = batch_id.to_string();
    let status = status.to_string();
    let sent_at = sent_at.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE audit_log
                 SET status = ?1, error_message = ?2, sent_at = ?3, updated_at = ?3
                 WHERE batch_id = ?4 AND sequence_number = ?5
                   AND status IN ('pending', 'sending')",
                params![status, error, sent_at, batch_id, sequence_number],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Write the terminal state of a single entry by id (immediate-send path).
pub async fn finalize_entry(
    db: &Database,
    id: &str,
    status: &str,
    error: Option<String>,
    sent_at: &str,
) -> Result<bool, CourierError> {
    let id = id.to_string();
    let status = status.to_string();
    let sent_at = sent_at.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE audit_log
                 SET status = ?1, error_message = ?2, sent_at = ?3, updated_at = ?3
                 WHERE id = ?4",
                params![status, error, sent_at, id],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Paginated listing of a user's entries, newest first, with optional status
/// and batch filters. Returns the page plus the total matching count.
pub async fn list_for_user(
    db: &Database,
    user_id: &str,
    status: Option<&str>,
    batch_id: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AuditEntry>, i64), CourierError> {
    let user_id = user_id.to_string();
    let status = status.map(|s| s.to_string());
    let batch_id = batch_id.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut where_clause = "user_id = ?1".to_string();
            let mut args: Vec<Value> = vec![Value::Text(user_id)];

            if let Some(status) = status {
                args.push(Value::Text(status));
                where_clause.push_str(&format!(" AND status = ?{}", args.len()));
            }
            if let Some(batch_id) = batch_id {
                args.push(Value::Text(batch_id));
                where_clause.push_str(&format!(" AND batch_id = ?{}", args.len()));
            }

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM audit_log WHERE {where_clause}"),
                rusqlite::params_from_iter(args.iter()),
                |row| row.get(0),
            )?;

            let mut page_args = args.clone();
            page_args.push(Value::Integer(limit));
            let limit_idx = page_args.len();
            page_args.push(Value::Integer(offset));
            let offset_idx = page_args.len();

            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM audit_log
                 WHERE {where_clause}
                 ORDER BY created_at DESC
                 LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
            ))?;
            let rows = stmt.query_map(rusqlite::params_from_iter(page_args.iter()), row_to_entry)?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }

            Ok((entries, total))
        })
        .await
        .map_err(map_tr_err)
}

/// Per-user counts: total plus pending/sent/failed breakdowns.
pub async fn stats_for_user(db: &Database, user_id: &str) -> Result<AuditStats, CourierError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM audit_log
                 WHERE user_id = ?1 GROUP BY status",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;

            let mut stats = AuditStats::default();
            for row in rows {
                let (status, count) = row?;
                stats.total += count;
                match status.as_str() {
                    "pending" => stats.pending = count,
                    "sent" => stats.sent = count,
                    "failed" => stats.failed = count,
                    _ => {}
                }
            }
            Ok(stats)
        })
        .await
        .map_err(map_tr_err)
}
