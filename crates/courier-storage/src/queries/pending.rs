// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-message operations for crash-safe dispatch.
//!
//! The claim operation is the linchpin: a row must never be handed to the
//! dispatcher twice. `claim_due` runs a single transaction on the lone
//! writer thread that selects due rows and flips them to `sending` before
//! any caller sees them, so concurrent callers cannot both observe a row
//! as claimable.

use std::collections::BTreeMap;

use courier_core::CourierError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::PendingMessage;

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingMessage> {
    Ok(PendingMessage {
        id: row.get(0)?,
        user_id: row.get(1)?,
        session_id: row.get(2)?,
        recipient: row.get(3)?,
        recipient_name: row.get(4)?,
        payload: row.get(5)?,
        scheduled_at: row.get(6)?,
        status: row.get(7)?,
        error_message: row.get(8)?,
        sent_at: row.get(9)?,
        claimed_at: row.get(10)?,
        batch_id: row.get(11)?,
        sequence_number: row.get(12)?,
        actual_delay: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

const MESSAGE_COLUMNS: &str = "id, user_id, session_id, recipient, recipient_name, payload, \
     scheduled_at, status, error_message, sent_at, claimed_at, batch_id, \
     sequence_number, actual_delay, created_at, updated_at";

/// Insert a new pending message.
///
/// Fails on a duplicate `(batch_id, sequence_number)` pair.
pub async fn insert_pending(db: &Database, msg: &PendingMessage) -> Result<(), CourierError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO pending_messages
                     (id, user_id, session_id, recipient, recipient_name, payload,
                      scheduled_at, status, error_message, sent_at, claimed_at, batch_id,
                      sequence_number, actual_delay, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    msg.id,
                    msg.user_id,
                    msg.session_id,
                    msg.recipient,
                    msg.recipient_name,
                    msg.payload,
                    msg.scheduled_at,
                    msg.status,
                    msg.error_message,
                    msg.sent_at,
                    msg.claimed_at,
                    msg.batch_id,
                    msg.sequence_number,
                    msg.actual_delay,
                    msg.created_at,
                    msg.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically claim up to `limit` due messages.
///
/// For each returned row the stored status was `pending` with
/// `scheduled_at <= now`; by the time this function returns, those rows are
/// `sending` with `claimed_at = now`. Ordering is `scheduled_at` then
/// `sequence_number`, so cumulative batches drain in submission order.
pub async fn claim_due(
    db: &Database,
    now: &str,
    limit: u32,
) -> Result<Vec<PendingMessage>, CourierError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let mut claimed = Vec::new();
            {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM pending_messages
                     WHERE status = 'pending' AND scheduled_at <= ?1
                     ORDER BY scheduled_at ASC, sequence_number ASC
                     LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![now, limit], row_to_message)?;
                for row in rows {
                    claimed.push(row?);
                }
            }

            for msg in &mut claimed {
                tx.execute(
                    "UPDATE pending_messages
                     SET status = 'sending', claimed_at = ?1, updated_at = ?1
                     WHERE id = ?2 AND status = 'pending'",
                    params![now, msg.id],
                )?;
                msg.status = "sending".to_string();
                msg.claimed_at = Some(now.clone());
            }

            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(map_tr_err)
}

/// Write the terminal state of a claimed message.
///
/// `status` must be `sent` or `failed`. Guarded by the current status being
/// `sending`; returns whether a row was updated.
pub async fn finalize(
    db: &Database,
    id: &str,
    status: &str,
    error: Option<String>,
    sent_at: &str,
) -> Result<bool, CourierError> {
    debug_assert!(status == "sent" || status == "failed");
    let id = id.to_string();
    let status = status.to_string();
    let sent_at = sent_at.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE pending_messages
                 SET status = ?1, error_message = ?2, sent_at = ?3, updated_at = ?3
                 WHERE id = ?4 AND status = 'sending'",
                params![status, error, sent_at, id],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Cancel a single message.
///
/// Succeeds only while the row is still `pending` and owned by `user_id`;
/// a row the dispatcher already claimed cannot be cancelled. The matching
/// audit entry is mirrored to `cancelled` in the same transaction. Returns
/// whether the row was affected.
pub async fn cancel_message(
    db: &Database,
    id: &str,
    user_id: &str,
    now: &str,
) -> Result<bool, CourierError> {
    let id = id.to_string();
    let user_id = user_id.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let affected = tx.execute(
                "UPDATE pending_messages
                 SET status = 'cancelled', updated_at = ?1
                 WHERE id = ?2 AND user_id = ?3 AND status = 'pending'",
                params![now, id, user_id],
            )?;
            if affected > 0 {
                let (batch_id, sequence_number): (String, i64) = tx.query_row(
                    "SELECT batch_id, sequence_number FROM pending_messages WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                tx.execute(
                    "UPDATE audit_log SET status = 'cancelled', updated_at = ?1
                     WHERE batch_id = ?2 AND sequence_number = ?3 AND status = 'pending'",
                    params![now, batch_id, sequence_number],
                )?;
            }

            tx.commit()?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Cancel every still-pending message in a batch, mirroring their audit
/// entries. Returns the count affected.
pub async fn cancel_batch(
    db: &Database,
    batch_id: &str,
    user_id: &str,
    now: &str,
) -> Result<usize, CourierError> {
    let batch_id = batch_id.to_string();
    let user_id = user_id.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let affected = tx.execute(
                "UPDATE pending_messages
                 SET status = 'cancelled', updated_at = ?1
                 WHERE batch_id = ?2 AND user_id = ?3 AND status = 'pending'",
                params![now, batch_id, user_id],
            )?;
            if affected > 0 {
                // Audit rows track their message 1:1 by (batch, sequence),
                // so the same pending-only predicate selects the mirrors.
                tx.execute(
                    "UPDATE audit_log SET status = 'cancelled', updated_at = ?1
                     WHERE batch_id = ?2 AND user_id = ?3 AND status = 'pending'",
                    params![now, batch_id, user_id],
                )?;
            }

            tx.commit()?;
            Ok(affected)
        })
        .await
        .map_err(map_tr_err)
}

/// List a user's messages, newest scheduled first, optionally filtered by status.
pub async fn list_for_user(
    db: &Database,
    user_id: &str,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<PendingMessage>, CourierError> {
    let user_id = user_id.to_string();
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            match &status {
                Some(status_filter) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {MESSAGE_COLUMNS} FROM pending_messages
                         WHERE user_id = ?1 AND status = ?2
                         ORDER BY scheduled_at DESC LIMIT ?3 OFFSET ?4"
                    ))?;
                    let rows = stmt.query_map(
                        params![user_id, status_filter, limit, offset],
                        row_to_message,
                    )?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {MESSAGE_COLUMNS} FROM pending_messages
                         WHERE user_id = ?1
                         ORDER BY scheduled_at DESC LIMIT ?2 OFFSET ?3"
                    ))?;
                    let rows =
                        stmt.query_map(params![user_id, limit, offset], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a single message by id, scoped to its owner.
pub async fn get_for_user(
    db: &Database,
    id: &str,
    user_id: &str,
) -> Result<Option<PendingMessage>, CourierError> {
    let id = id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM pending_messages
                 WHERE id = ?1 AND user_id = ?2"
            ))?;
            match stmt.query_row(params![id, user_id], row_to_message) {
                Ok(msg) => Ok(Some(msg)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Per-status counts for a batch, scoped to its owner.
pub async fn batch_summary(
    db: &Database,
    batch_id: &str,
    user_id: &str,
) -> Result<BTreeMap<String, i64>, CourierError> {
    let batch_id = batch_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM pending_messages
                 WHERE batch_id = ?1 AND user_id = ?2
                 GROUP BY status",
            )?;
            let rows = stmt.query_map(params![batch_id, user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            let mut summary = BTreeMap::new();
            for row in rows {
                let (status, count) = row?;
                summary.insert(status, count);
            }
            Ok(summary)
        })
        .await
        .map_err(map_tr_err)
}

/// Finalize rows left in `sending` by a previous process as `failed`.
///
/// A crash between claim and terminal write strands a row in `sending`;
/// re-pending it could double-deliver, so it is failed instead. Returns the
/// affected rows so the caller can mirror the audit log.
pub async fn fail_interrupted(
    db: &Database,
    now: &str,
) -> Result<Vec<PendingMessage>, CourierError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let mut stuck = Vec::new();
            {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM pending_messages WHERE status = 'sending'"
                ))?;
                let rows = stmt.query_map([], row_to_message)?;
                for row in rows {
                    stuck.push(row?);
                }
            }

            for msg in &mut stuck {
                tx.execute(
                    "UPDATE pending_messages
                     SET status = 'failed', error_message = 'interrupted by restart',
                         sent_at = ?1, updated_at = ?1
                     WHERE id = ?2 AND status = 'sending'",
                    params![now, msg.id],
                )?;
                msg.status = "failed".to_string();
                msg.error_message = Some("interrupted by restart".to_string());
            }

            tx.commit()?;
            Ok(stuck)
        })
        .await
        .map_err(map_tr_err)
}
