// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker session CRUD operations.

use courier_core::CourierError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::WorkerSession;

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkerSession> {
    Ok(WorkerSession {
        session_id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        status: row.get(3)?,
        base_url: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const SESSION_COLUMNS: &str =
    "session_id, user_id, name, status, base_url, created_at, updated_at";

/// Create a new session record.
pub async fn create_session(db: &Database, session: &WorkerSession) -> Result<(), CourierError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO worker_sessions
                     (session_id, user_id, name, status, base_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session.session_id,
                    session.user_id,
                    session.name,
                    session.status,
                    session.base_url,
                    session.created_at,
                    session.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by id.
pub async fn get_session(
    db: &Database,
    session_id: &str,
) -> Result<Option<WorkerSession>, CourierError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM worker_sessions WHERE session_id = ?1"
            ))?;
            match stmt.query_row(params![session_id], row_to_session) {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List a user's sessions, newest first, excluding deleted ones.
pub async fn list_for_user(
    db: &Database,
    user_id: &str,
) -> Result<Vec<WorkerSession>, CourierError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM worker_sessions
                 WHERE user_id = ?1 AND status != 'deleted'
                 ORDER BY created_at DESC"
            ))?;
            let rows = stmt.query_map(params![user_id], row_to_session)?;
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
        .await
        .map_err(map_tr_err)
}

/// Update a session's status and updated_at timestamp.
pub async fn update_status(
    db: &Database,
    session_id: &str,
    status: &str,
    now: &str,
) -> Result<(), CourierError> {
    let session_id = session_id.to_string();
    let status = status.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE worker_sessions SET status = ?1, updated_at = ?2
                 WHERE session_id = ?3",
                params![status, now, session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record a provisioned worker: status moves to `initializing` and the
/// assigned base URL is stored.
pub async fn update_provisioned(
    db: &Database,
    session_id: &str,
    base_url: &str,
    now: &str,
) -> Result<(), CourierError> {
    let session_id = session_id.to_string();
    let base_url = base_url.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE worker_sessions
                 SET status = 'initializing', base_url = ?1, updated_at = ?2
                 WHERE session_id = ?3",
                params![base_url, now, session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
