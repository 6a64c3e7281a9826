// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant account operations.

use courier_core::CourierError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::User;

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        api_token: row.get(3)?,
        credits: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const USER_COLUMNS: &str = "id, name, email, api_token, credits, created_at";

/// Create a new user account.
pub async fn create_user(db: &Database, user: &User) -> Result<(), CourierError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, api_token, credits, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id,
                    user.name,
                    user.email,
                    user.api_token,
                    user.credits,
                    user.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Look a user up by API token. Returns `None` on unknown token.
pub async fn find_by_token(db: &Database, token: &str) -> Result<Option<User>, CourierError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE api_token = ?1"
            ))?;
            match stmt.query_row(params![token], row_to_user) {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Look a user up by id.
pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<User>, CourierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_user) {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Deduct `amount` credits from the user's balance.
///
/// Conditional update: returns `false` without changing anything when the
/// balance is insufficient, so the balance can never go negative.
pub async fn debit_credits(
    db: &Database,
    user_id: &str,
    amount: i64,
) -> Result<bool, CourierError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE users SET credits = credits - ?1
                 WHERE id = ?2 AND credits >= ?1",
                params![amount, user_id],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}
