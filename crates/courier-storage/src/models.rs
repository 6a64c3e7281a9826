// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! These types represent the rows stored in the SQLite database. Statuses are
//! stored as strings; the typed enums live in `courier-core::types` and are
//! converted at the query boundaries.

use serde::{Deserialize, Serialize};

/// A tenant account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// Bearer token used to authenticate API requests.
    #[serde(skip_serializing)]
    pub api_token: String,
    /// Remaining message credits. Never negative.
    pub credits: i64,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// A per-tenant worker session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSession {
    /// Globally unique, DNS-label-safe session identifier.
    pub session_id: String,
    /// Owning user.
    pub user_id: String,
    /// Human-readable label.
    pub name: String,
    /// Status: "creating", "initializing", "ready", "failed", "deleted".
    pub status: String,
    /// Base URL of the worker instance, set once provisioning assigns it.
    pub base_url: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-update timestamp.
    pub updated_at: String,
}

/// A message awaiting (or past) dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMessage {
    /// Unique message identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Worker session the message is addressed through.
    pub session_id: String,
    /// Recipient address.
    pub recipient: String,
    /// Recipient display name used for payload templating.
    pub recipient_name: String,
    /// Message payload, templated at enqueue time.
    pub payload: String,
    /// ISO 8601 instant on or after which the message may be sent.
    pub scheduled_at: String,
    /// Status: "pending", "sending", "sent", "failed", "cancelled".
    pub status: String,
    /// Error text from the last (only) send attempt.
    pub error_message: Option<String>,
    /// ISO 8601 instant the terminal state was written.
    pub sent_at: Option<String>,
    /// ISO 8601 instant the dispatcher claimed the row.
    pub claimed_at: Option<String>,
    /// Batch the message was submitted in.
    pub batch_id: String,
    /// 1-based position within the batch.
    pub sequence_number: i64,
    /// Delay in seconds actually applied at enqueue time.
    pub actual_delay: i64,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-update timestamp.
    pub updated_at: String,
}

/// A per-message attempt record, created at enqueue or immediate send and
/// mutated once when the message reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Worker session the message was addressed through.
    pub session_id: String,
    /// Recipient address.
    pub recipient: String,
    /// Recipient display name.
    pub recipient_name: String,
    /// Message payload as sent.
    pub payload: String,
    /// Origin: "bulk", "scheduled", "single".
    pub message_type: String,
    /// Status mirror of the corresponding message.
    pub status: String,
    /// ISO 8601 scheduled instant, if the message was scheduled.
    pub scheduled_at: Option<String>,
    /// ISO 8601 instant the attempt completed.
    pub sent_at: Option<String>,
    /// Error text, if the attempt failed.
    pub error_message: Option<String>,
    /// Batch the message belongs to (empty for single sends).
    pub batch_id: String,
    /// 1-based position within the batch (0 for single sends).
    pub sequence_number: i64,
    /// Delay in seconds applied at enqueue time.
    pub actual_delay: i64,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-update timestamp.
    pub updated_at: String,
}
