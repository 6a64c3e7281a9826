// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Courier workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a pending message.
///
/// Legal transitions: `Pending -> Sending` (claim), `Pending -> Cancelled`,
/// `Sending -> Sent`, `Sending -> Failed`. `Sent`, `Failed`, and `Cancelled`
/// are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sending,
    Sent,
    Failed,
    Cancelled,
}

impl MessageStatus {
    /// Whether no further transition may leave this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed | Self::Cancelled)
    }
}

/// Lifecycle status of a worker session record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Creating,
    Initializing,
    Ready,
    Failed,
    Deleted,
}

/// Live status of a worker instance as reported by the runtime.
///
/// `Absent` means the runtime has no record of the instance (never created,
/// or already torn down).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Creating,
    Initializing,
    Ready,
    Failed,
    Absent,
}

/// Origin of an audit entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Immediate bulk send (no scheduling).
    Bulk,
    /// Dispatcher-driven scheduled send.
    Scheduled,
    /// One-off single send.
    Single,
}

/// Formats a UTC instant as the canonical stored timestamp.
///
/// Millisecond precision, `Z` suffix. Lexicographic order over these strings
/// equals chronological order, which the claim query relies on.
pub fn format_ts(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn message_status_round_trips_through_strings() {
        for status in [
            MessageStatus::Pending,
            MessageStatus::Sending,
            MessageStatus::Sent,
            MessageStatus::Failed,
            MessageStatus::Cancelled,
        ] {
            let s = status.to_string();
            assert_eq!(MessageStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(MessageStatus::Sending.to_string(), "sending");
    }

    #[test]
    fn terminal_statuses() {
        assert!(MessageStatus::Sent.is_terminal());
        assert!(MessageStatus::Failed.is_terminal());
        assert!(MessageStatus::Cancelled.is_terminal());
        assert!(!MessageStatus::Pending.is_terminal());
        assert!(!MessageStatus::Sending.is_terminal());
    }

    #[test]
    fn session_status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Initializing).unwrap();
        assert_eq!(json, "\"initializing\"");
    }

    #[test]
    fn format_ts_orders_lexicographically() {
        let early = chrono::DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let late = early + chrono::Duration::seconds(2);
        assert!(format_ts(early) < format_ts(late));
    }
}
