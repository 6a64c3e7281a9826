// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk submission intake.
//!
//! Decides per submission whether to execute immediately (every delay is
//! zero) or to persist rows for the dispatcher. Coordination with the
//! dispatcher is exclusively through storage; there is no in-memory queue.

use std::sync::Arc;

use chrono::Duration;
use courier_core::{Clock, CourierError, MessageKind, WorkerGateway};
use courier_storage::models::{AuditEntry, PendingMessage};
use courier_storage::queries::{audit, pending, sessions, users};
use courier_storage::Database;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::template::personalize;

/// One item of a bulk submission.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkItem {
    pub recipient: String,
    pub message: String,
    /// Per-item delay before sending, in seconds. Zero means immediate.
    #[serde(default)]
    pub delay_seconds: i64,
    /// Recipient display name for `{name}` templating.
    #[serde(default)]
    pub name: String,
}

/// Cumulative scheduling parameters: the i-th item (0-based) is scheduled
/// `i * delay_seconds` after submission, plus a uniform random offset in
/// `[random_delay_min, random_delay_max]` when the range is non-zero.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CumulativeSchedule {
    pub delay_seconds: i64,
    #[serde(default)]
    pub random_delay_min: i64,
    #[serde(default)]
    pub random_delay_max: i64,
}

/// Outcome of one immediate send.
#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    pub recipient: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a bulk submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Rows were persisted for the dispatcher.
    Scheduled { batch_id: String, total: usize },
    /// Every delay was zero: the messages were sent inline.
    Immediate {
        total: usize,
        success_count: usize,
        fail_count: usize,
        results: Vec<SendResult>,
    },
}

/// Translates bulk submissions into persisted rows or immediate sends.
pub struct BulkIntake {
    db: Arc<Database>,
    gateway: Arc<dyn WorkerGateway>,
    clock: Arc<dyn Clock>,
}

impl BulkIntake {
    pub fn new(
        db: Arc<Database>,
        gateway: Arc<dyn WorkerGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { db, gateway, clock }
    }

    /// Handle a bulk submission.
    ///
    /// The scheduling decision is per-submission: a cumulative schedule, or
    /// any item with a positive delay, routes the whole submission through
    /// the dispatcher; otherwise every item is sent inline, in order.
    pub async fn submit(
        &self,
        user_id: &str,
        session_id: &str,
        items: Vec<BulkItem>,
        schedule: Option<CumulativeSchedule>,
    ) -> Result<SubmitOutcome, CourierError> {
        self.validate(user_id, session_id, &items).await?;

        if items.is_empty() {
            return Ok(SubmitOutcome::Immediate {
                total: 0,
                success_count: 0,
                fail_count: 0,
                results: Vec::new(),
            });
        }

        if !users::debit_credits(&self.db, user_id, items.len() as i64).await? {
            return Err(CourierError::Validation(format!(
                "insufficient credits for {} messages",
                items.len()
            )));
        }

        let has_schedule = |s: &CumulativeSchedule| {
            s.delay_seconds > 0 || s.random_delay_min > 0 || s.random_delay_max > 0
        };
        if let Some(schedule) = schedule.filter(has_schedule) {
            let total = items.len();
            let batch_id = self
                .enqueue_cumulative(user_id, session_id, items, schedule)
                .await?;
            return Ok(SubmitOutcome::Scheduled { batch_id, total });
        }

        if items.iter().any(|item| item.delay_seconds > 0) {
            let total = items.len();
            let batch_id = self.enqueue_individual(user_id, session_id, items).await?;
            return Ok(SubmitOutcome::Scheduled { batch_id, total });
        }

        self.send_immediate(user_id, session_id, items).await
    }

    async fn validate(
        &self,
        user_id: &str,
        session_id: &str,
        items: &[BulkItem],
    ) -> Result<(), CourierError> {
        let session = sessions::get_session(&self.db, session_id)
            .await?
            .filter(|s| s.user_id == user_id && s.status != "deleted");
        if session.is_none() {
            return Err(CourierError::Validation(format!(
                "unknown session: {session_id}"
            )));
        }

        for (i, item) in items.iter().enumerate() {
            if item.recipient.trim().is_empty() {
                return Err(CourierError::Validation(format!(
                    "item {}: empty recipient",
                    i + 1
                )));
            }
            if item.message.is_empty() {
                return Err(CourierError::Validation(format!(
                    "item {}: empty message",
                    i + 1
                )));
            }
            if item.delay_seconds < 0 {
                return Err(CourierError::Validation(format!(
                    "item {}: negative delay",
                    i + 1
                )));
            }
        }
        Ok(())
    }

    /// Persist rows with per-item delays: `scheduled_at = now + delay_seconds`.
    pub async fn enqueue_individual(
        &self,
        user_id: &str,
        session_id: &str,
        items: Vec<BulkItem>,
    ) -> Result<String, CourierError> {
        let base = self.clock.now();
        let batch_id = new_batch_id(base);

        for (i, item) in items.into_iter().enumerate() {
            let scheduled_at =
                courier_core::format_ts(base + Duration::seconds(item.delay_seconds));
            self.persist_scheduled(
                user_id,
                session_id,
                &batch_id,
                (i + 1) as i64,
                &item,
                &scheduled_at,
                item.delay_seconds,
            )
            .await?;
        }

        info!(batch_id, "bulk submission scheduled with individual delays");
        Ok(batch_id)
    }

    /// Persist rows on a cumulative grid: the i-th item (0-based) lands at
    /// `now + i * delay_seconds` plus a per-row random offset.
    pub async fn enqueue_cumulative(
        &self,
        user_id: &str,
        session_id: &str,
        items: Vec<BulkItem>,
        schedule: CumulativeSchedule,
    ) -> Result<String, CourierError> {
        let base = self.clock.now();
        let batch_id = new_batch_id(base);

        for (i, item) in items.into_iter().enumerate() {
            let offset = sample_offset(schedule.random_delay_min, schedule.random_delay_max);
            let delay = i as i64 * schedule.delay_seconds + offset;
            let scheduled_at = courier_core::format_ts(base + Duration::seconds(delay));
            self.persist_scheduled(
                user_id,
                session_id,
                &batch_id,
                (i + 1) as i64,
                &item,
                &scheduled_at,
                offset,
            )
            .await?;
        }

        info!(batch_id, gap = schedule.delay_seconds, "bulk submission scheduled cumulatively");
        Ok(batch_id)
    }

    /// Write one pending row and its audit entry. Templating happens here,
    /// exactly once.
    #[allow(clippy::too_many_arguments)]
    async fn persist_scheduled(
        &self,
        user_id: &str,
        session_id: &str,
        batch_id: &str,
        sequence_number: i64,
        item: &BulkItem,
        scheduled_at: &str,
        actual_delay: i64,
    ) -> Result<(), CourierError> {
        let now = self.clock.now_ts();
        let payload = personalize(&item.message, &item.name, &item.recipient);

        pending::insert_pending(
            &self.db,
            &PendingMessage {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
                recipient: item.recipient.clone(),
                recipient_name: item.name.clone(),
                payload: payload.clone(),
                scheduled_at: scheduled_at.to_string(),
                status: "pending".to_string(),
                error_message: None,
                sent_at: None,
                claimed_at: None,
                batch_id: batch_id.to_string(),
                sequence_number,
                actual_delay,
                created_at: now.clone(),
                updated_at: now.clone(),
            },
        )
        .await?;

        audit::insert_audit(
            &self.db,
            &AuditEntry {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
                recipient: item.recipient.clone(),
                recipient_name: item.name.clone(),
                payload,
                message_type: MessageKind::Scheduled.to_string(),
                status: "pending".to_string(),
                scheduled_at: Some(scheduled_at.to_string()),
                sent_at: None,
                error_message: None,
                batch_id: batch_id.to_string(),
                sequence_number,
                actual_delay,
                created_at: now.clone(),
                updated_at: now,
            },
        )
        .await
    }

    /// Send every item inline, in submission order, recording an audit entry
    /// per attempt.
    async fn send_immediate(
        &self,
        user_id: &str,
        session_id: &str,
        items: Vec<BulkItem>,
    ) -> Result<SubmitOutcome, CourierError> {
        let batch_id = new_batch_id(self.clock.now());
        let total = items.len();
        let mut success_count = 0;
        let mut fail_count = 0;
        let mut results = Vec::with_capacity(total);

        for (i, item) in items.into_iter().enumerate() {
            let now = self.clock.now_ts();
            let payload = personalize(&item.message, &item.name, &item.recipient);
            let entry_id = uuid::Uuid::new_v4().to_string();

            audit::insert_audit(
                &self.db,
                &AuditEntry {
                    id: entry_id.clone(),
                    user_id: user_id.to_string(),
                    session_id: session_id.to_string(),
                    recipient: item.recipient.clone(),
                    recipient_name: item.name.clone(),
                    payload: payload.clone(),
                    message_type: MessageKind::Bulk.to_string(),
                    status: "pending".to_string(),
                    scheduled_at: None,
                    sent_at: None,
                    error_message: None,
                    batch_id: batch_id.clone(),
                    sequence_number: (i + 1) as i64,
                    actual_delay: 0,
                    created_at: now.clone(),
                    updated_at: now,
                },
            )
            .await?;

            let outcome = self.gateway.send(session_id, &item.recipient, &payload).await;
            let sent_at = self.clock.now_ts();

            match outcome {
                Ok(()) => {
                    success_count += 1;
                    audit::finalize_entry(&self.db, &entry_id, "sent", None, &sent_at).await?;
                    results.push(SendResult {
                        recipient: item.recipient,
                        success: true,
                        error: None,
                    });
                }
                Err(e) => {
                    fail_count += 1;
                    let error = e.to_string();
                    warn!(recipient = %item.recipient, error = %error, "immediate send failed");
                    audit::finalize_entry(&self.db, &entry_id, "failed", Some(error.clone()), &sent_at)
                        .await?;
                    results.push(SendResult {
                        recipient: item.recipient,
                        success: false,
                        error: Some(error),
                    });
                }
            }
        }

        Ok(SubmitOutcome::Immediate {
            total,
            success_count,
            fail_count,
            results,
        })
    }
}

/// Allocate a batch id from the submission instant.
fn new_batch_id(now: chrono::DateTime<chrono::Utc>) -> String {
    let nanos = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp());
    format!("batch_{nanos}")
}

/// Sample a random delay offset from `[min, max]` seconds.
///
/// An inverted range is silently swapped; `min == max` yields exactly `min`.
fn sample_offset(min: i64, max: i64) -> i64 {
    let (min, max) = if min > max { (max, min) } else { (min, max) };
    if max <= 0 {
        return min.max(0);
    }
    rand::thread_rng().gen_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_offset_swaps_inverted_range() {
        for _ in 0..20 {
            let offset = sample_offset(9, 3);
            assert!((3..=9).contains(&offset));
        }
    }

    #[test]
    fn sample_offset_is_deterministic_when_min_equals_max() {
        assert_eq!(sample_offset(7, 7), 7);
        assert_eq!(sample_offset(0, 0), 0);
    }

    #[test]
    fn batch_ids_embed_the_submission_instant() {
        let now = chrono::Utc::now();
        let id = new_batch_id(now);
        assert!(id.starts_with("batch_"));
        assert!(id.len() > "batch_".len());
    }
}
