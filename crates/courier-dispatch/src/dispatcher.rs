// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The delayed-message dispatcher.
//!
//! A single cooperative loop: every tick it claims due rows (already flipped
//! to `sending` by the store) and drives each through the send protocol,
//! serially, so completion order matches claim order. Errors never propagate
//! out of the loop; they are recorded on the row and logged.

use std::sync::Arc;

use courier_config::model::DispatcherConfig;
use courier_core::{Clock, CourierError, MessageKind, MessageStatus, WorkerGateway};
use courier_storage::models::{AuditEntry, PendingMessage};
use courier_storage::queries::{audit, pending};
use courier_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives pending messages to their terminal states.
pub struct Dispatcher {
    db: Arc<Database>,
    gateway: Arc<dyn WorkerGateway>,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        db: Arc<Database>,
        gateway: Arc<dyn WorkerGateway>,
        clock: Arc<dyn Clock>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            db,
            gateway,
            clock,
            config,
        }
    }

    /// Finalize rows stranded in `sending` by a previous process.
    ///
    /// Run once at startup, before the loop. Re-pending could double-deliver
    /// (the crash may have happened after the worker accepted the message),
    /// so stranded rows are failed and their audit entries mirrored.
    pub async fn recover(&self) -> Result<usize, CourierError> {
        let now = self.clock.now_ts();
        let stuck = pending::fail_interrupted(&self.db, &now).await?;
        for msg in &stuck {
            audit::finalize_matching(
                &self.db,
                &msg.batch_id,
                msg.sequence_number,
                "failed",
                Some("interrupted by restart".to_string()),
                &now,
            )
            .await?;
        }
        if !stuck.is_empty() {
            warn!(count = stuck.len(), "finalized messages interrupted by a previous shutdown");
        }
        Ok(stuck.len())
    }

    /// Run the dispatcher loop until `cancel` fires.
    ///
    /// Shutdown is cooperative: an in-flight tick finishes its sends before
    /// the loop returns.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            tick_secs = self.config.tick_secs,
            claim_limit = self.config.claim_limit,
            "dispatcher started"
        );

        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(self.config.tick_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(0) => {}
                        Ok(n) => debug!(processed = n, "dispatcher tick complete"),
                        Err(e) => error!(error = %e, "dispatcher tick failed"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Claim and process everything currently due. Returns the claimed count.
    pub async fn tick(&self) -> Result<usize, CourierError> {
        let now = self.clock.now_ts();
        let claimed = pending::claim_due(&self.db, &now, self.config.claim_limit).await?;
        if claimed.is_empty() {
            return Ok(0);
        }

        info!(count = claimed.len(), "processing due messages");
        for msg in &claimed {
            self.send_one(msg).await;
        }
        Ok(claimed.len())
    }

    /// Per-row send protocol for a row already claimed into `sending`.
    ///
    /// Never returns an error: every outcome is written to the row and its
    /// audit entry; failures writing the terminal state are logged and leave
    /// the row in `sending` for startup recovery.
    async fn send_one(&self, msg: &PendingMessage) {
        debug!(id = %msg.id, recipient = %msg.recipient, "sending scheduled message");

        // Move the matching audit entry along; create a fallback entry if
        // enqueue-time insertion was lost.
        match audit::mark_sending(&self.db, &msg.batch_id, msg.sequence_number, &msg.updated_at)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(id = %msg.id, "no pending audit entry found, creating one");
                if let Err(e) = self.insert_fallback_audit(msg).await {
                    warn!(id = %msg.id, error = %e, "failed to create fallback audit entry");
                }
            }
            Err(e) => warn!(id = %msg.id, error = %e, "failed to mark audit entry sending"),
        }

        let outcome = self
            .gateway
            .send(&msg.session_id, &msg.recipient, &msg.payload)
            .await;
        let sent_at = self.clock.now_ts();

        let (status, error_text) = match outcome {
            Ok(()) => {
                info!(id = %msg.id, recipient = %msg.recipient, "message sent");
                (MessageStatus::Sent, None)
            }
            Err(e) => {
                warn!(id = %msg.id, error = %e, "message send failed");
                (MessageStatus::Failed, Some(e.to_string()))
            }
        };
        let status = status.to_string();

        if let Err(e) =
            pending::finalize(&self.db, &msg.id, &status, error_text.clone(), &sent_at).await
        {
            // The row stays in `sending`; recovery picks it up after restart.
            error!(id = %msg.id, error = %e, "failed to write terminal state");
            return;
        }

        if let Err(e) = audit::finalize_matching(
            &self.db,
            &msg.batch_id,
            msg.sequence_number,
            &status,
            error_text,
            &sent_at,
        )
        .await
        {
            error!(id = %msg.id, error = %e, "failed to finalize audit entry");
        }
    }

    async fn insert_fallback_audit(&self, msg: &PendingMessage) -> Result<(), CourierError> {
        let now = self.clock.now_ts();
        audit::insert_audit(
            &self.db,
            &AuditEntry {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: msg.user_id.clone(),
                session_id: msg.session_id.clone(),
                recipient: msg.recipient.clone(),
                recipient_name: msg.recipient_name.clone(),
                payload: msg.payload.clone(),
                message_type: MessageKind::Scheduled.to_string(),
                status: "sending".to_string(),
                scheduled_at: Some(msg.scheduled_at.clone()),
                sent_at: None,
                error_message: None,
                batch_id: msg.batch_id.clone(),
                sequence_number: msg.sequence_number,
                actual_delay: msg.actual_delay,
                created_at: now.clone(),
                updated_at: now,
            },
        )
        .await
    }
}
