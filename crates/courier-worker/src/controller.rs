// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker lifecycle controller.
//!
//! Bridges session rows in storage and worker instances in the runtime:
//! creation provisions an instance and records its address, readiness is
//! polled out of the runtime into the session row, deletion tears both down.

use std::sync::Arc;
use std::time::Duration;

use courier_config::model::WorkerConfig;
use courier_core::{Clock, CourierError, SessionStatus, WorkerRuntime, WorkerStatus};
use courier_storage::models::WorkerSession;
use courier_storage::queries::sessions;
use courier_storage::Database;
use tracing::{info, warn};

use crate::address::{new_session_id, resolve_base_url};

/// Default delay between readiness polls.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Creates, watches, and destroys per-session worker instances.
pub struct WorkerController {
    runtime: Arc<dyn WorkerRuntime>,
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    config: WorkerConfig,
    poll_interval: Duration,
}

impl WorkerController {
    pub fn new(
        runtime: Arc<dyn WorkerRuntime>,
        db: Arc<Database>,
        clock: Arc<dyn Clock>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            runtime,
            db,
            clock,
            config,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Shorten the readiness poll interval (tests).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The configured readiness deadline for new workers.
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.config.ready_timeout_secs)
    }

    /// Base URL of the worker serving `session_id`. Pure computation.
    pub fn resolve_url(&self, session_id: &str) -> String {
        resolve_base_url(&self.config, session_id)
    }

    /// Create a worker session: generate the id, record the row, provision
    /// the instance, and store its address.
    ///
    /// Returns before the worker is ready; the session is `initializing`.
    /// A provisioning failure marks the session `failed` and surfaces the
    /// error.
    pub async fn create_worker(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<WorkerSession, CourierError> {
        let session_id = new_session_id();
        let now = self.clock.now_ts();

        sessions::create_session(
            &self.db,
            &WorkerSession {
                session_id: session_id.clone(),
                user_id: user_id.to_string(),
                name: name.to_string(),
                status: SessionStatus::Creating.to_string(),
                base_url: None,
                created_at: now.clone(),
                updated_at: now,
            },
        )
        .await?;

        if let Err(e) = self.runtime.provision(&session_id, user_id).await {
            warn!(session_id, error = %e, "worker provisioning failed");
            sessions::update_status(
                &self.db,
                &session_id,
                &SessionStatus::Failed.to_string(),
                &self.clock.now_ts(),
            )
            .await?;
            return Err(e);
        }

        let base_url = self.resolve_url(&session_id);
        sessions::update_provisioned(&self.db, &session_id, &base_url, &self.clock.now_ts())
            .await?;

        info!(session_id, user_id, base_url, "worker session created");
        sessions::get_session(&self.db, &session_id)
            .await?
            .ok_or_else(|| CourierError::Internal("session row vanished after create".into()))
    }

    /// Poll the runtime until the worker reports ready or `timeout` passes.
    ///
    /// On success the session row moves to `ready`; on timeout it moves to
    /// `failed` and a Timeout error is returned.
    pub async fn wait_ready(
        &self,
        session_id: &str,
        timeout: Duration,
    ) -> Result<(), CourierError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let status = self.runtime.status(session_id).await?;
            if status == WorkerStatus::Ready {
                sessions::update_status(
                    &self.db,
                    session_id,
                    &SessionStatus::Ready.to_string(),
                    &self.clock.now_ts(),
                )
                .await?;
                info!(session_id, "worker ready");
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                warn!(session_id, ?timeout, "worker did not become ready in time");
                sessions::update_status(
                    &self.db,
                    session_id,
                    &SessionStatus::Failed.to_string(),
                    &self.clock.now_ts(),
                )
                .await?;
                return Err(CourierError::Timeout { duration: timeout });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Tear down the worker and mark the session deleted.
    ///
    /// Runtime teardown is best-effort; the session row is marked `deleted`
    /// regardless so the tenant is never stuck with an undeletable session.
    pub async fn delete_worker(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<(), CourierError> {
        let session = sessions::get_session(&self.db, session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| CourierError::NotFound(format!("session {session_id}")))?;

        if let Err(e) = self.runtime.teardown(&session.session_id).await {
            warn!(session_id, error = %e, "worker teardown reported an error");
        }
        sessions::update_status(
            &self.db,
            session_id,
            &SessionStatus::Deleted.to_string(),
            &self.clock.now_ts(),
        )
        .await?;
        info!(session_id, "worker session deleted");
        Ok(())
    }

    /// Live status of the worker instance, straight from the runtime.
    pub async fn status(&self, session_id: &str) -> Result<WorkerStatus, CourierError> {
        self.runtime.status(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_test_utils::{MockRuntime, StorageHarness, TEST_USER};

    async fn make_controller() -> (Arc<MockRuntime>, WorkerController, StorageHarness) {
        let harness = StorageHarness::new().await.unwrap();
        let runtime = Arc::new(MockRuntime::new());
        let controller = WorkerController::new(
            runtime.clone(),
            harness.db.clone(),
            harness.clock.clone(),
            WorkerConfig::default(),
        )
        .with_poll_interval(Duration::from_millis(5));
        (runtime, controller, harness)
    }

    #[tokio::test]
    async fn create_provisions_and_records_address() {
        let (runtime, controller, harness) = make_controller().await;

        let session = controller.create_worker(TEST_USER, "primary").await.unwrap();
        assert_eq!(session.status, "initializing");
        assert!(runtime.exists(&session.session_id));

        let expected = controller.resolve_url(&session.session_id);
        assert_eq!(session.base_url.as_deref(), Some(expected.as_str()));

        let stored = sessions::get_session(&harness.db, &session.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, "initializing");
    }

    #[tokio::test]
    async fn failed_provision_marks_session_failed() {
        let (runtime, controller, harness) = make_controller().await;
        runtime.fail_next_provision();

        let err = controller.create_worker(TEST_USER, "primary").await;
        assert!(err.is_err());

        let sessions = sessions::list_for_user(&harness.db, TEST_USER).await.unwrap();
        let created = sessions
            .iter()
            .find(|s| s.name == "primary")
            .expect("session row should exist");
        assert_eq!(created.status, "failed");
    }

    #[tokio::test]
    async fn wait_ready_transitions_session_to_ready() {
        let (runtime, controller, harness) = make_controller().await;
        let session = controller.create_worker(TEST_USER, "primary").await.unwrap();
        runtime.ready_after_polls(&session.session_id, 3);

        controller
            .wait_ready(&session.session_id, Duration::from_secs(5))
            .await
            .unwrap();

        let stored = sessions::get_session(&harness.db, &session.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, "ready");
    }

    #[tokio::test]
    async fn wait_ready_times_out_and_marks_failed() {
        let (_runtime, controller, harness) = make_controller().await;
        let session = controller.create_worker(TEST_USER, "primary").await.unwrap();
        // Runtime never reports ready.

        let err = controller
            .wait_ready(&session.session_id, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Timeout { .. }));

        let stored = sessions::get_session(&harness.db, &session.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, "failed");
    }

    #[tokio::test]
    async fn delete_tears_down_and_marks_deleted() {
        let (runtime, controller, harness) = make_controller().await;
        let session = controller.create_worker(TEST_USER, "primary").await.unwrap();

        controller
            .delete_worker(&session.session_id, TEST_USER)
            .await
            .unwrap();
        assert!(!runtime.exists(&session.session_id));

        let stored = sessions::get_session(&harness.db, &session.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, "deleted");

        // Deleting again is fine for the runtime but the row no longer
        // belongs to an active session for another tenant.
        let err = controller.delete_worker(&session.session_id, "other").await;
        assert!(matches!(err, Err(CourierError::NotFound(_))));
    }

    #[tokio::test]
    async fn status_reports_absent_for_unknown_session() {
        let (_runtime, controller, _harness) = make_controller().await;
        let status = controller.status("wk-missing").await.unwrap();
        assert_eq!(status, WorkerStatus::Absent);
    }
}
