// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime seam for per-session worker instances.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::WorkerStatus;

/// Creates, inspects, and destroys isolated worker instances.
///
/// A worker instance is keyed by its session id and owns a dedicated
/// persistent store for session credentials, so a restarted instance
/// resumes the same upstream session. `teardown` is idempotent and
/// best-effort: partial failures are logged by the implementation, not
/// surfaced.
#[async_trait]
pub trait WorkerRuntime: Send + Sync {
    /// Provision storage and start a worker instance for `session_id`.
    ///
    /// Returns once the instance is started, before it is ready to serve.
    /// If a later provisioning step fails, earlier side effects are rolled
    /// back before the error returns.
    async fn provision(&self, session_id: &str, user_id: &str) -> Result<(), CourierError>;

    /// Remove the worker instance and its storage.
    async fn teardown(&self, session_id: &str) -> Result<(), CourierError>;

    /// Live status of the instance as the runtime sees it.
    async fn status(&self, session_id: &str) -> Result<WorkerStatus, CourierError>;
}
