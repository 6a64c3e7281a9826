// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery seam between the dispatcher and a worker instance.

use async_trait::async_trait;

use crate::error::CourierError;

/// Sends a single message to the worker instance serving a session.
///
/// Implementations classify the outcome only: success means the worker
/// accepted the message (HTTP 200); everything else is a
/// [`CourierError::Gateway`] carrying the response body or transport error.
/// The gateway never retries; retry policy belongs to the caller.
#[async_trait]
pub trait WorkerGateway: Send + Sync {
    /// Deliver `payload` to `recipient` via the worker for `session_id`.
    async fn send(
        &self,
        session_id: &str,
        recipient: &str,
        payload: &str,
    ) -> Result<(), CourierError>;
}
