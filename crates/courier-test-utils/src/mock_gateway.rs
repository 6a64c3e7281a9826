// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A scriptable delivery gateway that records every send.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use courier_core::{CourierError, WorkerGateway};

/// One recorded send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCall {
    pub session_id: String,
    pub recipient: String,
    pub payload: String,
}

/// Mock [`WorkerGateway`] for dispatcher and intake tests.
///
/// Succeeds by default. Tests can queue per-call outcomes, set a default
/// failure, or add an artificial in-flight delay to exercise races.
pub struct MockGateway {
    calls: Mutex<Vec<SendCall>>,
    scripted: Mutex<VecDeque<Result<(), String>>>,
    default_outcome: Mutex<Result<(), String>>,
    delay: Mutex<Option<Duration>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
            default_outcome: Mutex::new(Ok(())),
            delay: Mutex::new(None),
        }
    }

    /// Queue the outcome for the next unscripted call (FIFO).
    pub fn push_outcome(&self, outcome: Result<(), String>) {
        self.scripted
            .lock()
            .expect("gateway lock poisoned")
            .push_back(outcome);
    }

    /// Make every unscripted call fail with `error`.
    pub fn fail_with(&self, error: &str) {
        *self.default_outcome.lock().expect("gateway lock poisoned") = Err(error.to_string());
    }

    /// Hold each send in flight for `delay` before completing.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("gateway lock poisoned") = Some(delay);
    }

    /// All recorded calls, in invocation order.
    pub fn calls(&self) -> Vec<SendCall> {
        self.calls.lock().expect("gateway lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("gateway lock poisoned").len()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkerGateway for MockGateway {
    async fn send(
        &self,
        session_id: &str,
        recipient: &str,
        payload: &str,
    ) -> Result<(), CourierError> {
        self.calls.lock().expect("gateway lock poisoned").push(SendCall {
            session_id: session_id.to_string(),
            recipient: recipient.to_string(),
            payload: payload.to_string(),
        });

        let delay = *self.delay.lock().expect("gateway lock poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self
            .scripted
            .lock()
            .expect("gateway lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                self.default_outcome
                    .lock()
                    .expect("gateway lock poisoned")
                    .clone()
            });

        outcome.map_err(|message| CourierError::Gateway {
            message,
            source: None,
        })
    }
}
