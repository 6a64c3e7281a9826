// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An in-memory worker runtime for controller tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use courier_core::{CourierError, WorkerRuntime, WorkerStatus};

/// Mock [`WorkerRuntime`] holding instance state in a map.
///
/// Freshly provisioned instances report `Initializing`; tests control when
/// they become ready via `ready_after_polls` or `set_status`.
pub struct MockRuntime {
    statuses: Mutex<HashMap<String, WorkerStatus>>,
    polls_until_ready: Mutex<HashMap<String, u32>>,
    fail_provision: Mutex<bool>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(HashMap::new()),
            polls_until_ready: Mutex::new(HashMap::new()),
            fail_provision: Mutex::new(false),
        }
    }

    /// Make the next provision call fail.
    pub fn fail_next_provision(&self) {
        *self.fail_provision.lock().expect("runtime lock poisoned") = true;
    }

    /// Report `Initializing` for the first `polls` status calls, then `Ready`.
    pub fn ready_after_polls(&self, session_id: &str, polls: u32) {
        self.polls_until_ready
            .lock()
            .expect("runtime lock poisoned")
            .insert(session_id.to_string(), polls);
    }

    /// Pin an instance at a status.
    pub fn set_status(&self, session_id: &str, status: WorkerStatus) {
        self.statuses
            .lock()
            .expect("runtime lock poisoned")
            .insert(session_id.to_string(), status);
    }

    /// Whether an instance currently exists.
    pub fn exists(&self, session_id: &str) -> bool {
        self.statuses
            .lock()
            .expect("runtime lock poisoned")
            .contains_key(session_id)
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkerRuntime for MockRuntime {
    async fn provision(&self, session_id: &str, _user_id: &str) -> Result<(), CourierError> {
        let mut fail = self.fail_provision.lock().expect("runtime lock poisoned");
        if *fail {
            *fail = false;
            return Err(CourierError::Worker {
                message: "provisioning refused".to_string(),
                source: None,
            });
        }
        self.statuses
            .lock()
            .expect("runtime lock poisoned")
            .insert(session_id.to_string(), WorkerStatus::Initializing);
        Ok(())
    }

    async fn teardown(&self, session_id: &str) -> Result<(), CourierError> {
        self.statuses
            .lock()
            .expect("runtime lock poisoned")
            .remove(session_id);
        Ok(())
    }

    async fn status(&self, session_id: &str) -> Result<WorkerStatus, CourierError> {
        let mut polls = self.polls_until_ready.lock().expect("runtime lock poisoned");
        if let Some(remaining) = polls.get_mut(session_id) {
            if *remaining == 0 {
                self.statuses
                    .lock()
                    .expect("runtime lock poisoned")
                    .insert(session_id.to_string(), WorkerStatus::Ready);
            } else {
                *remaining -= 1;
            }
        }
        Ok(self
            .statuses
            .lock()
            .expect("runtime lock poisoned")
            .get(session_id)
            .copied()
            .unwrap_or(WorkerStatus::Absent))
    }
}
