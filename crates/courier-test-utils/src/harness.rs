// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage harness for integration tests.
//!
//! Assembles a temp SQLite database with a seeded tenant, a manual clock,
//! and a mock gateway. Higher-level crates build their subsystems on top.

use std::sync::Arc;

use courier_core::{Clock, CourierError};
use courier_storage::models::{User, WorkerSession};
use courier_storage::queries::{sessions, users};
use courier_storage::Database;

use crate::manual_clock::ManualClock;
use crate::mock_gateway::MockGateway;

/// The id of the tenant every harness seeds.
pub const TEST_USER: &str = "u-test";

/// The id of the ready worker session every harness seeds.
pub const TEST_SESSION: &str = "wk-test";

/// A temp database plus the deterministic collaborators tests need.
pub struct StorageHarness {
    pub db: Arc<Database>,
    pub clock: Arc<ManualClock>,
    pub gateway: Arc<MockGateway>,
    _temp_dir: tempfile::TempDir,
}

impl StorageHarness {
    /// Build a harness: temp DB, manual clock at the test epoch, mock
    /// gateway, one tenant (`TEST_USER`, 100 credits), and one ready
    /// worker session (`TEST_SESSION`).
    pub async fn new() -> Result<Self, CourierError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| CourierError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::open(&db_path.to_string_lossy()).await?);
        let clock = Arc::new(ManualClock::default_epoch());

        let now = clock.now_ts();
        users::create_user(
            &db,
            &User {
                id: TEST_USER.to_string(),
                name: "Harness Tenant".to_string(),
                email: "tenant@example.com".to_string(),
                api_token: "token-harness".to_string(),
                credits: 100,
                created_at: now.clone(),
            },
        )
        .await?;

        sessions::create_session(
            &db,
            &WorkerSession {
                session_id: TEST_SESSION.to_string(),
                user_id: TEST_USER.to_string(),
                name: "harness".to_string(),
                status: "ready".to_string(),
                base_url: Some(format!(
                    "http://courier-wk-{TEST_SESSION}.courier.svc.cluster.local:8083"
                )),
                created_at: now.clone(),
                updated_at: now,
            },
        )
        .await?;

        Ok(Self {
            db,
            clock,
            gateway: Arc::new(MockGateway::new()),
            _temp_dir: temp_dir,
        })
    }

    /// Seed an additional tenant with the given credit balance.
    pub async fn create_user(&self, id: &str, credits: i64) -> Result<(), CourierError> {
        let now = self.clock.now_ts();
        users::create_user(
            &self.db,
            &User {
                id: id.to_string(),
                name: id.to_string(),
                email: format!("{id}@example.com"),
                api_token: format!("token-{id}"),
                credits,
                created_at: now,
            },
        )
        .await
    }
}
