// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Courier backend.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed query operations for
//! tenants, worker sessions, the delayed-message queue, and the audit log.
//!
//! The single-writer model is load-bearing: because every statement runs on
//! the one background thread, the claim transaction in `queries::pending`
//! cannot interleave with another claimer, which is what gives the dispatcher
//! its at-most-once guarantee.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
