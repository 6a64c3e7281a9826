// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker subsystem: lifecycle controller, container runtime, and the
//! HTTP delivery client.
//!
//! A worker is an isolated single-tenant instance keyed by session id, with
//! its own persistent volume for session credentials and a routable name
//! derived deterministically from the session id.

pub mod address;
pub mod controller;
pub mod gateway;
pub mod runtime;

pub use address::{is_valid_session_id, new_session_id, resolve_base_url};
pub use controller::WorkerController;
pub use gateway::HttpWorkerGateway;
pub use runtime::DockerRuntime;
