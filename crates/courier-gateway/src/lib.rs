// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated HTTP surface for the Courier backend.

pub mod auth;
pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, GatewayState};
