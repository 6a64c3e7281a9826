// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles for the Courier workspace: a manual clock, a
//! scriptable delivery gateway, an in-memory worker runtime, and a storage
//! harness with a seeded tenant.

pub mod harness;
pub mod manual_clock;
pub mod mock_gateway;
pub mod mock_runtime;

pub use harness::{StorageHarness, TEST_SESSION, TEST_USER};
pub use manual_clock::ManualClock;
pub use mock_gateway::{MockGateway, SendCall};
pub use mock_runtime::MockRuntime;
