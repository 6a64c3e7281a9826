// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each accepts `&Database` and runs on the single
//! background writer thread.

pub mod audit;
pub mod pending;
pub mod sessions;
pub mod users;
