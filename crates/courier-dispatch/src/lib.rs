// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delayed-message dispatch for the Courier backend.
//!
//! `BulkIntake` turns submissions into persisted rows (or immediate sends);
//! `Dispatcher` later claims due rows and drives them to terminal states.
//! The two share nothing but the store.

pub mod dispatcher;
pub mod intake;
pub mod template;

pub use dispatcher::Dispatcher;
pub use intake::{BulkIntake, BulkItem, CumulativeSchedule, SendResult, SubmitOutcome};
pub use template::personalize;
