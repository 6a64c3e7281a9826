// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier messaging backend.
//!
//! Provides the shared error type, status enums, and the seam traits
//! (clock, delivery gateway, worker runtime) that decouple the dispatcher
//! from concrete infrastructure.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use traits::{Clock, SystemClock, WorkerGateway, WorkerRuntime};
pub use types::{format_ts, MessageKind, MessageStatus, SessionStatus, WorkerStatus};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn courier_error_has_all_variants() {
        let _config = CourierError::Config("test".into());
        let _storage = CourierError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _validation = CourierError::Validation("test".into());
        let _not_cancellable = CourierError::NotCancellable("test".into());
        let _worker = CourierError::Worker {
            message: "test".into(),
            source: None,
        };
        let _gateway = CourierError::Gateway {
            message: "test".into(),
            source: None,
        };
        let _not_found = CourierError::NotFound("test".into());
        let _timeout = CourierError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = CourierError::Internal("test".into());
    }

    #[test]
    fn error_display_includes_context() {
        let err = CourierError::Gateway {
            message: "worker returned 500: nope".into(),
            source: None,
        };
        assert!(err.to_string().contains("nope"));

        let err = CourierError::NotCancellable("message already processed".into());
        assert!(err.to_string().contains("already processed"));
    }
}
