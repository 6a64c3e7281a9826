// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic worker addressing.
//!
//! A worker's routable name is a pure function of the session id and the
//! controller's configuration; resolution never consults external state.

use courier_config::model::WorkerConfig;

/// Base URL of the worker serving `session_id`:
/// `http://<service_prefix>-<session_id>.<network>.<cluster_suffix>:<port>`.
pub fn resolve_base_url(config: &WorkerConfig, session_id: &str) -> String {
    format!(
        "http://{}-{}.{}.{}:{}",
        config.service_prefix, session_id, config.network, config.cluster_suffix, config.port
    )
}

/// Generate a fresh session id usable as a DNS label: `wk-` plus the first
/// 12 hex characters of a v4 UUID.
pub fn new_session_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("wk-{}", &id[..12])
}

/// Whether `session_id` is safe to embed in a DNS label: ASCII letters,
/// digits, and hyphens only, non-empty, no leading or trailing hyphen.
pub fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= 63
        && !session_id.starts_with('-')
        && !session_id.ends_with('-')
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_deterministic_in_session_id() {
        let config = WorkerConfig::default();
        let a = resolve_base_url(&config, "wk-abc123");
        let b = resolve_base_url(&config, "wk-abc123");
        assert_eq!(a, b);
        assert_eq!(
            a,
            "http://courier-wk-wk-abc123.courier.svc.cluster.local:8083"
        );
    }

    #[test]
    fn generated_session_ids_are_dns_safe_and_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert!(is_valid_session_id(&a));
        assert!(a.starts_with("wk-"));
        assert_eq!(a.len(), 15);
    }

    #[test]
    fn session_id_validation_rejects_unsafe_labels() {
        assert!(is_valid_session_id("wk-abc-123"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("wk_abc"));
        assert!(!is_valid_session_id("wk.abc"));
        assert!(!is_valid_session_id("-leading"));
        assert!(!is_valid_session_id("trailing-"));
    }
}
