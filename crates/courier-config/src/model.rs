// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// HTTP API server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Worker instance runtime settings.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Dispatcher loop settings.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Delivery HTTP client settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// HTTP API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "courier.db".to_string()
}

/// Worker instance runtime configuration.
///
/// The routable name of a worker is deterministic in the session id:
/// `http://<service_prefix>-<session_id>.<network>.<cluster_suffix>:<port>`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Container image for worker instances.
    #[serde(default = "default_worker_image")]
    pub image: String,

    /// Container network (doubles as the namespace segment of worker URLs).
    #[serde(default = "default_worker_network")]
    pub network: String,

    /// Name prefix for worker containers, volumes, and service names.
    #[serde(default = "default_service_prefix")]
    pub service_prefix: String,

    /// DNS suffix appended after the network segment of worker URLs.
    #[serde(default = "default_cluster_suffix")]
    pub cluster_suffix: String,

    /// Port worker instances listen on.
    #[serde(default = "default_worker_port")]
    pub port: u16,

    /// How long `create` waits for a new worker to report ready.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            image: default_worker_image(),
            network: default_worker_network(),
            service_prefix: default_service_prefix(),
            cluster_suffix: default_cluster_suffix(),
            port: default_worker_port(),
            ready_timeout_secs: default_ready_timeout_secs(),
        }
    }
}

fn default_worker_image() -> String {
    "courier-worker:latest".to_string()
}

fn default_worker_network() -> String {
    "courier".to_string()
}

fn default_service_prefix() -> String {
    "courier-wk".to_string()
}

fn default_cluster_suffix() -> String {
    "svc.cluster.local".to_string()
}

fn default_worker_port() -> u16 {
    8083
}

fn default_ready_timeout_secs() -> u64 {
    120
}

/// Dispatcher loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Seconds between dispatcher ticks.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Maximum rows claimed per tick.
    #[serde(default = "default_claim_limit")]
    pub claim_limit: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            claim_limit: default_claim_limit(),
        }
    }
}

fn default_tick_secs() -> u64 {
    5
}

fn default_claim_limit() -> u32 {
    50
}

/// Delivery HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Per-request timeout for worker send calls, in seconds.
    #[serde(default = "default_delivery_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_delivery_timeout_secs(),
        }
    }
}

fn default_delivery_timeout_secs() -> u64 {
    30
}
