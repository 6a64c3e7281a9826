// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Container-backed worker runtime.
//!
//! Each session gets a named volume (credential state survives restarts) and
//! a detached container on the controller's network, both named
//! deterministically from the session id so the routable name matches
//! [`crate::address::resolve_base_url`].

use async_trait::async_trait;
use courier_config::model::WorkerConfig;
use courier_core::{CourierError, WorkerRuntime, WorkerStatus};
use tracing::{debug, warn};

/// Worker runtime driving the `docker` CLI.
pub struct DockerRuntime {
    config: WorkerConfig,
}

impl DockerRuntime {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    fn container_name(&self, session_id: &str) -> String {
        format!("{}-{}", self.config.service_prefix, session_id)
    }

    fn volume_name(&self, session_id: &str) -> String {
        format!("{}-data-{}", self.config.service_prefix, session_id)
    }
}

/// Run a docker subcommand, returning trimmed stdout on success.
async fn run_docker(args: &[String]) -> Result<String, CourierError> {
    let output = tokio::process::Command::new("docker")
        .args(args)
        .output()
        .await
        .map_err(|e| CourierError::Worker {
            message: format!("failed to execute docker: {e}"),
            source: Some(Box::new(e)),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CourierError::Worker {
            message: format!(
                "docker {} exited with {}: {}",
                args.first().map(String::as_str).unwrap_or(""),
                output.status.code().unwrap_or(-1),
                stderr.trim(),
            ),
            source: None,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Map `docker inspect` state output to a worker status.
///
/// Input format: `<running> <health>` where `running` is `true`/`false` and
/// `health` is empty when the image defines no healthcheck.
fn parse_inspect_state(state: &str) -> WorkerStatus {
    let mut parts = state.split_whitespace();
    let running = parts.next().unwrap_or("false") == "true";
    let health = parts.next().unwrap_or("");

    match (running, health) {
        (true, "starting") => WorkerStatus::Initializing,
        (true, "unhealthy") => WorkerStatus::Failed,
        // Healthy, or running without a healthcheck.
        (true, _) => WorkerStatus::Ready,
        (false, _) => WorkerStatus::Failed,
    }
}

#[async_trait]
impl WorkerRuntime for DockerRuntime {
    async fn provision(&self, session_id: &str, user_id: &str) -> Result<(), CourierError> {
        let container = self.container_name(session_id);
        let volume = self.volume_name(session_id);

        run_docker(&[
            "volume".into(),
            "create".into(),
            "--label".into(),
            format!("courier.session-id={session_id}"),
            "--label".into(),
            format!("courier.user-id={user_id}"),
            volume.clone(),
        ])
        .await?;

        let run_result = run_docker(&[
            "run".into(),
            "-d".into(),
            "--name".into(),
            container.clone(),
            "--network".into(),
            self.config.network.clone(),
            "--network-alias".into(),
            container.clone(),
            "--restart".into(),
            "unless-stopped".into(),
            "--label".into(),
            format!("courier.session-id={session_id}"),
            "--label".into(),
            format!("courier.user-id={user_id}"),
            "--mount".into(),
            format!("type=volume,src={volume},dst=/var/lib/worker"),
            "-e".into(),
            format!("SESSION_ID={session_id}"),
            "-e".into(),
            format!("PORT={}", self.config.port),
            self.config.image.clone(),
        ])
        .await;

        if let Err(e) = run_result {
            // Provisioning cascades: remove the volume we just created
            // before surfacing the error.
            if let Err(cleanup) = run_docker(&["volume".into(), "rm".into(), volume]).await {
                warn!(session_id, error = %cleanup, "failed to clean up volume after aborted provision");
            }
            return Err(e);
        }

        debug!(session_id, container, "worker container started");
        Ok(())
    }

    async fn teardown(&self, session_id: &str) -> Result<(), CourierError> {
        let container = self.container_name(session_id);
        let volume = self.volume_name(session_id);

        if let Err(e) = run_docker(&["rm".into(), "-f".into(), container.clone()]).await {
            warn!(session_id, error = %e, "failed to remove worker container");
        }
        if let Err(e) = run_docker(&["volume".into(), "rm".into(), volume]).await {
            warn!(session_id, error = %e, "failed to remove worker volume");
        }

        debug!(session_id, "worker teardown complete");
        Ok(())
    }

    async fn status(&self, session_id: &str) -> Result<WorkerStatus, CourierError> {
        let container = self.container_name(session_id);
        let inspect = run_docker(&[
            "inspect".into(),
            "-f".into(),
            "{{.State.Running}} {{if .State.Health}}{{.State.Health.Status}}{{end}}".into(),
            container,
        ])
        .await;

        match inspect {
            Ok(state) => Ok(parse_inspect_state(&state)),
            // Inspect fails when the container does not exist.
            Err(_) => Ok(WorkerStatus::Absent),
        }
    }
}
