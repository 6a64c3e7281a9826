// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` command implementation.
//!
//! Wires the full stack: SQLite storage (migrations run on open), the
//! docker-backed worker runtime and controller, the delivery client, the
//! dispatcher loop, and the axum gateway. Supports graceful shutdown via
//! signal handlers: the in-flight dispatcher tick finishes before exit.

use std::sync::Arc;

use courier_config::CourierConfig;
use courier_core::{Clock, CourierError, SystemClock, WorkerGateway, WorkerRuntime};
use courier_dispatch::{BulkIntake, Dispatcher};
use courier_gateway::{start_server, GatewayState};
use courier_storage::Database;
use courier_worker::{DockerRuntime, HttpWorkerGateway, WorkerController};
use tracing::info;

use crate::shutdown;

/// Runs the `courier serve` command.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.server.log_level);

    info!("starting courier serve");

    let db = Arc::new(Database::open(&config.storage.database_path).await?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let delivery: Arc<dyn WorkerGateway> = Arc::new(HttpWorkerGateway::new(
        config.worker.clone(),
        &config.delivery,
    )?);
    let runtime: Arc<dyn WorkerRuntime> = Arc::new(DockerRuntime::new(config.worker.clone()));

    let controller = Arc::new(WorkerController::new(
        runtime,
        db.clone(),
        clock.clone(),
        config.worker.clone(),
    ));
    let intake = Arc::new(BulkIntake::new(
        db.clone(),
        delivery.clone(),
        clock.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        db.clone(),
        delivery,
        clock.clone(),
        config.dispatcher.clone(),
    ));

    // Crash recovery before the first tick: rows stranded in `sending` by a
    // previous process are finalized as failed, never resent.
    let recovered = dispatcher.recover().await?;
    if recovered > 0 {
        info!(count = recovered, "recovered interrupted messages");
    }

    let cancel = shutdown::install_signal_handler();

    let dispatch_task = {
        let dispatcher = dispatcher.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { dispatcher.run(cancel).await })
    };

    let state = GatewayState {
        db: db.clone(),
        intake,
        controller,
        clock,
        start_time: std::time::Instant::now(),
    };

    tokio::select! {
        result = start_server(&config.server, state) => result?,
        _ = cancel.cancelled() => {}
    }

    // Let the dispatcher finish its in-flight tick.
    cancel.cancel();
    if let Err(e) = dispatch_task.await {
        tracing::warn!(error = %e, "dispatcher task ended abnormally");
    }

    db.close().await?;
    info!("courier serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
