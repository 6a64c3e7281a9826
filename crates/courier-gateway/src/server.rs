// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. The public `/health`
//! endpoint is unauthenticated; everything under `/v1` passes through the
//! bearer-token tenant middleware.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use courier_config::model::ServerConfig;
use courier_core::{Clock, CourierError};
use courier_dispatch::BulkIntake;
use courier_storage::Database;
use courier_worker::WorkerController;

use crate::auth::auth_middleware;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Storage handle (the single writer).
    pub db: Arc<Database>,
    /// Bulk submission intake.
    pub intake: Arc<BulkIntake>,
    /// Worker lifecycle controller.
    pub controller: Arc<WorkerController>,
    /// Clock shared with the dispatcher.
    pub clock: Arc<dyn Clock>,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

/// Build the full application router.
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/bulk-send", post(handlers::post_bulk_send))
        .route("/v1/scheduled", get(handlers::get_scheduled))
        .route("/v1/scheduled/{message_id}", delete(handlers::delete_scheduled))
        .route("/v1/batch/{batch_id}", get(handlers::get_batch))
        .route("/v1/batch/{batch_id}", delete(handlers::delete_batch))
        .route("/v1/message-logs", get(handlers::get_message_logs))
        .route("/v1/message-logs/stats", get(handlers::get_message_stats))
        .route("/v1/sessions", post(handlers::post_sessions))
        .route("/v1/sessions", get(handlers::get_sessions))
        .route("/v1/sessions/{session_id}", get(handlers::get_session))
        .route("/v1/sessions/{session_id}", delete(handlers::delete_session))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Bind and serve the gateway until the process exits.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
) -> Result<(), CourierError> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway server listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| CourierError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
