// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the Courier REST API.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use courier_core::{CourierError, MessageStatus};
use courier_dispatch::{BulkItem, CumulativeSchedule, SendResult, SubmitOutcome};
use courier_storage::models::{AuditEntry, PendingMessage};
use courier_storage::queries::{audit, pending, sessions};

use crate::auth::CurrentUser;
use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper mapping [`CourierError`] onto HTTP statuses.
pub struct ApiError(CourierError);

impl From<CourierError> for ApiError {
    fn from(err: CourierError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CourierError::Validation(_) | CourierError::NotCancellable(_) => {
                StatusCode::BAD_REQUEST
            }
            CourierError::NotFound(_) => StatusCode::NOT_FOUND,
            CourierError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            CourierError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// ---- Health ----

/// Response body for the public GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health (unauthenticated).
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ---- Bulk send ----

/// Request body for POST /v1/bulk-send.
#[derive(Debug, Deserialize)]
pub struct BulkSendRequest {
    /// Worker session to send through.
    pub session_name: String,
    /// Items, in send order.
    pub messages: Vec<BulkItem>,
    /// Optional cumulative schedule; overrides per-item delays when present.
    #[serde(default)]
    pub schedule: Option<CumulativeSchedule>,
}

/// Response body for POST /v1/bulk-send.
#[derive(Debug, Serialize)]
pub struct BulkSendResponse {
    pub success: bool,
    pub scheduled: bool,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SendResult>>,
}

/// POST /v1/bulk-send
pub async fn post_bulk_send(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<BulkSendRequest>,
) -> Result<Json<BulkSendResponse>, ApiError> {
    let outcome = state
        .intake
        .submit(&user.id, &body.session_name, body.messages, body.schedule)
        .await?;

    let response = match outcome {
        SubmitOutcome::Scheduled { batch_id, total } => BulkSendResponse {
            success: true,
            scheduled: true,
            total,
            batch_id: Some(batch_id),
            success_count: None,
            fail_count: None,
            results: None,
        },
        SubmitOutcome::Immediate {
            total,
            success_count,
            fail_count,
            results,
        } => BulkSendResponse {
            success: true,
            scheduled: false,
            total,
            batch_id: None,
            success_count: Some(success_count),
            fail_count: Some(fail_count),
            results: Some(results),
        },
    };
    Ok(Json(response))
}

// ---- Scheduled messages ----

/// Query parameters for GET /v1/scheduled.
#[derive(Debug, Deserialize)]
pub struct ScheduledQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

/// Reject status filters that are not a known message status.
fn validate_status_filter(status: Option<&str>) -> Result<(), ApiError> {
    if let Some(status) = status {
        status.parse::<MessageStatus>().map_err(|_| {
            ApiError(CourierError::Validation(format!(
                "unknown status filter: {status}"
            )))
        })?;
    }
    Ok(())
}

/// Response body for GET /v1/scheduled.
#[derive(Debug, Serialize)]
pub struct ScheduledListResponse {
    pub messages: Vec<PendingMessage>,
    pub count: usize,
}

/// GET /v1/scheduled?status=
pub async fn get_scheduled(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ScheduledQuery>,
) -> Result<Json<ScheduledListResponse>, ApiError> {
    validate_status_filter(query.status.as_deref())?;
    let messages = pending::list_for_user(
        &state.db,
        &user.id,
        query.status.as_deref(),
        query.limit,
        query.offset,
    )
    .await?;
    let count = messages.len();
    Ok(Json(ScheduledListResponse { messages, count }))
}

/// DELETE /v1/scheduled/{message_id}
pub async fn delete_scheduled(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
    Path(message_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let affected = pending::cancel_message(
        &state.db,
        &message_id,
        &user.id,
        &state.clock.now_ts(),
    )
    .await?;
    if !affected {
        return Err(CourierError::NotCancellable(
            "message not found or already processed".to_string(),
        )
        .into());
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "scheduled message cancelled",
    })))
}

// ---- Batches ----

/// Response body for GET /v1/batch/{batch_id}.
#[derive(Debug, Serialize)]
pub struct BatchStatusResponse {
    pub batch_id: String,
    pub status: BTreeMap<String, i64>,
}

/// GET /v1/batch/{batch_id}
pub async fn get_batch(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
    Path(batch_id): Path<String>,
) -> Result<Json<BatchStatusResponse>, ApiError> {
    let mut status = pending::batch_summary(&state.db, &batch_id, &user.id).await?;
    for key in ["pending", "sending", "sent", "failed", "cancelled"] {
        status.entry(key.to_string()).or_insert(0);
    }
    Ok(Json(BatchStatusResponse { batch_id, status }))
}

/// DELETE /v1/batch/{batch_id}
pub async fn delete_batch(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
    Path(batch_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cancelled = pending::cancel_batch(
        &state.db,
        &batch_id,
        &user.id,
        &state.clock.now_ts(),
    )
    .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "cancelled": cancelled,
    })))
}

// ---- Message logs ----

/// Query parameters for GET /v1/message-logs.
#[derive(Debug, Deserialize)]
pub struct MessageLogsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// Response body for GET /v1/message-logs.
#[derive(Debug, Serialize)]
pub struct MessageLogsResponse {
    pub logs: Vec<AuditEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// GET /v1/message-logs?status=&batch_id=&limit=&offset=
pub async fn get_message_logs(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<MessageLogsQuery>,
) -> Result<Json<MessageLogsResponse>, ApiError> {
    validate_status_filter(query.status.as_deref())?;
    let (logs, total) = audit::list_for_user(
        &state.db,
        &user.id,
        query.status.as_deref(),
        query.batch_id.as_deref(),
        query.limit,
        query.offset,
    )
    .await?;
    Ok(Json(MessageLogsResponse {
        logs,
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// GET /v1/message-logs/stats
pub async fn get_message_stats(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<audit::AuditStats>, ApiError> {
    let stats = audit::stats_for_user(&state.db, &user.id).await?;
    Ok(Json(stats))
}

// ---- Worker sessions ----

/// Request body for POST /v1/sessions.
#[derive(Debug, Deserialize)]
pub struct SessionCreateRequest {
    #[serde(default)]
    pub name: String,
}

/// Response body for session endpoints.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_status: Option<String>,
}

/// POST /v1/sessions
///
/// Creates the worker and returns before readiness; a background task polls
/// the runtime and flips the session row to `ready` or `failed`.
pub async fn post_sessions(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<SessionCreateRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = state.controller.create_worker(&user.id, &body.name).await?;

    let controller = state.controller.clone();
    let session_id = session.session_id.clone();
    let timeout = controller.ready_timeout();
    tokio::spawn(async move {
        if let Err(e) = controller.wait_ready(&session_id, timeout).await {
            warn!(session_id, error = %e, "worker did not become ready");
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: session.session_id,
            name: session.name,
            status: session.status,
            base_url: session.base_url,
            created_at: session.created_at,
            worker_status: None,
        }),
    ))
}

/// Response body for GET /v1/sessions.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
    pub count: usize,
}

/// GET /v1/sessions
pub async fn get_sessions(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = sessions::list_for_user(&state.db, &user.id).await?;
    let sessions: Vec<SessionResponse> = sessions
        .into_iter()
        .map(|s| SessionResponse {
            session_id: s.session_id,
            name: s.name,
            status: s.status,
            base_url: s.base_url,
            created_at: s.created_at,
            worker_status: None,
        })
        .collect();
    let count = sessions.len();
    Ok(Json(SessionListResponse { sessions, count }))
}

/// GET /v1/sessions/{session_id}
///
/// Returns the stored row plus the live runtime status.
pub async fn get_session(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = sessions::get_session(&state.db, &session_id)
        .await?
        .filter(|s| s.user_id == user.id)
        .ok_or_else(|| CourierError::NotFound(format!("session {session_id}")))?;

    let worker_status = match state.controller.status(&session.session_id).await {
        Ok(status) => Some(status.to_string()),
        Err(e) => {
            warn!(session_id = %session.session_id, error = %e, "runtime status unavailable");
            None
        }
    };

    Ok(Json(SessionResponse {
        session_id: session.session_id,
        name: session.name,
        status: session.status,
        base_url: session.base_url,
        created_at: session.created_at,
        worker_status,
    }))
}

/// DELETE /v1/sessions/{session_id}
pub async fn delete_session(
    State(state): State<GatewayState>,
    Extension(user): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.controller.delete_worker(&session_id, &user.id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "session_id": session_id,
    })))
}
