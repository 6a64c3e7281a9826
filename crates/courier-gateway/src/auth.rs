// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant authentication middleware.
//!
//! Every `/v1` request carries `Authorization: Bearer <api_token>`; the token
//! resolves to a user row and the user id rides the request as an extension.
//! Unknown or missing tokens are rejected (fail-closed).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use courier_storage::queries::users;

use crate::server::GatewayState;

/// The authenticated tenant, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}

/// Middleware that resolves the bearer token to a tenant.
pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user = users::find_by_token(&state.db, token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "token lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(CurrentUser { id: user.id });
    Ok(next.run(request).await)
}
