//! REST handlers for login, notification, and acknowledgment endpoints.
//!
//! Validation happens here, before any core state mutates; the core
//! operations themselves are infallible once their inputs are accepted.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::Json,
    Extension,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::{self, CurrentUser};
use crate::state::SharedState;

/// How long a login session stays valid.
const SESSION_TTL_HOURS: i64 = 24;

/// Uniform response body for all REST endpoints.
#[derive(Serialize)]
pub struct ApiResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error message (if failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    fn ok(data: serde_json::Value) -> (StatusCode, Json<ApiResponse>) {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
    }

    fn ok_empty() -> (StatusCode, Json<ApiResponse>) {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: None,
                error: None,
            }),
        )
    }

    fn error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiResponse>) {
        (
            status,
            Json(Self {
                success: false,
                data: None,
                error: Some(message.into()),
            }),
        )
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

/// Handler for POST /api/login
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.username.is_empty() {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "username is required");
    }

    match state
        .sessions
        .create_session(&req.username, Duration::hours(SESSION_TTL_HOURS))
    {
        Ok(session) => {
            log::info!("user logged in: {}", session.username);
            ApiResponse::ok(serde_json::json!({
                "token": session.id,
                "username": session.username,
                "expires_at": session.expires_at,
            }))
        }
        Err(err) => {
            log::error!("failed to create session: {}", err);
            ApiResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to create session",
            )
        }
    }
}

/// Handler for POST /api/logout
///
/// Deletes the session the caller presented. Deletion is idempotent, so a
/// token that just expired still logs out cleanly.
pub async fn logout(
    State(state): State<SharedState>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<ApiResponse>) {
    let token = auth::bearer_token(&headers)
        .map(str::to_string)
        .or_else(|| auth::query_token(&uri));

    if let Some(token) = token {
        state.sessions.delete_session(&token);
    }

    log::info!("user logged out");
    ApiResponse::ok_empty()
}

#[derive(Deserialize)]
pub struct NotifyRequest {
    pub message: String,
    /// A specific username, or "all" to reach every connected user.
    pub target_username: String,
}

/// Handler for POST /api/notify
///
/// The sender is the authenticated session's username. Delivery is
/// fire-and-forget: the hub enqueues without blocking and the response
/// carries no delivery confirmation.
pub async fn notify(
    State(state): State<SharedState>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Json(req): Json<NotifyRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.message.is_empty() {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "message is required");
    }
    if req.target_username.is_empty() {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "target_username is required");
    }

    state
        .hub
        .broadcast_message(&username, &req.message, &req.target_username);

    ApiResponse::ok_empty()
}

/// Handler for GET /api/users
pub async fn users(State(state): State<SharedState>) -> (StatusCode, Json<ApiResponse>) {
    let users = state.hub.connected_users();
    ApiResponse::ok(serde_json::json!({ "users": users }))
}

#[derive(Deserialize)]
pub struct CreateAcknowledgmentRequest {
    pub to_usernames: Vec<String>,
    pub message: String,
}

/// Handler for POST /api/acknowledgments
pub async fn create_acknowledgment(
    State(state): State<SharedState>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Json(req): Json<CreateAcknowledgmentRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.to_usernames.is_empty() {
        return ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "to_usernames is required and must not be empty",
        );
    }
    if req.message.is_empty() {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "message is required");
    }

    let request_id =
        state
            .hub
            .create_acknowledgment_request(&username, &req.to_usernames, &req.message);

    ApiResponse::ok(serde_json::json!({ "request_id": request_id }))
}

#[derive(Deserialize)]
pub struct RespondAcknowledgmentRequest {
    pub request_id: String,
}

/// Handler for POST /api/acknowledgments/respond
///
/// An unknown request id still reports success: recording is a silent
/// no-op in that case by design.
pub async fn respond_acknowledgment(
    State(state): State<SharedState>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Json(req): Json<RespondAcknowledgmentRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.request_id.is_empty() {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "request_id is required");
    }

    state.hub.record_acknowledgment(&req.request_id, &username);

    ApiResponse::ok_empty()
}
