use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::{
        common::PaginatedResponse,
        scoring::{
            CompleteSessionRequest, CreateSessionRequest, EndResponse, PersonalRecordResponse,
            SessionFilter, SessionResponse, SessionSummary, ShareLinkResponse,
            SharedSessionResponse, StatsResponse, SubmitEndRequest,
        },
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::WebError;
use crate::middleware::auth::CurrentUser;

use super::services;

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Session started", body = SessionResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Template or setup profile not found")
    ),
    tag = "sessions"
)]
pub async fn create_session(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let session = services::create_session(db.pool(), user.user_id, &req).await?;

    Ok((StatusCode::CREATED, Json(session)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/sessions",
    params(SessionFilter),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "The caller's sessions, newest first", body = PaginatedResponse<SessionSummary>),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "sessions"
)]
pub async fn list_sessions(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<SessionFilter>,
) -> Result<Response, WebError> {
    filter.validate().map_err(WebError::BadRequest)?;

    let (sessions, total_items) = services::list_sessions(db.pool(), user.user_id, &filter).await?;

    let response = PaginatedResponse::new(sessions, &filter.pagination, total_items);

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/sessions/stats",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Aggregate statistics across the caller's sessions", body = StatsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "sessions"
)]
pub async fn session_stats(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    let stats = services::session_stats(db.pool(), user.user_id).await?;

    Ok(Json(stats).into_response())
}

#[utoipa::path(
    get,
    path = "/api/sessions/records",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "The caller's personal records", body = Vec<PersonalRecordResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "sessions"
)]
pub async fn personal_records(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    let records = services::personal_records(db.pool(), user.user_id).await?;

    Ok(Json(records).into_response())
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Session detail with ends and arrows", body = SessionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let session = services::get_session(db.pool(), id, user.user_id).await?;

    Ok(Json(session).into_response())
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/ends",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    request_body = SubmitEndRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "End recorded", body = EndResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session or stage not found"),
        (status = 409, description = "Concurrent submission detected"),
        (status = 422, description = "Session not in progress, wrong arrow count, or illegal arrow value")
    ),
    tag = "sessions"
)]
pub async fn submit_end(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitEndRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let end = services::submit_end(db.pool(), id, user.user_id, &req).await?;

    Ok((StatusCode::CREATED, Json(end)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}/ends/last",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Last end removed; aggregates rolled back", body = SessionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found"),
        (status = 422, description = "Session not in progress or no ends to undo")
    ),
    tag = "sessions"
)]
pub async fn undo_last_end(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let session = services::undo_last_end(db.pool(), id, user.user_id).await?;

    Ok(Json(session).into_response())
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    request_body = CompleteSessionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Session completed; personal record and classification derived", body = SessionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found"),
        (status = 422, description = "Session is not in progress")
    ),
    tag = "sessions"
)]
pub async fn complete_session(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    body: Option<Json<CompleteSessionRequest>>,
) -> Result<Response, WebError> {
    let overrides = body.map(|Json(req)| req).unwrap_or_default();
    overrides.validate()?;

    let session = services::complete_session(db.pool(), id, user.user_id, &overrides).await?;

    Ok(Json(session).into_response())
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/abandon",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Session abandoned", body = SessionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found"),
        (status = 422, description = "Only in-progress sessions can be abandoned")
    ),
    tag = "sessions"
)]
pub async fn abandon_session(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let session = services::abandon_session(db.pool(), id, user.user_id).await?;

    Ok(Json(session).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Abandoned session deleted with its ends and arrows"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found"),
        (status = 422, description = "Only abandoned sessions can be deleted")
    ),
    tag = "sessions"
)]
pub async fn delete_session(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    services::delete_session(db.pool(), id, user.user_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/share",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Share link created (or the existing one returned)", body = ShareLinkResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn create_share_link(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Extension(config): Extension<Config>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let token = services::create_share_token(db.pool(), id, user.user_id).await?;

    let response = ShareLinkResponse {
        url: format!("{}/shared/{}", config.frontend_url, token),
        share_token: token,
    };

    Ok(Json(response).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}/share",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Share link revoked"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn revoke_share_link(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    services::revoke_share_token(db.pool(), id, user.user_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    get,
    path = "/api/shared/{token}",
    params(
        ("token" = String, Path, description = "Share token")
    ),
    responses(
        (status = 200, description = "Read-only view of a shared session", body = SharedSessionResponse),
        (status = 404, description = "Unknown or revoked share token")
    ),
    tag = "sessions"
)]
pub async fn shared_session(
    State(db): State<Database>,
    Path(token): Path<String>,
) -> Result<Response, WebError> {
    let shared = services::shared_session(db.pool(), &token).await?;

    Ok(Json(shared).into_response())
}
