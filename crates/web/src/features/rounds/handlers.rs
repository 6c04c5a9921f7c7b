use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::round::{RoundTemplateRequest, RoundTemplateResponse},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::CurrentUser;

use super::services;

#[utoipa::path(
    get,
    path = "/api/rounds",
    responses(
        (status = 200, description = "Official templates, plus the caller's own custom templates when authenticated", body = Vec<RoundTemplateResponse>)
    ),
    tag = "rounds"
)]
pub async fn list_rounds(
    State(db): State<Database>,
    viewer: Option<Extension<CurrentUser>>,
) -> Result<Json<Vec<RoundTemplateResponse>>, WebError> {
    let viewer_id = viewer.map(|Extension(user)| user.user_id);
    let rounds = services::list_rounds(db.pool(), viewer_id).await?;

    Ok(Json(rounds))
}

#[utoipa::path(
    get,
    path = "/api/rounds/{id}",
    params(
        ("id" = Uuid, Path, description = "Round template id")
    ),
    responses(
        (status = 200, description = "Round template with ordered stages", body = RoundTemplateResponse),
        (status = 404, description = "Round template not found")
    ),
    tag = "rounds"
)]
pub async fn get_round(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let round = services::get_round(db.pool(), id).await?;

    Ok(Json(round).into_response())
}

#[utoipa::path(
    post,
    path = "/api/rounds",
    request_body = RoundTemplateRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Custom round template created", body = RoundTemplateResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "rounds"
)]
pub async fn create_round(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<RoundTemplateRequest>,
) -> Result<Response, WebError> {
    req.validate()?;
    req.validate_stages().map_err(WebError::BadRequest)?;

    let round = services::create_round(db.pool(), user.user_id, &req).await?;

    Ok((StatusCode::CREATED, Json(round)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/rounds/{id}",
    params(
        ("id" = Uuid, Path, description = "Round template id")
    ),
    request_body = RoundTemplateRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Round template replaced", body = RoundTemplateResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Official or not owned by the caller"),
        (status = 404, description = "Round template not found"),
        (status = 409, description = "Template is in use by an in-progress session")
    ),
    tag = "rounds"
)]
pub async fn update_round(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<RoundTemplateRequest>,
) -> Result<Response, WebError> {
    req.validate()?;
    req.validate_stages().map_err(WebError::BadRequest)?;

    let round = services::update_round(db.pool(), id, user.user_id, &req).await?;

    Ok(Json(round).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/rounds/{id}",
    params(
        ("id" = Uuid, Path, description = "Round template id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Round template deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Official or not owned by the caller"),
        (status = 404, description = "Round template not found"),
        (status = 409, description = "Template is referenced by existing sessions")
    ),
    tag = "rounds"
)]
pub async fn delete_round(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    services::delete_round(db.pool(), id, user.user_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
