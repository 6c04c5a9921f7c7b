use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::classification::{ClassificationRecordResponse, CurrentClassificationResponse},
};

use crate::error::WebError;
use crate::middleware::auth::CurrentUser;

use super::services;

#[utoipa::path(
    get,
    path = "/api/classifications",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Classification history, newest first", body = Vec<ClassificationRecordResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "classifications"
)]
pub async fn list_classifications(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    let records = services::list_classifications(db.pool(), user.user_id).await?;

    Ok(Json(records).into_response())
}

#[utoipa::path(
    get,
    path = "/api/classifications/current",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current classification per system and round type", body = Vec<CurrentClassificationResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "classifications"
)]
pub async fn current_classifications(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    let current = services::current_classifications(db.pool(), user.user_id).await?;

    Ok(Json(current).into_response())
}
