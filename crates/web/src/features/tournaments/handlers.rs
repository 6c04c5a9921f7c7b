use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::tournament::{
        CreateTournamentRequest, LeaderboardEntry, SubmitScoreRequest, TournamentDetailResponse,
        TournamentResponse,
    },
    models::TournamentParticipant,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::CurrentUser;

use super::services;

#[utoipa::path(
    post,
    path = "/api/tournaments",
    request_body = CreateTournamentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Tournament created; the caller becomes organizer", body = TournamentResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Round template not found")
    ),
    tag = "tournaments"
)]
pub async fn create_tournament(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateTournamentRequest>,
) -> Result<Response, WebError> {
    req.validate()?;
    req.validate_dates()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let tournament = services::create_tournament(db.pool(), user.user_id, &req).await?;

    Ok((StatusCode::CREATED, Json(tournament)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/tournaments",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All tournaments, newest first", body = Vec<TournamentResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tournaments"
)]
pub async fn list_tournaments(State(db): State<Database>) -> Result<Response, WebError> {
    let tournaments = services::list_tournaments(db.pool()).await?;

    Ok(Json(tournaments).into_response())
}

#[utoipa::path(
    get,
    path = "/api/tournaments/{id}",
    params(
        ("id" = Uuid, Path, description = "Tournament id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Tournament with current standings", body = TournamentDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tournament not found")
    ),
    tag = "tournaments"
)]
pub async fn get_tournament(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let tournament = services::get_tournament(db.pool(), id).await?;

    Ok(Json(tournament).into_response())
}

#[utoipa::path(
    post,
    path = "/api/tournaments/{id}/register",
    params(
        ("id" = Uuid, Path, description = "Tournament id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Registered", body = TournamentParticipant),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tournament not found"),
        (status = 409, description = "Already registered"),
        (status = 422, description = "Registration is closed")
    ),
    tag = "tournaments"
)]
pub async fn register(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let participant = services::register(db.pool(), id, user.user_id).await?;

    Ok((StatusCode::CREATED, Json(participant)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/tournaments/{id}/score",
    params(
        ("id" = Uuid, Path, description = "Tournament id")
    ),
    request_body = SubmitScoreRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Score posted from the completed session; resubmission overwrites", body = TournamentParticipant),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tournament, participant, or session not found"),
        (status = 422, description = "Session is not completed or tournament already completed")
    ),
    tag = "tournaments"
)]
pub async fn submit_score(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitScoreRequest>,
) -> Result<Response, WebError> {
    let participant = services::submit_score(db.pool(), id, user.user_id, req.session_id).await?;

    Ok(Json(participant).into_response())
}

#[utoipa::path(
    get,
    path = "/api/tournaments/{id}/leaderboard",
    params(
        ("id" = Uuid, Path, description = "Tournament id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Standings: score desc, X-count desc, registration time asc; frozen once completed", body = Vec<LeaderboardEntry>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tournament not found")
    ),
    tag = "tournaments"
)]
pub async fn leaderboard(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let entries = services::leaderboard(db.pool(), id).await?;

    Ok(Json(entries).into_response())
}

#[utoipa::path(
    post,
    path = "/api/tournaments/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Tournament id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ranks frozen and tournament completed", body = TournamentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the organizer can complete a tournament"),
        (status = 404, description = "Tournament not found"),
        (status = 422, description = "Tournament is already completed")
    ),
    tag = "tournaments"
)]
pub async fn complete_tournament(
    State(db): State<Database>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let tournament = services::complete_tournament(db.pool(), id, user.user_id).await?;

    Ok(Json(tournament).into_response())
}
