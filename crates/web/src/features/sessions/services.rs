use sqlx::PgPool;
use storage::{
    dto::scoring::{
        CompleteSessionRequest, CreateSessionRequest, EndResponse, PersonalRecordResponse,
        SessionFilter, SessionResponse, SessionSummary, SharedSessionResponse, StatsResponse,
        SubmitEndRequest,
    },
    error::Result,
    models::ScoringSession,
    repository::{
        personal_record::PersonalRecordRepository, round_template::RoundTemplateRepository,
        session::SessionRepository, setup_profile::SetupProfileRepository,
    },
    services::completion,
};
use uuid::Uuid;

/// Start a session. A setup profile, when given, must belong to the
/// requester.
pub async fn create_session(
    pool: &PgPool,
    user_id: Uuid,
    request: &CreateSessionRequest,
) -> Result<SessionResponse> {
    if let Some(setup_id) = request.setup_profile_id {
        SetupProfileRepository::new(pool)
            .find_owned(setup_id, user_id)
            .await?;
    }

    let session = SessionRepository::new(pool)
        .create(
            user_id,
            request.template_id,
            request.setup_profile_id,
            request.notes.as_deref(),
            request.location.as_deref(),
            request.weather.as_deref(),
        )
        .await?;

    build_session_response(pool, session, false).await
}

/// Session detail with ends, names, and a freshly computed personal-best
/// flag.
pub async fn get_session(
    pool: &PgPool,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<SessionResponse> {
    let session = SessionRepository::new(pool)
        .find_owned(session_id, user_id)
        .await?;

    let is_personal_best = PersonalRecordRepository::new(pool)
        .is_record_session(user_id, session_id)
        .await?;

    build_session_response(pool, session, is_personal_best).await
}

pub async fn list_sessions(
    pool: &PgPool,
    user_id: Uuid,
    filter: &SessionFilter,
) -> Result<(Vec<SessionSummary>, i64)> {
    SessionRepository::new(pool).list(user_id, filter).await
}

pub async fn submit_end(
    pool: &PgPool,
    session_id: Uuid,
    user_id: Uuid,
    request: &SubmitEndRequest,
) -> Result<EndResponse> {
    SessionRepository::new(pool)
        .submit_end(session_id, user_id, request.stage_id, &request.arrows)
        .await
}

pub async fn undo_last_end(
    pool: &PgPool,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<SessionResponse> {
    let session = SessionRepository::new(pool)
        .undo_last_end(session_id, user_id)
        .await?;

    build_session_response(pool, session, false).await
}

/// Complete a session and derive personal record, classification, and feed
/// facts. The returned flag reflects this completion call.
pub async fn complete_session(
    pool: &PgPool,
    session_id: Uuid,
    user_id: Uuid,
    overrides: &CompleteSessionRequest,
) -> Result<SessionResponse> {
    let (session, is_personal_best) =
        completion::complete_session(pool, session_id, user_id, overrides).await?;

    build_session_response(pool, session, is_personal_best).await
}

pub async fn abandon_session(
    pool: &PgPool,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<SessionResponse> {
    let session = SessionRepository::new(pool)
        .abandon(session_id, user_id)
        .await?;

    build_session_response(pool, session, false).await
}

pub async fn delete_session(pool: &PgPool, session_id: Uuid, user_id: Uuid) -> Result<()> {
    SessionRepository::new(pool).delete(session_id, user_id).await
}

pub async fn session_stats(pool: &PgPool, user_id: Uuid) -> Result<StatsResponse> {
    SessionRepository::new(pool).stats(user_id).await
}

pub async fn personal_records(pool: &PgPool, user_id: Uuid) -> Result<Vec<PersonalRecordResponse>> {
    PersonalRecordRepository::new(pool).list_for_user(user_id).await
}

pub async fn create_share_token(pool: &PgPool, session_id: Uuid, user_id: Uuid) -> Result<String> {
    SessionRepository::new(pool)
        .create_share_token(session_id, user_id)
        .await
}

pub async fn revoke_share_token(pool: &PgPool, session_id: Uuid, user_id: Uuid) -> Result<()> {
    SessionRepository::new(pool)
        .revoke_share_token(session_id, user_id)
        .await
}

/// Public view of a shared session.
pub async fn shared_session(pool: &PgPool, token: &str) -> Result<SharedSessionResponse> {
    let repo = SessionRepository::new(pool);
    let (session, archer_name) = repo.find_by_share_token(token).await?;

    let template_name = RoundTemplateRepository::new(pool)
        .find_name(session.template_id)
        .await?;
    let ends = repo.ends_with_arrows(session.session_id).await?;

    Ok(SharedSessionResponse {
        archer_name,
        template_name,
        total_score: session.total_score,
        total_x_count: session.total_x_count,
        total_arrows: session.total_arrows,
        notes: session.notes,
        location: session.location,
        weather: session.weather,
        started_at: session.started_at,
        completed_at: session.completed_at,
        ends,
    })
}

async fn build_session_response(
    pool: &PgPool,
    session: ScoringSession,
    is_personal_best: bool,
) -> Result<SessionResponse> {
    let template_name = RoundTemplateRepository::new(pool)
        .find_name(session.template_id)
        .await?;

    let setup_profile_name = match session.setup_profile_id {
        Some(setup_id) => SetupProfileRepository::new(pool).find_name(setup_id).await?,
        None => None,
    };

    let ends = SessionRepository::new(pool)
        .ends_with_arrows(session.session_id)
        .await?;

    Ok(SessionResponse::new(
        session,
        template_name,
        setup_profile_name,
        is_personal_best,
        ends,
    ))
}
