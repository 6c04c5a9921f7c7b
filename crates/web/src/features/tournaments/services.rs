use sqlx::PgPool;
use storage::{
    dto::tournament::{
        CreateTournamentRequest, LeaderboardEntry, TournamentDetailResponse, TournamentResponse,
    },
    error::Result,
    models::TournamentParticipant,
    repository::{round_template::RoundTemplateRepository, tournament::TournamentRepository},
};
use uuid::Uuid;

pub async fn create_tournament(
    pool: &PgPool,
    organizer: Uuid,
    request: &CreateTournamentRequest,
) -> Result<TournamentResponse> {
    let tournament = TournamentRepository::new(pool)
        .create(organizer, request)
        .await?;

    Ok(TournamentResponse::from(tournament))
}

pub async fn list_tournaments(pool: &PgPool) -> Result<Vec<TournamentResponse>> {
    let tournaments = TournamentRepository::new(pool).list().await?;

    Ok(tournaments.into_iter().map(TournamentResponse::from).collect())
}

/// Tournament detail with its current standings.
pub async fn get_tournament(pool: &PgPool, tournament_id: Uuid) -> Result<TournamentDetailResponse> {
    let repo = TournamentRepository::new(pool);
    let tournament = repo.find_by_id(tournament_id).await?;
    let participants = repo.leaderboard(tournament_id).await?;

    let template_name = RoundTemplateRepository::new(pool)
        .find_name(tournament.template_id)
        .await?;

    Ok(TournamentDetailResponse {
        tournament: TournamentResponse::from(tournament),
        template_name,
        participants,
    })
}

pub async fn register(
    pool: &PgPool,
    tournament_id: Uuid,
    user_id: Uuid,
) -> Result<TournamentParticipant> {
    TournamentRepository::new(pool)
        .register(tournament_id, user_id)
        .await
}

/// Post a completed session's totals as the participant's tournament score.
pub async fn submit_score(
    pool: &PgPool,
    tournament_id: Uuid,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<TournamentParticipant> {
    TournamentRepository::new(pool)
        .submit_score(tournament_id, user_id, session_id)
        .await
}

pub async fn leaderboard(pool: &PgPool, tournament_id: Uuid) -> Result<Vec<LeaderboardEntry>> {
    TournamentRepository::new(pool).leaderboard(tournament_id).await
}

/// Freeze standings; organizer only.
pub async fn complete_tournament(
    pool: &PgPool,
    tournament_id: Uuid,
    requester: Uuid,
) -> Result<TournamentResponse> {
    let tournament = TournamentRepository::new(pool)
        .complete(tournament_id, requester)
        .await?;

    Ok(TournamentResponse::from(tournament))
}
