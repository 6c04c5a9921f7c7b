use anyhow::Context;
use axum::{Extension, Router};
use storage::Database;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;

use config::Config;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::rounds::handlers::list_rounds,
        features::rounds::handlers::get_round,
        features::rounds::handlers::create_round,
        features::rounds::handlers::update_round,
        features::rounds::handlers::delete_round,
        features::sessions::handlers::create_session,
        features::sessions::handlers::list_sessions,
        features::sessions::handlers::session_stats,
        features::sessions::handlers::personal_records,
        features::sessions::handlers::get_session,
        features::sessions::handlers::submit_end,
        features::sessions::handlers::undo_last_end,
        features::sessions::handlers::complete_session,
        features::sessions::handlers::abandon_session,
        features::sessions::handlers::delete_session,
        features::sessions::handlers::create_share_link,
        features::sessions::handlers::revoke_share_link,
        features::sessions::handlers::shared_session,
        features::tournaments::handlers::create_tournament,
        features::tournaments::handlers::list_tournaments,
        features::tournaments::handlers::get_tournament,
        features::tournaments::handlers::register,
        features::tournaments::handlers::submit_score,
        features::tournaments::handlers::leaderboard,
        features::tournaments::handlers::complete_tournament,
        features::classifications::handlers::list_classifications,
        features::classifications::handlers::current_classifications,
    ),
    components(
        schemas(
            storage::dto::round::RoundTemplateRequest,
            storage::dto::round::StageInput,
            storage::dto::round::RoundTemplateResponse,
            storage::dto::round::StageResponse,
            storage::dto::scoring::CreateSessionRequest,
            storage::dto::scoring::ArrowScoreInput,
            storage::dto::scoring::SubmitEndRequest,
            storage::dto::scoring::CompleteSessionRequest,
            storage::dto::scoring::ArrowResponse,
            storage::dto::scoring::EndResponse,
            storage::dto::scoring::SessionResponse,
            storage::dto::scoring::SessionSummary,
            storage::dto::scoring::RoundTypeAverage,
            storage::dto::scoring::TrendPoint,
            storage::dto::scoring::StatsResponse,
            storage::dto::scoring::PersonalRecordResponse,
            storage::dto::scoring::ShareLinkResponse,
            storage::dto::scoring::SharedSessionResponse,
            storage::dto::tournament::CreateTournamentRequest,
            storage::dto::tournament::SubmitScoreRequest,
            storage::dto::tournament::TournamentResponse,
            storage::dto::tournament::TournamentDetailResponse,
            storage::dto::tournament::LeaderboardEntry,
            storage::dto::classification::ClassificationRecordResponse,
            storage::dto::classification::CurrentClassificationResponse,
            storage::dto::common::PaginationMeta,
            storage::models::SessionStatus,
            storage::models::TournamentParticipant,
        )
    ),
    tags(
        (name = "rounds", description = "Round template catalog"),
        (name = "sessions", description = "Scoring sessions, ends, and personal records"),
        (name = "tournaments", description = "Tournament scores and leaderboards"),
        (name = "classifications", description = "Classification achievements"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting archery scoring API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    storage::seed::round_templates::seed_round_templates(db.pool())
        .await
        .context("Failed to seed official round templates")?;

    let cors = CorsLayer::permissive();

    let app = Router::new()
        .nest("/api/rounds", features::rounds::routes(db.clone()))
        .nest("/api/sessions", features::sessions::routes(db.clone()))
        .nest("/api/shared", features::sessions::shared_routes())
        .nest("/api/tournaments", features::tournaments::routes(db.clone()))
        .nest(
            "/api/classifications",
            features::classifications::routes(db.clone()),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(Extension(config.clone())),
        )
        .with_state(db);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    let listener = TcpListener::bind(&bind_address)
        .await
        .context("Failed to bind server address")?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
