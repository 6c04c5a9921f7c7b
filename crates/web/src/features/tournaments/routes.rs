use axum::{
    Router, middleware,
    routing::{get, post},
};
use storage::Database;

use super::handlers::{
    complete_tournament, create_tournament, get_tournament, leaderboard, list_tournaments,
    register, submit_score,
};
use crate::middleware::auth::require_auth;

pub fn routes(db: Database) -> Router<Database> {
    Router::new()
        .route("/", post(create_tournament))
        .route("/", get(list_tournaments))
        .route("/:id", get(get_tournament))
        .route("/:id/register", post(register))
        .route("/:id/score", post(submit_score))
        .route("/:id/leaderboard", get(leaderboard))
        .route("/:id/complete", post(complete_tournament))
        .route_layer(middleware::from_fn_with_state(db, require_auth))
}
