use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use storage::Database;

use super::handlers::{
    abandon_session, complete_session, create_session, create_share_link, delete_session,
    get_session, list_sessions, personal_records, revoke_share_link, session_stats,
    shared_session, submit_end, undo_last_end,
};
use crate::middleware::auth::require_auth;

pub fn routes(db: Database) -> Router<Database> {
    Router::new()
        .route("/", post(create_session))
        .route("/", get(list_sessions))
        .route("/stats", get(session_stats))
        .route("/records", get(personal_records))
        .route("/:id", get(get_session))
        .route("/:id", delete(delete_session))
        .route("/:id/ends", post(submit_end))
        .route("/:id/ends/last", delete(undo_last_end))
        .route("/:id/complete", post(complete_session))
        .route("/:id/abandon", post(abandon_session))
        .route("/:id/share", post(create_share_link))
        .route("/:id/share", delete(revoke_share_link))
        .route_layer(middleware::from_fn_with_state(db, require_auth))
}

/// Public share-token lookup, mounted outside the authenticated tree.
pub fn shared_routes() -> Router<Database> {
    Router::new().route("/:token", get(shared_session))
}
