use axum::{Router, middleware, routing::get};
use storage::Database;

use super::handlers::{current_classifications, list_classifications};
use crate::middleware::auth::require_auth;

pub fn routes(db: Database) -> Router<Database> {
    Router::new()
        .route("/", get(list_classifications))
        .route("/current", get(current_classifications))
        .route_layer(middleware::from_fn_with_state(db, require_auth))
}
