use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use storage::Database;

use super::handlers::{create_round, delete_round, get_round, list_rounds, update_round};
use crate::middleware::auth::{optional_auth, require_auth};

pub fn routes(db: Database) -> Router<Database> {
    let protected = Router::new()
        .route("/", post(create_round))
        .route("/:id", put(update_round))
        .route("/:id", delete(delete_round))
        .route_layer(middleware::from_fn_with_state(db.clone(), require_auth));

    Router::new()
        .route(
            "/",
            get(list_rounds).route_layer(middleware::from_fn_with_state(db, optional_auth)),
        )
        .route("/:id", get(get_round))
        .merge(protected)
}
