use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use storage::{Database, error::StorageError, repository::user::UserRepository};
use uuid::Uuid;

use crate::error::WebError;

/// The authenticated requester, resolved from the bearer token and inserted
/// into request extensions. The scoring core only ever needs the stable id;
/// display names are resolved where they are rendered.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

async fn resolve_user(db: &Database, token: &str) -> Result<CurrentUser, StorageError> {
    let user = UserRepository::new(db.pool()).find_by_token(token).await?;
    Ok(CurrentUser {
        user_id: user.user_id,
    })
}

/// Rejects requests without a valid bearer token.
pub async fn require_auth(
    State(db): State<Database>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = bearer_token(&request).ok_or(WebError::Unauthorized)?;

    let user = resolve_user(&db, &token).await.map_err(|e| match e {
        StorageError::NotFound => {
            tracing::warn!("Invalid API token attempt");
            WebError::Unauthorized
        }
        other => WebError::from(other),
    })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Resolves the requester when a valid token is present; anonymous requests
/// pass through untouched.
pub async fn optional_auth(
    State(db): State<Database>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&request)
        && let Ok(user) = resolve_user(&db, &token).await
    {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}
