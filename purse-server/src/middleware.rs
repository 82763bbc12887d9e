//! Bearer token authentication

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use purse_core::Error;

use crate::error::ApiError;
use crate::state::AppState;

/// Verified caller identity, inserted into request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Reject requests without a valid token before the handler runs
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req).ok_or_else(|| Error::unauthorized("Missing bearer token"))?;
    let claims = state.ctx.token_service.verify(token)?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
    });
    Ok(next.run(req).await)
}
