//! `/api/v1/user` handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use purse_core::{SigninRequest, SignupRequest, UpdateUserRequest, UserProfile};

use crate::error::ApiError;
use crate::extract::{JsonBody, QueryParams};
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub msg: &'static str,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub msg: &'static str,
    pub user: Vec<UserProfile>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub filter: Option<String>,
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.ctx.user_service.signup(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            msg: "User created",
            token: outcome.token,
        }),
    ))
}

/// POST /signin
pub async fn signin(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SigninRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.ctx.user_service.signin(&request).await?;
    Ok(Json(TokenResponse {
        msg: "User found",
        token: outcome.token,
    }))
}

/// PUT / (authenticated)
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.ctx.user_service.update(auth.user_id, &request).await?;
    Ok(Json(MessageResponse {
        msg: "User updated",
    }))
}

/// GET /?filter=
pub async fn search(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .ctx
        .user_service
        .search(params.filter.as_deref())
        .await?;
    Ok(Json(SearchResponse {
        msg: "User found",
        user: users,
    }))
}
