//! Router assembly

mod user;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::require_auth;
use crate::state::AppState;

/// Prefix the user routes are mounted under
pub const USER_PREFIX: &str = "/api/v1/user";

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let auth = from_fn_with_state(state.clone(), require_auth);
    let user_root = get(user::search).merge(put(user::update).route_layer(auth));

    let user_routes = Router::new()
        .route("/signup", post(user::signup))
        .route("/signin", post(user::signin))
        .route("/", user_root.clone());

    // Nesting only matches the bare prefix; answer the trailing-slash form too
    Router::new()
        .nest(USER_PREFIX, user_routes)
        .route(&format!("{}/", USER_PREFIX), user_root)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
