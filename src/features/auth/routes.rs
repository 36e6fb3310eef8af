use crate::features::auth::handlers;
use crate::features::auth::services::SessionService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Auth routes: login is public, session inspection needs a token
pub fn routes(service: Arc<SessionService>) -> Router {
    Router::new()
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/session", get(handlers::get_session))
        .with_state(service)
}
