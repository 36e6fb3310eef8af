use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::peps::handlers;
use crate::features::peps::services::PepService;
use crate::shared::constants::MAX_CSV_SIZE;

/// Create routes for the PEP catalog
pub fn routes(service: Arc<PepService>) -> Router {
    Router::new()
        .route("/api/peps", get(handlers::list_peps).post(handlers::add_peps))
        .route(
            "/api/peps/import",
            post(handlers::import_peps).layer(DefaultBodyLimit::max(MAX_CSV_SIZE + 1024 * 1024)),
        )
        .with_state(service)
}
