use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::features::settings::handlers;
use crate::features::settings::services::SettingsService;
use crate::shared::constants::MAX_LOGO_SIZE;

/// Create routes for application settings
pub fn routes(service: Arc<SettingsService>) -> Router {
    Router::new()
        .route(
            "/api/settings/logo",
            get(handlers::get_logo)
                .put(handlers::put_logo)
                .delete(handlers::delete_logo)
                .layer(DefaultBodyLimit::max(MAX_LOGO_SIZE + 1024 * 1024)),
        )
        .with_state(service)
}
