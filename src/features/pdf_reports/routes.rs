use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::pdf_reports::handlers::{self, PdfState};
use crate::features::pdf_reports::services::PdfReportService;
use crate::features::settings::SettingsService;

pub fn routes(
    report_service: Arc<PdfReportService>,
    settings_service: Arc<SettingsService>,
) -> Router {
    let state = PdfState {
        report_service,
        settings_service,
    };

    Router::new()
        .route("/api/rncs/{id}/pdf", get(handlers::download_pdf))
        .with_state(state)
}
