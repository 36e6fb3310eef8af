use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::pdf_reports::services::PdfReportService;
use crate::features::settings::SettingsService;

/// State for PDF report handlers
#[derive(Clone)]
pub struct PdfState {
    pub report_service: Arc<PdfReportService>,
    pub settings_service: Arc<SettingsService>,
}

/// Download the PDF report of one RNC
#[utoipa::path(
    get,
    path = "/api/rncs/{id}/pdf",
    params(
        ("id" = Uuid, Path, description = "RNC ID")
    ),
    responses(
        (status = 200, description = "PDF report", content_type = "application/pdf"),
        (status = 404, description = "RNC not found")
    ),
    tag = "reports"
)]
pub async fn download_pdf(State(state): State<PdfState>, Path(id): Path<Uuid>) -> Result<Response> {
    // A broken logo setting must not block the report
    let logo = match state.settings_service.get_logo().await {
        Ok(logo) => logo,
        Err(e) => {
            tracing::warn!("Rendering report without logo: {}", e);
            None
        }
    };

    let report = state.report_service.generate(id, logo).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.filename),
            ),
        ],
        report.data,
    )
        .into_response())
}
