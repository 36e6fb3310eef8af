use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::core::error::{AppError, Result};
use crate::features::auth::model::QualitySession;
use crate::features::backups::dtos::{ImportResultDto, ImportRncsDto};
use crate::features::backups::services::{CsvExportService, CsvImportService, EXPORT_FILENAME};
use crate::shared::constants::MAX_CSV_SIZE;
use crate::shared::multipart::MultipartForm;
use crate::shared::types::ApiResponse;

/// State for backup handlers
#[derive(Clone)]
pub struct BackupState {
    pub export_service: Arc<CsvExportService>,
    pub import_service: Arc<CsvImportService>,
}

/// Download every RNC as CSV
#[utoipa::path(
    get,
    path = "/api/rncs/export.csv",
    responses(
        (status = 200, description = "UTF-8 CSV with BOM", content_type = "text/csv")
    ),
    tag = "backups"
)]
pub async fn export_csv(State(state): State<BackupState>) -> Result<Response> {
    let bytes = state.export_service.export().await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Import RNCs from CSV
#[utoipa::path(
    post,
    path = "/api/rncs/import",
    request_body(
        content = ImportRncsDto,
        content_type = "multipart/form-data",
        description = "CSV file"
    ),
    responses(
        (status = 200, description = "Import finished", body = ApiResponse<ImportResultDto>),
        (status = 400, description = "Invalid CSV"),
        (status = 401, description = "Quality session required")
    ),
    security(("bearer_auth" = [])),
    tag = "backups"
)]
pub async fn import_csv(
    _session: QualitySession,
    State(state): State<BackupState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImportResultDto>>> {
    let file = MultipartForm::read(multipart).await?.single_file()?;
    if file.data.len() > MAX_CSV_SIZE {
        return Err(AppError::BadRequest(format!(
            "CSV exceeds {}MB",
            MAX_CSV_SIZE / (1024 * 1024)
        )));
    }

    let result = state.import_service.import(&file.data).await?;
    let message = format!(
        "{} row(s) imported, {} number(s) generated",
        result.inserted, result.auto_numbered
    );

    Ok(Json(ApiResponse::success(Some(result), Some(message), None)))
}
