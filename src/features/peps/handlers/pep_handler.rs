use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::QualitySession;
use crate::features::peps::dtos::{AddPepsDto, ImportPepsDto, PepImportResultDto, PepResponseDto};
use crate::features::peps::services::{normalize_codes, PepService};
use crate::shared::constants::MAX_CSV_SIZE;
use crate::shared::multipart::MultipartForm;
use crate::shared::types::{ApiResponse, Meta};

/// List PEP codes
#[utoipa::path(
    get,
    path = "/api/peps",
    responses(
        (status = 200, description = "All PEP codes", body = ApiResponse<Vec<PepResponseDto>>)
    ),
    tag = "peps"
)]
pub async fn list_peps(
    State(service): State<Arc<PepService>>,
) -> Result<Json<ApiResponse<Vec<PepResponseDto>>>> {
    let peps = service.list().await?;
    let total = peps.len() as i64;
    let dtos: Vec<PepResponseDto> = peps.into_iter().map(|p| p.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Add PEP codes
#[utoipa::path(
    post,
    path = "/api/peps",
    request_body = AddPepsDto,
    responses(
        (status = 200, description = "Codes added", body = ApiResponse<PepImportResultDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Quality session required")
    ),
    security(("bearer_auth" = [])),
    tag = "peps"
)]
pub async fn add_peps(
    _session: QualitySession,
    State(service): State<Arc<PepService>>,
    AppJson(dto): AppJson<AddPepsDto>,
) -> Result<Json<ApiResponse<PepImportResultDto>>> {
    dto.validate()?;

    let received = normalize_codes(&dto.codes).len();
    let added = service.add_bulk(&dto.codes).await?;

    Ok(Json(ApiResponse::success(
        Some(PepImportResultDto { added, received }),
        None,
        None,
    )))
}

/// Import PEP codes from a CSV file
#[utoipa::path(
    post,
    path = "/api/peps/import",
    request_body(
        content = ImportPepsDto,
        content_type = "multipart/form-data",
        description = "CSV file"
    ),
    responses(
        (status = 200, description = "Codes imported", body = ApiResponse<PepImportResultDto>),
        (status = 400, description = "Invalid CSV"),
        (status = 401, description = "Quality session required")
    ),
    security(("bearer_auth" = [])),
    tag = "peps"
)]
pub async fn import_peps(
    _session: QualitySession,
    State(service): State<Arc<PepService>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<PepImportResultDto>>> {
    let file = MultipartForm::read(multipart).await?.single_file()?;
    if file.data.len() > MAX_CSV_SIZE {
        return Err(AppError::BadRequest(format!(
            "CSV exceeds {}MB",
            MAX_CSV_SIZE / (1024 * 1024)
        )));
    }

    let (added, received) = service.import_csv(&file.data).await?;
    Ok(Json(ApiResponse::success(
        Some(PepImportResultDto { added, received }),
        Some(format!("{} new PEP code(s)", added)),
        None,
    )))
}
