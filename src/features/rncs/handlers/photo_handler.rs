use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::QualitySession;
use crate::features::rncs::dtos::{PhotoResponseDto, UploadPhotosDto};
use crate::features::rncs::handlers::RncState;
use crate::features::rncs::models::PhotoStage;
use crate::shared::multipart::MultipartForm;
use crate::shared::types::ApiResponse;

/// Upload photos for one lifecycle stage of an RNC
///
/// Accepts multipart/form-data with:
/// - `stage`: opening, closing or reopening (required)
/// - `file`: one or more JPEG/PNG images
#[utoipa::path(
    post,
    path = "/api/rncs/{id}/photos",
    params(
        ("id" = Uuid, Path, description = "RNC ID")
    ),
    request_body(
        content = UploadPhotosDto,
        content_type = "multipart/form-data",
        description = "Stage plus one or more image files"
    ),
    responses(
        (status = 201, description = "Photos stored and linked", body = ApiResponse<Vec<PhotoResponseDto>>),
        (status = 400, description = "Invalid stage or file"),
        (status = 401, description = "Quality session required"),
        (status = 404, description = "RNC not found"),
        (status = 413, description = "Upload too large"),
        (status = 502, description = "Bucket upload failed"),
        (status = 503, description = "Photo storage not configured")
    ),
    security(("bearer_auth" = [])),
    tag = "rncs"
)]
pub async fn upload_photos(
    _session: QualitySession,
    State(state): State<RncState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<PhotoResponseDto>>>)> {
    let form = MultipartForm::read(multipart).await?;

    let stage_value = form
        .field("stage")
        .ok_or_else(|| AppError::BadRequest("stage is required".to_string()))?;
    let stage = PhotoStage::parse(stage_value).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Invalid stage '{}'. Use opening, closing or reopening",
            stage_value
        ))
    })?;

    let photos = state
        .rnc_service
        .add_photos(id, stage, form.files)
        .await?;

    let count = photos.len();
    let dtos: Vec<PhotoResponseDto> = photos.into_iter().map(|p| p.into()).collect();

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(dtos),
            Some(format!("{} photo(s) added", count)),
            None,
        )),
    ))
}
