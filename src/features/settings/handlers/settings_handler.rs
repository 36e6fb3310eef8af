use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::QualitySession;
use crate::features::settings::services::SettingsService;
use crate::shared::multipart::MultipartForm;
use crate::shared::types::ApiResponse;

/// Multipart form for the logo upload (documentation only)
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadLogoDto {
    /// PNG or JPEG, at most 2MB
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoInfoDto {
    pub content_type: String,
    pub size: usize,
}

/// Download the PDF logo
#[utoipa::path(
    get,
    path = "/api/settings/logo",
    responses(
        (status = 200, description = "Logo image", content_type = "image/png"),
        (status = 404, description = "No logo configured")
    ),
    tag = "settings"
)]
pub async fn get_logo(State(service): State<Arc<SettingsService>>) -> Result<Response> {
    let logo = service
        .get_logo()
        .await?
        .ok_or_else(|| AppError::NotFound("No logo configured".to_string()))?;

    Ok(([(header::CONTENT_TYPE, logo.content_type)], logo.data).into_response())
}

/// Upload or replace the PDF logo
#[utoipa::path(
    put,
    path = "/api/settings/logo",
    request_body(
        content = UploadLogoDto,
        content_type = "multipart/form-data",
        description = "Logo image"
    ),
    responses(
        (status = 200, description = "Logo stored", body = ApiResponse<LogoInfoDto>),
        (status = 400, description = "Not a PNG/JPEG or too large"),
        (status = 401, description = "Quality session required")
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn put_logo(
    _session: QualitySession,
    State(service): State<Arc<SettingsService>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<LogoInfoDto>>> {
    let file = MultipartForm::read(multipart).await?.single_file()?;
    let logo = service.set_logo(file.data).await?;

    Ok(Json(ApiResponse::success(
        Some(LogoInfoDto {
            content_type: logo.content_type,
            size: logo.data.len(),
        }),
        Some("Logo updated".to_string()),
        None,
    )))
}

/// Remove the PDF logo
#[utoipa::path(
    delete,
    path = "/api/settings/logo",
    responses(
        (status = 200, description = "Logo removed"),
        (status = 401, description = "Quality session required"),
        (status = 404, description = "No logo configured")
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn delete_logo(
    _session: QualitySession,
    State(service): State<Arc<SettingsService>>,
) -> Result<Json<ApiResponse<()>>> {
    if !service.clear_logo().await? {
        return Err(AppError::NotFound("No logo configured".to_string()));
    }

    Ok(Json(ApiResponse::success(
        None,
        Some("Logo removed".to_string()),
        None,
    )))
}
