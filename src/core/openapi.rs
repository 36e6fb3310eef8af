use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::backups::{dtos as backups_dtos, handlers as backups_handlers};
use crate::features::pdf_reports::handlers as pdf_handlers;
use crate::features::peps::{dtos as peps_dtos, handlers as peps_handlers};
use crate::features::rncs::{dtos as rncs_dtos, handlers as rncs_handlers, models as rncs_models};
use crate::features::settings::handlers as settings_handlers;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::login,
        auth::handlers::get_session,
        // RNCs
        rncs_handlers::get_options,
        rncs_handlers::list_rncs,
        rncs_handlers::create_rnc,
        rncs_handlers::get_rnc,
        rncs_handlers::close_rnc,
        rncs_handlers::reopen_rnc,
        rncs_handlers::cancel_rnc,
        rncs_handlers::delete_rnc,
        rncs_handlers::upload_photos,
        // Reports
        pdf_handlers::download_pdf,
        // Backups
        backups_handlers::export_csv,
        backups_handlers::import_csv,
        // PEPs
        peps_handlers::list_peps,
        peps_handlers::add_peps,
        peps_handlers::import_peps,
        // Settings
        settings_handlers::get_logo,
        settings_handlers::put_logo,
        settings_handlers::delete_logo,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::model::QualitySession,
            auth::dtos::LoginRequestDto,
            auth::dtos::SessionTokenDto,
            auth::dtos::SessionInfoDto,
            ApiResponse<auth::dtos::SessionTokenDto>,
            ApiResponse<auth::dtos::SessionInfoDto>,
            // RNCs
            rncs_models::RncStatus,
            rncs_models::PhotoStage,
            rncs_dtos::CreateRncDto,
            rncs_dtos::CloseRncDto,
            rncs_dtos::ReopenRncDto,
            rncs_dtos::CancelRncDto,
            rncs_dtos::DeleteRncDto,
            rncs_dtos::UploadPhotosDto,
            rncs_dtos::RncResponseDto,
            rncs_dtos::PhotoResponseDto,
            rncs_dtos::PhotosByStageDto,
            rncs_dtos::RncDetailResponseDto,
            rncs_dtos::StatusOptionDto,
            rncs_dtos::RncOptionsDto,
            ApiResponse<rncs_dtos::RncResponseDto>,
            ApiResponse<Vec<rncs_dtos::RncResponseDto>>,
            ApiResponse<rncs_dtos::RncDetailResponseDto>,
            ApiResponse<Vec<rncs_dtos::PhotoResponseDto>>,
            ApiResponse<rncs_dtos::RncOptionsDto>,
            // Backups
            backups_dtos::ImportResultDto,
            backups_dtos::ImportRncsDto,
            ApiResponse<backups_dtos::ImportResultDto>,
            // PEPs
            peps_dtos::PepResponseDto,
            peps_dtos::AddPepsDto,
            peps_dtos::PepImportResultDto,
            peps_dtos::ImportPepsDto,
            ApiResponse<Vec<peps_dtos::PepResponseDto>>,
            ApiResponse<peps_dtos::PepImportResultDto>,
            // Settings
            settings_handlers::UploadLogoDto,
            settings_handlers::LogoInfoDto,
            ApiResponse<settings_handlers::LogoInfoDto>,
        )
    ),
    tags(
        (name = "auth", description = "Quality-team login"),
        (name = "rncs", description = "Non-conformance reports, lifecycle and photos"),
        (name = "reports", description = "PDF report per RNC"),
        (name = "backups", description = "CSV export and import of all RNCs"),
        (name = "peps", description = "PEP code catalog"),
        (name = "settings", description = "Application settings (report logo)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "RNC Tracker API",
        version = "0.1.0",
        description = "API documentation for the RNC tracker",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
