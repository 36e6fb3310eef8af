use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::pdf_reports::services::report_layout::{render_rnc_report, ReportPhoto};
use crate::features::rncs::models::Photo;
use crate::features::rncs::RncService;
use crate::features::settings::Logo;

/// A rendered report ready for download
#[derive(Debug, Clone)]
pub struct PdfReport {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Builds per-RNC PDF reports, pulling photos from their public URLs
pub struct PdfReportService {
    rnc_service: Arc<RncService>,
    http_client: reqwest::Client,
}

impl PdfReportService {
    pub fn new(rnc_service: Arc<RncService>, photo_fetch_timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(photo_fetch_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            rnc_service,
            http_client,
        })
    }

    async fn fetch_photo(&self, photo: &Photo) -> Option<Vec<u8>> {
        let response = match self.http_client.get(&photo.url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Photo {} unreachable: {}", photo.url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Photo {} returned {}", photo.url, response.status());
            return None;
        }

        match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                warn!("Failed to read photo {}: {}", photo.url, e);
                None
            }
        }
    }

    /// Render the report for `id`. Photos that cannot be fetched are drawn
    /// as placeholders instead of failing the report.
    pub async fn generate(&self, id: Uuid, logo: Option<Logo>) -> Result<PdfReport> {
        let detail = self.rnc_service.get(id).await?;

        let fetched = join_all(detail.photos.iter().map(|p| self.fetch_photo(p))).await;
        let photos: Vec<ReportPhoto> = detail
            .photos
            .iter()
            .zip(fetched)
            .map(|(photo, data)| ReportPhoto {
                stage: photo.stage,
                filename: photo.filename.clone(),
                url: photo.url.clone(),
                data,
            })
            .collect();

        let missing = photos.iter().filter(|p| p.data.is_none()).count();
        debug!(
            "Rendering RNC {} with {} photos ({} unavailable)",
            detail.rnc.rnc_number,
            photos.len(),
            missing
        );

        let rnc = detail.rnc;
        let filename = format!("RNC_{}.pdf", rnc.rnc_number);
        let data = tokio::task::spawn_blocking(move || {
            render_rnc_report(&rnc, &photos, logo.as_ref())
        })
        .await
        .map_err(|e| AppError::Internal(format!("PDF rendering task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to render PDF: {}", e)))?;

        info!("Generated {} ({} bytes)", filename, data.len());
        Ok(PdfReport { filename, data })
    }
}
