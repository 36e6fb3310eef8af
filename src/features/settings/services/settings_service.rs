use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::shared::constants::{LOGO_SETTING_KEY, MAX_LOGO_SIZE};
use crate::shared::multipart::sniff_image_type;

/// Company logo printed on PDF reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Key/value application settings stored in Postgres
pub struct SettingsService {
    pool: PgPool,
}

impl SettingsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace the logo. The type is taken from the bytes, not the upload headers.
    pub async fn set_logo(&self, data: Vec<u8>) -> Result<Logo> {
        if data.len() > MAX_LOGO_SIZE {
            return Err(AppError::BadRequest(format!(
                "Logo exceeds the maximum size of {}MB",
                MAX_LOGO_SIZE / (1024 * 1024)
            )));
        }
        let content_type = sniff_image_type(&data)
            .ok_or_else(|| AppError::BadRequest("Logo must be a PNG or JPEG image".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, blob, text, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (key) DO UPDATE
            SET blob = EXCLUDED.blob, text = EXCLUDED.text, updated_at = NOW()
            "#,
        )
        .bind(LOGO_SETTING_KEY)
        .bind(&data)
        .bind(content_type)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store logo: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Logo updated ({} bytes, {})", data.len(), content_type);
        Ok(Logo {
            content_type: content_type.to_string(),
            data,
        })
    }

    pub async fn get_logo(&self) -> Result<Option<Logo>> {
        let row = sqlx::query_as::<_, (Option<Vec<u8>>, Option<String>)>(
            "SELECT blob, text FROM settings WHERE key = $1",
        )
        .bind(LOGO_SETTING_KEY)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load logo: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(row.and_then(|(blob, text)| {
            let data = blob.filter(|b| !b.is_empty())?;
            let content_type = text
                .or_else(|| sniff_image_type(&data).map(str::to_string))
                .unwrap_or_else(|| "application/octet-stream".to_string());
            Some(Logo { content_type, data })
        }))
    }

    /// Returns whether a logo was removed
    pub async fn clear_logo(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE key = $1")
            .bind(LOGO_SETTING_KEY)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear logo: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
