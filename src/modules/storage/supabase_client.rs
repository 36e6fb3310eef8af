//! Supabase Storage REST client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, info, warn};

use super::{encode_key, PhotoStorage};
use crate::core::config::SupabaseStorageConfig;
use crate::core::error::AppError;

pub struct SupabaseStorageClient {
    base_url: String,
    api_key: String,
    bucket: String,
    http_client: Client,
}

impl SupabaseStorageClient {
    pub fn new(config: &SupabaseStorageConfig, bucket: &str) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.key.clone(),
            bucket: bucket.to_string(),
            http_client,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            encode_key(key)
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
    }

    async fn error_body(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        format!("{} - {}", status, body)
    }
}

#[async_trait]
impl PhotoStorage for SupabaseStorageClient {
    fn bucket_name(&self) -> &str {
        &self.bucket
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            encode_key(key)
        )
    }

    async fn ensure_bucket(&self) -> Result<(), AppError> {
        let url = format!("{}/storage/v1/bucket/{}", self.base_url, self.bucket);
        let existing = self
            .authorized(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to reach storage: {}", e))
            })?;

        if existing.status().is_success() {
            debug!("Bucket '{}' already exists", self.bucket);
            return Ok(());
        }

        let response = self
            .authorized(
                self.http_client
                    .post(format!("{}/storage/v1/bucket", self.base_url)),
            )
            .json(&json!({
                "id": self.bucket,
                "name": self.bucket,
                "public": true,
            }))
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to create bucket: {}", e))
            })?;

        if response.status().is_success() {
            info!("Bucket '{}' created as public", self.bucket);
            return Ok(());
        }

        let detail = Self::error_body(response).await;
        if detail.contains("already exists") || detail.contains("Duplicate") {
            debug!("Bucket '{}' already exists", self.bucket);
        } else {
            // Anon keys cannot create buckets; uploads may still work
            warn!(
                "Could not create bucket '{}': {}. Assuming it exists.",
                self.bucket, detail
            );
        }
        Ok(())
    }

    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let response = self
            .authorized(self.http_client.post(self.object_url(key)))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to upload '{}': {}", key, e))
            })?;

        if !response.status().is_success() {
            let detail = Self::error_body(response).await;
            return Err(AppError::ExternalServiceError(format!(
                "Failed to upload '{}': {}",
                key, detail
            )));
        }

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket);
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let response = self
            .authorized(self.http_client.delete(self.object_url(key)))
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to delete '{}': {}", key, e))
            })?;

        match response.status() {
            s if s.is_success() => {
                debug!("Deleted '{}' from bucket '{}'", key, self.bucket);
                Ok(())
            }
            StatusCode::NOT_FOUND => Ok(()),
            _ => {
                let detail = Self::error_body(response).await;
                Err(AppError::ExternalServiceError(format!(
                    "Failed to delete '{}': {}",
                    key, detail
                )))
            }
        }
    }
}
