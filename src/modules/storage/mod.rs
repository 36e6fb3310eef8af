//! Photo bucket storage
//!
//! Two backends share the `PhotoStorage` seam: the Supabase Storage REST API
//! and any S3-compatible endpoint. Objects are publicly readable; the public
//! URL is what gets persisted next to each photo record.

mod s3_client;
mod supabase_client;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::core::config::StorageConfig;
use crate::core::error::AppError;

pub use s3_client::S3StorageClient;
pub use supabase_client::SupabaseStorageClient;

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    fn bucket_name(&self) -> &str;

    /// Public link for an object key
    fn public_url(&self, key: &str) -> String;

    /// Create the bucket as public if it does not exist yet
    async fn ensure_bucket(&self) -> Result<(), AppError>;

    /// Store an object and return its public URL
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> Result<String, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// Percent-encode each path segment of an object key, keeping the slashes
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the configured backend, S3 first. `None` when neither is configured.
pub async fn connect(config: &StorageConfig) -> Result<Option<Arc<dyn PhotoStorage>>, AppError> {
    let storage: Arc<dyn PhotoStorage> = if let Some(s3) = &config.s3 {
        Arc::new(S3StorageClient::new(s3, &config.bucket)?)
    } else if let Some(supabase) = &config.supabase {
        Arc::new(SupabaseStorageClient::new(supabase, &config.bucket)?)
    } else {
        return Ok(None);
    };

    storage.ensure_bucket().await?;
    info!("Photo storage ready, bucket: {}", storage.bucket_name());

    Ok(Some(storage))
}
