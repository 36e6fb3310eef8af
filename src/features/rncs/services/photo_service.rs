use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::rncs::models::{NewPhoto, Photo, PhotoStage};
use crate::modules::storage::PhotoStorage;
use crate::shared::constants::{ALLOWED_IMAGE_TYPES, MAX_PHOTOS_PER_UPLOAD, MAX_PHOTO_SIZE};
use crate::shared::multipart::{extension_for_content_type, sniff_image_type, UploadedFile};

/// Moves photo bytes into the bucket. Rows are written by the caller.
pub struct PhotoService {
    storage: Option<Arc<dyn PhotoStorage>>,
}

impl PhotoService {
    pub fn new(storage: Option<Arc<dyn PhotoStorage>>) -> Self {
        Self { storage }
    }

    fn storage(&self) -> Result<&Arc<dyn PhotoStorage>> {
        self.storage.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable(
                "Photo storage is not configured. Set SUPABASE_URL and SUPABASE_KEY or S3_ENDPOINT."
                    .to_string(),
            )
        })
    }

    /// Reject the whole batch before anything is uploaded. Returns the type
    /// read from each file's signature; the declared header is not trusted.
    pub fn validate(files: &[UploadedFile]) -> Result<Vec<&'static str>> {
        if files.is_empty() {
            return Err(AppError::BadRequest("At least one photo is required".to_string()));
        }
        if files.len() > MAX_PHOTOS_PER_UPLOAD {
            return Err(AppError::BadRequest(format!(
                "At most {} photos per upload",
                MAX_PHOTOS_PER_UPLOAD
            )));
        }

        for file in files {
            if file.data.is_empty() {
                return Err(AppError::BadRequest(format!("'{}' is empty", file.filename)));
            }
            if file.data.len() > MAX_PHOTO_SIZE {
                return Err(AppError::BadRequest(format!(
                    "'{}' exceeds the maximum photo size of {}MB",
                    file.filename,
                    MAX_PHOTO_SIZE / (1024 * 1024)
                )));
            }
        }

        files
            .iter()
            .map(|file| {
                sniff_image_type(&file.data).ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "'{}' is not a supported image (declared '{}'). Allowed: {}",
                        file.filename,
                        file.content_type,
                        ALLOWED_IMAGE_TYPES.join(", ")
                    ))
                })
            })
            .collect()
    }

    /// Object key `{rnc_number}/{stage}/{uuid}.{ext}`
    pub fn object_key(rnc_number: &str, stage: PhotoStage, content_type: &str) -> String {
        let ext = extension_for_content_type(content_type).unwrap_or("bin");
        format!(
            "{}/{}/{}.{}",
            rnc_number,
            stage.key_segment(),
            Uuid::new_v4().simple(),
            ext
        )
    }

    /// Upload every file or none: a failure removes what this batch already stored.
    pub async fn upload_batch(
        &self,
        rnc_number: &str,
        stage: PhotoStage,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<NewPhoto>> {
        let storage = self.storage()?;
        let content_types = Self::validate(&files)?;

        let mut uploaded: Vec<NewPhoto> = Vec::with_capacity(files.len());
        for (file, content_type) in files.into_iter().zip(content_types) {
            let key = Self::object_key(rnc_number, stage, content_type);
            let sha256 = hex::encode(Sha256::digest(&file.data));
            let file_size = file.data.len() as i64;

            match storage.upload(&key, file.data, content_type).await {
                Ok(url) => uploaded.push(NewPhoto {
                    stage,
                    url,
                    object_key: key,
                    filename: file.filename,
                    content_type: content_type.to_string(),
                    file_size,
                    sha256,
                }),
                Err(e) => {
                    warn!(
                        "Upload of '{}' for RNC {} failed, discarding {} stored photo(s)",
                        file.filename,
                        rnc_number,
                        uploaded.len()
                    );
                    let keys: Vec<&str> = uploaded.iter().map(|p| p.object_key.as_str()).collect();
                    self.discard(&keys).await;
                    return Err(e);
                }
            }
        }

        info!(
            "Uploaded {} {} photo(s) for RNC {}",
            uploaded.len(),
            stage.key_segment(),
            rnc_number
        );
        Ok(uploaded)
    }

    /// Best-effort removal of bucket objects; failures are only logged
    pub async fn discard(&self, keys: &[&str]) {
        let Some(storage) = self.storage.as_ref() else {
            return;
        };

        for key in keys {
            if let Err(e) = storage.delete(key).await {
                warn!("Failed to delete bucket object '{}': {}", key, e);
            }
        }
    }

    pub async fn discard_photos(&self, photos: &[Photo]) {
        let keys: Vec<&str> = photos.iter().map(|p| p.object_key.as_str()).collect();
        self.discard(&keys).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{jpeg_file, png_bytes, MemoryStorage};

    #[test]
    fn test_object_key_layout() {
        let key = PhotoService::object_key("2026-003", PhotoStage::Closing, "image/png");
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts[0], "2026-003");
        assert_eq!(parts[1], "encerramento");
        assert!(parts[2].ends_with(".png"));
        assert_eq!(parts[2].len(), 32 + 4);
    }

    #[test]
    fn test_validate_rejects_bad_batches() {
        assert!(PhotoService::validate(&[]).is_err());

        let mut gif = jpeg_file("a.gif");
        gif.content_type = "image/gif".to_string();
        gif.data = b"GIF89a\x01\x00".to_vec();
        assert!(PhotoService::validate(&[gif]).is_err());

        let mut disguised = jpeg_file("notas.jpg");
        disguised.data = b"not really a photo".to_vec();
        assert!(PhotoService::validate(&[disguised]).is_err());

        let mut huge = jpeg_file("big.jpg");
        huge.data = vec![0u8; MAX_PHOTO_SIZE + 1];
        assert!(PhotoService::validate(&[huge]).is_err());

        assert_eq!(
            PhotoService::validate(&[jpeg_file("ok.jpg")]).unwrap(),
            vec!["image/jpeg"]
        );
    }

    #[tokio::test]
    async fn test_unconfigured_storage() {
        let service = PhotoService::new(None);
        let err = service
            .upload_batch("2026-001", PhotoStage::Opening, vec![jpeg_file("a.jpg")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_upload_batch_records_metadata() {
        let storage = Arc::new(MemoryStorage::default());
        let service = PhotoService::new(Some(storage.clone()));

        let photos = service
            .upload_batch(
                "2026-001",
                PhotoStage::Opening,
                vec![jpeg_file("a.jpg"), jpeg_file("b.jpg")],
            )
            .await
            .unwrap();

        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].filename, "a.jpg");
        assert_eq!(photos[0].sha256.len(), 64);
        assert!(photos[0].url.ends_with(&photos[0].object_key));
        assert_eq!(storage.object_count(), 2);
    }

    #[tokio::test]
    async fn test_stored_type_comes_from_file_signature() {
        let storage = Arc::new(MemoryStorage::default());
        let service = PhotoService::new(Some(storage.clone()));

        let mut mislabelled = jpeg_file("scan.jpg");
        mislabelled.data = png_bytes();

        let photos = service
            .upload_batch("2026-001", PhotoStage::Closing, vec![mislabelled])
            .await
            .unwrap();

        assert_eq!(photos[0].content_type, "image/png");
        assert!(photos[0].object_key.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_non_image_bytes_never_reach_bucket() {
        let storage = Arc::new(MemoryStorage::default());
        let service = PhotoService::new(Some(storage.clone()));

        let mut fake = jpeg_file("a.jpg");
        fake.data = b"<html></html>".to_vec();

        let err = service
            .upload_batch("2026-001", PhotoStage::Opening, vec![jpeg_file("b.jpg"), fake])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_upload_rolls_back_batch() {
        let storage = Arc::new(MemoryStorage::failing_after(1));
        let service = PhotoService::new(Some(storage.clone()));

        let err = service
            .upload_batch(
                "2026-001",
                PhotoStage::Opening,
                vec![jpeg_file("a.jpg"), jpeg_file("b.jpg")],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ExternalServiceError(_)));
        assert_eq!(storage.object_count(), 0);
    }
}
