use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notifications::{NotificationService, RncEvent};
use crate::features::rncs::models::{
    CancelRnc, CloseRnc, LifecycleAction, NewRnc, Photo, PhotoStage, ReopenRnc, Rnc, RncFilter,
    RncStatus, StatusChange,
};
use crate::features::rncs::repositories::RncRepository;
use crate::features::rncs::services::numbering::{
    format_rnc_number, parse_rnc_number, ALLOCATION_RETRY_DELAY, MAX_ALLOCATION_ATTEMPTS,
    MAX_SEQUENCE,
};
use crate::features::rncs::services::PhotoService;
use crate::shared::constants::DELETE_CONFIRMATION;
use crate::shared::multipart::UploadedFile;
use crate::shared::types::PageWindow;

/// A record together with its photo links in upload order
#[derive(Debug, Clone)]
pub struct RncDetail {
    pub rnc: Rnc,
    pub photos: Vec<Photo>,
}

pub struct RncService {
    repo: Arc<dyn RncRepository>,
    photos: Arc<PhotoService>,
    notifications: Arc<NotificationService>,
}

impl RncService {
    pub fn new(
        repo: Arc<dyn RncRepository>,
        photos: Arc<PhotoService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            repo,
            photos,
            notifications,
        }
    }

    /// Open a new RNC numbered within the current year
    pub async fn create(&self, data: NewRnc) -> Result<Rnc> {
        let data = NewRnc {
            status: Some(RncStatus::Open),
            ..data
        };

        let rnc = self.allocate_and_insert(Utc::now().year(), &data).await?;
        info!("Opened RNC {} ({})", rnc.rnc_number, rnc.id);

        self.notifications.notify(RncEvent::Opened, &rnc);
        Ok(rnc)
    }

    /// Insert an imported row. Keeps `requested_number` when it is well-formed
    /// and free; otherwise allocates one. The flag is true when allocated.
    pub async fn import(&self, data: NewRnc, requested_number: Option<&str>) -> Result<(Rnc, bool)> {
        let requested = requested_number
            .map(str::trim)
            .filter(|n| parse_rnc_number(n).is_some());

        if let Some(number) = requested {
            if let Some(rnc) = self.repo.insert(number, &data).await? {
                return Ok((rnc, false));
            }
            debug!("RNC number {} already in use, allocating a new one", number);
        }

        let rnc = self.allocate_and_insert(Utc::now().year(), &data).await?;
        Ok((rnc, true))
    }

    /// Next free `year-NNN`; a lost race re-reads the max and tries again
    async fn allocate_and_insert(&self, year: i32, data: &NewRnc) -> Result<Rnc> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let next = self
                .repo
                .max_sequence_for_year(year)
                .await?
                .checked_add(1)
                .filter(|n| *n <= MAX_SEQUENCE)
                .ok_or_else(|| {
                    AppError::Conflict(format!("RNC numbering for {} is exhausted", year))
                })?;
            let number = format_rnc_number(year, next);

            if let Some(rnc) = self.repo.insert(&number, data).await? {
                return Ok(rnc);
            }

            debug!(
                "RNC number {} taken concurrently (attempt {}/{})",
                number, attempt, MAX_ALLOCATION_ATTEMPTS
            );
            tokio::time::sleep(ALLOCATION_RETRY_DELAY).await;
        }

        warn!("Gave up allocating an RNC number for {}", year);
        Err(AppError::Conflict(
            "Could not allocate an RNC number, please retry".to_string(),
        ))
    }

    pub async fn get(&self, id: Uuid) -> Result<RncDetail> {
        let rnc = self.find(id).await?;
        let photos = self.repo.list_photos(id).await?;
        Ok(RncDetail { rnc, photos })
    }

    pub async fn list(&self, filter: &RncFilter, window: PageWindow) -> Result<(Vec<Rnc>, i64)> {
        self.repo.list(filter, window.offset, window.limit).await
    }

    pub async fn close(&self, id: Uuid, data: CloseRnc) -> Result<Rnc> {
        self.transition(id, StatusChange::Close(data)).await
    }

    pub async fn reopen(&self, id: Uuid, data: ReopenRnc) -> Result<Rnc> {
        self.transition(id, StatusChange::Reopen(data)).await
    }

    pub async fn cancel(&self, id: Uuid, data: CancelRnc) -> Result<Rnc> {
        self.transition(id, StatusChange::Cancel(data)).await
    }

    async fn transition(&self, id: Uuid, change: StatusChange) -> Result<Rnc> {
        let current = self.find(id).await?;
        let action = change.action();

        let next = current.status.apply(action).ok_or_else(|| {
            AppError::Conflict(format!(
                "Cannot {} RNC {}: it is {}",
                action,
                current.rnc_number,
                current.status.label()
            ))
        })?;

        let updated = self
            .repo
            .apply_change(id, current.status, next, &change)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "RNC {} was changed by someone else, reload and try again",
                    current.rnc_number
                ))
            })?;

        info!(
            "RNC {} moved {} -> {}",
            updated.rnc_number, current.status, updated.status
        );

        let event = match action {
            LifecycleAction::Close => RncEvent::Closed,
            LifecycleAction::Reopen => RncEvent::Reopened,
            LifecycleAction::Cancel => RncEvent::Cancelled,
        };
        self.notifications.notify(event, &updated);

        Ok(updated)
    }

    /// Upload then link; the link is only written after every upload succeeded
    pub async fn add_photos(
        &self,
        id: Uuid,
        stage: PhotoStage,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<Photo>> {
        let rnc = self.find(id).await?;
        if rnc.status == RncStatus::Cancelled {
            return Err(AppError::Conflict(format!(
                "RNC {} is cancelled and no longer accepts photos",
                rnc.rnc_number
            )));
        }

        let uploaded = self
            .photos
            .upload_batch(&rnc.rnc_number, stage, files)
            .await?;

        match self.repo.insert_photos(id, &uploaded).await {
            Ok(photos) => Ok(photos),
            Err(e) => {
                warn!(
                    "Linking photos to RNC {} failed, removing uploaded objects",
                    rnc.rnc_number
                );
                let keys: Vec<&str> = uploaded.iter().map(|p| p.object_key.as_str()).collect();
                self.photos.discard(&keys).await;
                Err(e)
            }
        }
    }

    /// Permanent delete guarded by a typed confirmation word
    pub async fn delete(&self, id: Uuid, confirmation: &str) -> Result<()> {
        if !confirmation.trim().eq_ignore_ascii_case(DELETE_CONFIRMATION) {
            return Err(AppError::BadRequest(format!(
                "Type {} to confirm deletion",
                DELETE_CONFIRMATION
            )));
        }

        let photos = self
            .repo
            .delete(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("RNC {} not found", id)))?;

        info!("Deleted RNC {} with {} photo(s)", id, photos.len());
        self.photos.discard_photos(&photos).await;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Rnc> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("RNC {} not found", id)))
    }
}
