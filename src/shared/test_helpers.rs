//! In-memory stand-ins for the database, object storage and SMTP, plus
//! fixtures shared by unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{NaiveDate, Utc};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;
use uuid::Uuid;

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::core::middleware::session_middleware;
use crate::features::auth::services::SessionService;
use crate::features::backups::{CsvExportService, CsvImportService};
use crate::features::notifications::NotificationService;
use crate::features::rncs::models::{
    NewPhoto, NewRnc, Photo, PhotoStage, Rnc, RncFilter, RncStatus, StatusChange,
};
use crate::features::rncs::services::numbering::parse_rnc_number;
use crate::features::rncs::{PhotoService, RncRepository, RncService};
use crate::modules::mailer::{Mailer, OutgoingEmail};
use crate::modules::storage::PhotoStorage;
use crate::shared::multipart::UploadedFile;

pub const TEST_PASSWORD: &str = "senha-qualidade";

/// 4x2 RGB PNG
const PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAQAAAACCAIAAADwyuo0AAAAEElEQVR4nGM4IScHRwzIHABvCgghBqXSdgAAAABJRU5ErkJggg==";

pub fn png_bytes() -> Vec<u8> {
    STANDARD.decode(PNG_BASE64).unwrap()
}

/// Upload part carrying a JPEG signature
pub fn jpeg_file(name: &str) -> UploadedFile {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend_from_slice(name.as_bytes());
    UploadedFile {
        field_name: "file".to_string(),
        filename: name.to_string(),
        content_type: "image/jpeg".to_string(),
        data,
    }
}

pub fn new_rnc(title: &str) -> NewRnc {
    NewRnc {
        inspection_date: NaiveDate::from_ymd_opt(2026, 3, 10),
        issuer: Name().fake(),
        area: "Caldeiraria".to_string(),
        pep: "PEP-1001".to_string(),
        title: title.to_string(),
        responsible: Name().fake(),
        description: Sentence(4..10).fake(),
        cause: "Solda".to_string(),
        severity: "Alta".to_string(),
        category: "Qualidade".to_string(),
        ..Default::default()
    }
}

fn rnc_from(id: Uuid, rnc_number: &str, data: &NewRnc) -> Rnc {
    let now = Utc::now();
    Rnc {
        id,
        rnc_number: rnc_number.to_string(),
        inspection_date: data.inspection_date,
        issuer: data.issuer.clone(),
        area: data.area.clone(),
        pep: data.pep.clone(),
        title: data.title.clone(),
        responsible: data.responsible.clone(),
        description: data.description.clone(),
        reference_docs: data.reference_docs.clone(),
        cause: data.cause.clone(),
        process: data.process.clone(),
        origin: data.origin.clone(),
        severity: data.severity.clone(),
        category: data.category.clone(),
        actions: data.actions.clone(),
        action_responsible: data.action_responsible.clone(),
        status: data.status.unwrap_or(RncStatus::Open),
        closed_at: data.history.closed_at,
        closed_by: data.history.closed_by.clone(),
        closing_notes: data.history.closing_notes.clone(),
        closing_description: data.history.closing_description.clone(),
        effectiveness: data.history.effectiveness.clone(),
        reopened_at: data.history.reopened_at,
        reopened_by: data.history.reopened_by.clone(),
        reopening_reason: data.history.reopening_reason.clone(),
        reopening_description: data.history.reopening_description.clone(),
        cancelled_at: data.history.cancelled_at,
        cancelled_by: data.history.cancelled_by.clone(),
        cancellation_reason: data.history.cancellation_reason.clone(),
        created_at: now,
        status_changed_at: now,
        updated_at: now,
    }
}

/// Open RNC with every text field filled
pub fn sample_rnc(rnc_number: &str) -> Rnc {
    let mut data = new_rnc("Trinca no cordão de solda");
    data.reference_docs = "DES-0042 rev. B".to_string();
    data.process = "Produção".to_string();
    data.origin = "Solda".to_string();
    data.actions = "Retrabalhar o cordão e inspecionar por líquido penetrante".to_string();
    data.action_responsible = "Supervisor de solda".to_string();
    rnc_from(Uuid::now_v7(), rnc_number, &data)
}

pub fn sample_photo(rnc_id: Uuid, stage: PhotoStage, seq: i64, filename: &str) -> Photo {
    let object_key = format!("{}/{}/{}", rnc_id.simple(), stage.key_segment(), filename);
    Photo {
        id: Uuid::new_v4(),
        seq,
        rnc_id,
        stage,
        url: format!("https://storage.example.com/rnc-fotos/{}", object_key),
        object_key,
        filename: filename.to_string(),
        content_type: "image/jpeg".to_string(),
        file_size: 1024,
        sha256: "ab".repeat(32),
        created_at: Utc::now(),
    }
}

// =============================================================================
// RNC REPOSITORY
// =============================================================================

#[derive(Default)]
struct MemoryState {
    /// Insertion order; newest last
    rncs: Vec<Rnc>,
    photos: Vec<Photo>,
    next_seq: i64,
}

/// `RncRepository` over a mutex-guarded vector
#[derive(Default)]
pub struct MemoryRncRepository {
    state: Mutex<MemoryState>,
    always_conflicting: bool,
    failing_photo_links: bool,
    /// Inserts fail once this many records exist
    failing_inserts_at: Option<usize>,
}

impl MemoryRncRepository {
    /// Every insert reports the number as taken
    pub fn always_conflicting() -> Self {
        Self {
            always_conflicting: true,
            ..Default::default()
        }
    }

    /// Photo links fail as if the transaction was rolled back
    pub fn failing_photo_links() -> Self {
        Self {
            failing_photo_links: true,
            ..Default::default()
        }
    }

    /// Inserts fail as a database error once `count` records are stored
    pub fn failing_inserts_at(count: usize) -> Self {
        Self {
            failing_inserts_at: Some(count),
            ..Default::default()
        }
    }

    pub fn seed(&self, rnc_number: &str, data: NewRnc) -> Rnc {
        let rnc = rnc_from(Uuid::now_v7(), rnc_number, &data);
        self.state.lock().unwrap().rncs.push(rnc.clone());
        rnc
    }
}

fn matches_filter(rnc: &Rnc, filter: &RncFilter) -> bool {
    if filter.status.is_some_and(|s| s != rnc.status) {
        return false;
    }
    match filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => {
            let term = term.to_lowercase();
            [&rnc.rnc_number, &rnc.title, &rnc.area]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        }
        None => true,
    }
}

#[async_trait]
impl RncRepository for MemoryRncRepository {
    async fn max_sequence_for_year(&self, year: i32) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rncs
            .iter()
            .filter_map(|r| parse_rnc_number(&r.rnc_number))
            .filter(|(y, _)| *y == year)
            .map(|(_, seq)| seq)
            .max()
            .unwrap_or(0))
    }

    async fn insert(&self, rnc_number: &str, data: &NewRnc) -> Result<Option<Rnc>> {
        if self.always_conflicting {
            return Ok(None);
        }
        let mut state = self.state.lock().unwrap();
        if self.failing_inserts_at.is_some_and(|n| state.rncs.len() >= n) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        if state.rncs.iter().any(|r| r.rnc_number == rnc_number) {
            return Ok(None);
        }
        let rnc = rnc_from(Uuid::now_v7(), rnc_number, data);
        state.rncs.push(rnc.clone());
        Ok(Some(rnc))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Rnc>> {
        let state = self.state.lock().unwrap();
        Ok(state.rncs.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, filter: &RncFilter, offset: i64, limit: i64) -> Result<(Vec<Rnc>, i64)> {
        let state = self.state.lock().unwrap();
        let matching: Vec<Rnc> = state
            .rncs
            .iter()
            .rev()
            .filter(|r| matches_filter(r, filter))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn list_all(&self) -> Result<Vec<Rnc>> {
        let state = self.state.lock().unwrap();
        Ok(state.rncs.iter().rev().cloned().collect())
    }

    async fn apply_change(
        &self,
        id: Uuid,
        expected: RncStatus,
        new_status: RncStatus,
        change: &StatusChange,
    ) -> Result<Option<Rnc>> {
        let mut state = self.state.lock().unwrap();
        let Some(rnc) = state
            .rncs
            .iter_mut()
            .find(|r| r.id == id && r.status == expected)
        else {
            return Ok(None);
        };

        let now = Utc::now();
        match change {
            StatusChange::Close(data) => {
                rnc.closed_at = Some(now);
                rnc.closed_by = Some(data.closed_by.clone());
                rnc.closing_notes = data.notes.clone();
                rnc.closing_description = data.description.clone();
                rnc.effectiveness = Some(data.effectiveness.clone());
            }
            StatusChange::Reopen(data) => {
                rnc.reopened_at = Some(now);
                rnc.reopened_by = Some(data.reopened_by.clone());
                rnc.reopening_reason = Some(data.reason.clone());
                rnc.reopening_description = data.description.clone();
            }
            StatusChange::Cancel(data) => {
                rnc.cancelled_at = Some(now);
                rnc.cancelled_by = Some(data.cancelled_by.clone());
                rnc.cancellation_reason = Some(data.reason.clone());
            }
        }
        rnc.status = new_status;
        rnc.status_changed_at = now;
        rnc.updated_at = now;
        Ok(Some(rnc.clone()))
    }

    async fn insert_photos(&self, rnc_id: Uuid, photos: &[NewPhoto]) -> Result<Vec<Photo>> {
        if self.failing_photo_links {
            return Err(AppError::Internal("photo link insert failed".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        if !state.rncs.iter().any(|r| r.id == rnc_id) {
            return Err(AppError::NotFound(format!("RNC {} not found", rnc_id)));
        }

        let mut linked = Vec::with_capacity(photos.len());
        for photo in photos {
            state.next_seq += 1;
            linked.push(Photo {
                id: Uuid::new_v4(),
                seq: state.next_seq,
                rnc_id,
                stage: photo.stage,
                url: photo.url.clone(),
                object_key: photo.object_key.clone(),
                filename: photo.filename.clone(),
                content_type: photo.content_type.clone(),
                file_size: photo.file_size,
                sha256: photo.sha256.clone(),
                created_at: Utc::now(),
            });
        }
        state.photos.extend(linked.iter().cloned());
        Ok(linked)
    }

    async fn list_photos(&self, rnc_id: Uuid) -> Result<Vec<Photo>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .photos
            .iter()
            .filter(|p| p.rnc_id == rnc_id)
            .cloned()
            .collect())
    }

    async fn list_all_photos(&self) -> Result<Vec<Photo>> {
        Ok(self.state.lock().unwrap().photos.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Vec<Photo>>> {
        let mut state = self.state.lock().unwrap();
        let Some(index) = state.rncs.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        state.rncs.remove(index);

        let (removed, kept): (Vec<Photo>, Vec<Photo>) =
            std::mem::take(&mut state.photos)
                .into_iter()
                .partition(|p| p.rnc_id == id);
        state.photos = kept;
        Ok(Some(removed))
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Bucket kept in a hash map
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    uploads: AtomicUsize,
    fail_after: Option<usize>,
}

impl MemoryStorage {
    /// Accept `n` uploads, then fail every following one
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Default::default()
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl PhotoStorage for MemoryStorage {
    fn bucket_name(&self) -> &str {
        "rnc-fotos"
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://storage.test/rnc-fotos/{}", key)
    }

    async fn ensure_bucket(&self) -> std::result::Result<(), AppError> {
        Ok(())
    }

    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> std::result::Result<String, AppError> {
        let attempt = self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| attempt >= n) {
            return Err(AppError::ExternalServiceError(
                "storage rejected the upload".to_string(),
            ));
        }
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> std::result::Result<(), AppError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

// =============================================================================
// MAILER
// =============================================================================

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> std::result::Result<(), AppError> {
        if self.failing {
            return Err(AppError::ExternalServiceError(
                "SMTP connection refused".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

// =============================================================================
// SERVICES & ROUTER
// =============================================================================

/// RNC service without storage or email
pub fn test_rnc_service(repo: Arc<MemoryRncRepository>) -> Arc<RncService> {
    Arc::new(RncService::new(
        repo,
        Arc::new(PhotoService::new(None)),
        Arc::new(NotificationService::new(None)),
    ))
}

pub fn test_session_service() -> Arc<SessionService> {
    Arc::new(SessionService::new(&AuthConfig {
        quality_password: TEST_PASSWORD.to_string(),
        token_secret: "test-token-secret".to_string(),
        token_ttl: Duration::from_secs(3600),
    }))
}

/// Pieces of the in-memory application exposed to router tests
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRncRepository>,
    pub storage: Arc<MemoryStorage>,
    pub mailer: Arc<RecordingMailer>,
}

/// Auth, RNC and CSV routes wired the way `main` wires them, over in-memory
/// stores. The mailer fails when `failing_mailer` is set.
pub fn test_app(failing_mailer: bool) -> TestApp {
    let repo = Arc::new(MemoryRncRepository::default());
    let storage = Arc::new(MemoryStorage::default());
    let mailer = Arc::new(if failing_mailer {
        RecordingMailer::failing()
    } else {
        RecordingMailer::default()
    });

    let rnc_service = Arc::new(RncService::new(
        repo.clone(),
        Arc::new(PhotoService::new(Some(storage.clone()))),
        Arc::new(NotificationService::new(Some(mailer.clone()))),
    ));
    let sessions = test_session_service();

    let router = Router::new()
        .merge(crate::features::auth::routes(sessions.clone()))
        .merge(crate::features::rncs::routes(rnc_service.clone()))
        .merge(crate::features::backups::routes(
            Arc::new(CsvExportService::new(repo.clone())),
            Arc::new(CsvImportService::new(rnc_service)),
        ))
        .layer(axum::middleware::from_fn_with_state(
            sessions,
            session_middleware,
        ));

    TestApp {
        router,
        repo,
        storage,
        mailer,
    }
}
