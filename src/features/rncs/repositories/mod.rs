//! Persistence seam for RNC records and their photo links
//!
//! Every mutation is written straight to Postgres; nothing is cached in
//! process memory, so a suspended and resumed host loses no data.

mod pg_rnc_repository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::rncs::models::{
    NewPhoto, NewRnc, Photo, Rnc, RncFilter, RncStatus, StatusChange,
};

pub use pg_rnc_repository::PgRncRepository;

#[async_trait]
pub trait RncRepository: Send + Sync {
    /// Highest sequence used by well-formed numbers of `year` (0 if none)
    async fn max_sequence_for_year(&self, year: i32) -> Result<i64>;

    /// Insert with the given number; `None` when the number is already taken
    async fn insert(&self, rnc_number: &str, data: &NewRnc) -> Result<Option<Rnc>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Rnc>>;

    /// Newest first, with the total count matching `filter`
    async fn list(&self, filter: &RncFilter, offset: i64, limit: i64) -> Result<(Vec<Rnc>, i64)>;

    /// Every record, newest first
    async fn list_all(&self) -> Result<Vec<Rnc>>;

    /// Apply `change` only while the record is still in `expected` status.
    /// `None` when the record is missing or its status moved on.
    async fn apply_change(
        &self,
        id: Uuid,
        expected: RncStatus,
        new_status: RncStatus,
        change: &StatusChange,
    ) -> Result<Option<Rnc>>;

    /// Link photos in one transaction, returned in upload order
    async fn insert_photos(&self, rnc_id: Uuid, photos: &[NewPhoto]) -> Result<Vec<Photo>>;

    /// Photos of one record in upload order
    async fn list_photos(&self, rnc_id: Uuid) -> Result<Vec<Photo>>;

    /// Every photo link, in upload order
    async fn list_all_photos(&self) -> Result<Vec<Photo>>;

    /// Remove a record and its photo links, returning the removed links.
    /// `None` when the record does not exist.
    async fn delete(&self, id: Uuid) -> Result<Option<Vec<Photo>>>;
}
