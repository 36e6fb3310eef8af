use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::rncs::models::{
    NewPhoto, NewRnc, Photo, Rnc, RncFilter, RncStatus, StatusChange,
};
use crate::features::rncs::repositories::RncRepository;

const RNC_COLUMNS: &str = r#"
    id, rnc_number, inspection_date, issuer, area, pep, title, responsible,
    description, reference_docs, cause, process, origin, severity, category,
    actions, action_responsible, status,
    closed_at, closed_by, closing_notes, closing_description, effectiveness,
    reopened_at, reopened_by, reopening_reason, reopening_description,
    cancelled_at, cancelled_by, cancellation_reason,
    created_at, status_changed_at, updated_at
"#;

const PHOTO_COLUMNS: &str = r#"
    id, seq, rnc_id, stage, url, object_key, filename, content_type,
    file_size, sha256, created_at
"#;

const LIST_FILTER: &str = r#"
    WHERE ($1::rnc_status IS NULL OR status = $1)
      AND ($2::text IS NULL
           OR rnc_number ILIKE $2
           OR title ILIKE $2
           OR area ILIKE $2)
"#;

/// Postgres-backed RNC repository
pub struct PgRncRepository {
    pool: PgPool,
}

impl PgRncRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("{}: {:?}", context, e);
        AppError::Database(e)
    }
}

#[async_trait]
impl RncRepository for PgRncRepository {
    async fn max_sequence_for_year(&self, year: i32) -> Result<i64> {
        let pattern = format!("^{}-[0-9]{{3,9}}$", year);
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(MAX(CAST(SPLIT_PART(rnc_number, '-', 2) AS BIGINT)), 0)
            FROM rncs
            WHERE rnc_number ~ $1
            "#,
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to read RNC sequence"))
    }

    async fn insert(&self, rnc_number: &str, data: &NewRnc) -> Result<Option<Rnc>> {
        let sql = format!(
            r#"
            INSERT INTO rncs (
                rnc_number, inspection_date, issuer, area, pep, title, responsible,
                description, reference_docs, cause, process, origin, severity, category,
                actions, action_responsible, status,
                closed_at, closed_by, closing_notes, closing_description, effectiveness,
                reopened_at, reopened_by, reopening_reason, reopening_description,
                cancelled_at, cancelled_by, cancellation_reason
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29
            )
            ON CONFLICT (rnc_number) DO NOTHING
            RETURNING {RNC_COLUMNS}
            "#
        );
        let history = &data.history;

        sqlx::query_as::<_, Rnc>(&sql)
            .bind(rnc_number)
            .bind(data.inspection_date)
            .bind(&data.issuer)
            .bind(&data.area)
            .bind(&data.pep)
            .bind(&data.title)
            .bind(&data.responsible)
            .bind(&data.description)
            .bind(&data.reference_docs)
            .bind(&data.cause)
            .bind(&data.process)
            .bind(&data.origin)
            .bind(&data.severity)
            .bind(&data.category)
            .bind(&data.actions)
            .bind(&data.action_responsible)
            .bind(data.status.unwrap_or(RncStatus::Open))
            .bind(history.closed_at)
            .bind(&history.closed_by)
            .bind(&history.closing_notes)
            .bind(&history.closing_description)
            .bind(&history.effectiveness)
            .bind(history.reopened_at)
            .bind(&history.reopened_by)
            .bind(&history.reopening_reason)
            .bind(&history.reopening_description)
            .bind(history.cancelled_at)
            .bind(&history.cancelled_by)
            .bind(&history.cancellation_reason)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to insert RNC"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Rnc>> {
        let sql = format!("SELECT {RNC_COLUMNS} FROM rncs WHERE id = $1");
        sqlx::query_as::<_, Rnc>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get RNC"))
    }

    async fn list(&self, filter: &RncFilter, offset: i64, limit: i64) -> Result<(Vec<Rnc>, i64)> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM rncs {LIST_FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(filter.status)
            .bind(search.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count RNCs"))?;

        let list_sql = format!(
            r#"
            SELECT {RNC_COLUMNS} FROM rncs
            {LIST_FILTER}
            ORDER BY created_at DESC, rnc_number DESC
            OFFSET $3 LIMIT $4
            "#
        );
        let items = sqlx::query_as::<_, Rnc>(&list_sql)
            .bind(filter.status)
            .bind(search.as_deref())
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list RNCs"))?;

        Ok((items, total))
    }

    async fn list_all(&self) -> Result<Vec<Rnc>> {
        let sql = format!("SELECT {RNC_COLUMNS} FROM rncs ORDER BY created_at DESC, rnc_number DESC");
        sqlx::query_as::<_, Rnc>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list all RNCs"))
    }

    async fn apply_change(
        &self,
        id: Uuid,
        expected: RncStatus,
        new_status: RncStatus,
        change: &StatusChange,
    ) -> Result<Option<Rnc>> {
        let query = match change {
            StatusChange::Close(data) => {
                let sql = format!(
                    r#"
                    UPDATE rncs
                    SET status = $3, closed_at = NOW(), closed_by = $4, closing_notes = $5,
                        closing_description = $6, effectiveness = $7,
                        status_changed_at = NOW(), updated_at = NOW()
                    WHERE id = $1 AND status = $2
                    RETURNING {RNC_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, Rnc>(&sql)
                    .bind(id)
                    .bind(expected)
                    .bind(new_status)
                    .bind(data.closed_by.clone())
                    .bind(data.notes.clone())
                    .bind(data.description.clone())
                    .bind(data.effectiveness.clone())
                    .fetch_optional(&self.pool)
                    .await
            }
            StatusChange::Reopen(data) => {
                let sql = format!(
                    r#"
                    UPDATE rncs
                    SET status = $3, reopened_at = NOW(), reopened_by = $4,
                        reopening_reason = $5, reopening_description = $6,
                        status_changed_at = NOW(), updated_at = NOW()
                    WHERE id = $1 AND status = $2
                    RETURNING {RNC_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, Rnc>(&sql)
                    .bind(id)
                    .bind(expected)
                    .bind(new_status)
                    .bind(data.reopened_by.clone())
                    .bind(data.reason.clone())
                    .bind(data.description.clone())
                    .fetch_optional(&self.pool)
                    .await
            }
            StatusChange::Cancel(data) => {
                let sql = format!(
                    r#"
                    UPDATE rncs
                    SET status = $3, cancelled_at = NOW(), cancelled_by = $4,
                        cancellation_reason = $5,
                        status_changed_at = NOW(), updated_at = NOW()
                    WHERE id = $1 AND status = $2
                    RETURNING {RNC_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, Rnc>(&sql)
                    .bind(id)
                    .bind(expected)
                    .bind(new_status)
                    .bind(data.cancelled_by.clone())
                    .bind(data.reason.clone())
                    .fetch_optional(&self.pool)
                    .await
            }
        };

        query.map_err(db_error("Failed to update RNC status"))
    }

    async fn insert_photos(&self, rnc_id: Uuid, photos: &[NewPhoto]) -> Result<Vec<Photo>> {
        let sql = format!(
            r#"
            INSERT INTO rnc_photos (rnc_id, stage, url, object_key, filename, content_type, file_size, sha256)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PHOTO_COLUMNS}
            "#
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let mut inserted = Vec::with_capacity(photos.len());
        for photo in photos {
            let row = sqlx::query_as::<_, Photo>(&sql)
                .bind(rnc_id)
                .bind(photo.stage)
                .bind(&photo.url)
                .bind(&photo.object_key)
                .bind(&photo.filename)
                .bind(&photo.content_type)
                .bind(photo.file_size)
                .bind(&photo.sha256)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error("Failed to link photo"))?;
            inserted.push(row);
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit photo links"))?;

        Ok(inserted)
    }

    async fn list_photos(&self, rnc_id: Uuid) -> Result<Vec<Photo>> {
        let sql = format!("SELECT {PHOTO_COLUMNS} FROM rnc_photos WHERE rnc_id = $1 ORDER BY seq");
        sqlx::query_as::<_, Photo>(&sql)
            .bind(rnc_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list photos"))
    }

    async fn list_all_photos(&self) -> Result<Vec<Photo>> {
        let sql = format!("SELECT {PHOTO_COLUMNS} FROM rnc_photos ORDER BY seq");
        sqlx::query_as::<_, Photo>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list all photos"))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Vec<Photo>>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let photo_sql =
            format!("DELETE FROM rnc_photos WHERE rnc_id = $1 RETURNING {PHOTO_COLUMNS}");
        let mut photos = sqlx::query_as::<_, Photo>(&photo_sql)
            .bind(id)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error("Failed to delete photo links"))?;
        photos.sort_by_key(|p| p.seq);

        let deleted = sqlx::query_scalar::<_, Uuid>("DELETE FROM rncs WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to delete RNC"))?;

        if deleted.is_none() {
            tx.rollback()
                .await
                .map_err(db_error("Failed to roll back delete"))?;
            return Ok(None);
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit delete"))?;

        Ok(Some(photos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("TR-20"), "%TR-20%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
