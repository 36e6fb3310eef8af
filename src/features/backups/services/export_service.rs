use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::rncs::models::{Photo, Rnc};
use crate::features::rncs::repositories::RncRepository;
use crate::shared::delimited::UTF8_BOM;

pub const EXPORT_FILENAME: &str = "rnc_export.csv";

/// Header row, in output order
pub const EXPORT_COLUMNS: &[&str] = &[
    "id",
    "data",
    "rnc_num",
    "emitente",
    "area",
    "pep",
    "titulo",
    "responsavel",
    "descricao",
    "referencias",
    "causador",
    "processo_envolvido",
    "origem",
    "severidade",
    "categoria",
    "acoes",
    "status",
    "encerrada_em",
    "encerrada_por",
    "encerramento_obs",
    "encerramento_desc",
    "eficacia",
    "responsavel_acao",
    "reaberta_em",
    "reaberta_por",
    "reabertura_motivo",
    "reabertura_desc",
    "cancelada_em",
    "cancelada_por",
    "cancelamento_motivo",
    "criada_em",
    "fotos",
];

const PHOTO_SEPARATOR: &str = " | ";

/// Full CSV snapshot of every RNC, usable as a manual backup
pub struct CsvExportService {
    repo: Arc<dyn RncRepository>,
}

fn date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

impl CsvExportService {
    pub fn new(repo: Arc<dyn RncRepository>) -> Self {
        Self { repo }
    }

    pub async fn export(&self) -> Result<Vec<u8>> {
        let rncs = self.repo.list_all().await?;
        let photos = self.repo.list_all_photos().await?;

        let bytes = write_csv(&rncs, &photos)?;
        tracing::info!("Exported {} RNC(s) to CSV", rncs.len());
        Ok(bytes)
    }
}

/// Rows keep the order of `rncs`; photo URLs keep the order of `photos`
pub fn write_csv(rncs: &[Rnc], photos: &[Photo]) -> Result<Vec<u8>> {
    let mut urls: HashMap<Uuid, Vec<&str>> = HashMap::new();
    for photo in photos {
        urls.entry(photo.rnc_id).or_default().push(photo.url.as_str());
    }

    let mut writer = csv::WriterBuilder::new().from_writer(UTF8_BOM.to_vec());
    let csv_error = |e: csv::Error| AppError::Internal(format!("Failed to write CSV: {}", e));

    writer.write_record(EXPORT_COLUMNS).map_err(csv_error)?;

    for r in rncs {
        let id = r.id.to_string();
        let fotos = urls
            .get(&r.id)
            .map(|u| u.join(PHOTO_SEPARATOR))
            .unwrap_or_default();

        let row: [&str; 32] = [
            &id,
            &date(r.inspection_date),
            &r.rnc_number,
            &r.issuer,
            &r.area,
            &r.pep,
            &r.title,
            &r.responsible,
            &r.description,
            &r.reference_docs,
            &r.cause,
            &r.process,
            &r.origin,
            &r.severity,
            &r.category,
            &r.actions,
            r.status.label(),
            &timestamp(r.closed_at),
            text(&r.closed_by),
            text(&r.closing_notes),
            text(&r.closing_description),
            text(&r.effectiveness),
            &r.action_responsible,
            &timestamp(r.reopened_at),
            text(&r.reopened_by),
            text(&r.reopening_reason),
            text(&r.reopening_description),
            &timestamp(r.cancelled_at),
            text(&r.cancelled_by),
            text(&r.cancellation_reason),
            &timestamp(Some(r.created_at)),
            &fotos,
        ];
        writer.write_record(row).map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to finish CSV: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::rncs::models::{PhotoStage, RncStatus};
    use crate::shared::test_helpers::{sample_photo, sample_rnc};

    fn parse(bytes: &[u8]) -> Vec<csv::StringRecord> {
        let body = bytes.strip_prefix(UTF8_BOM).unwrap();
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(body)
            .records()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_header_only_when_empty() {
        let bytes = write_csv(&[], &[]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let rows = parse(&bytes);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), EXPORT_COLUMNS.len());
        assert_eq!(&rows[0][0], "id");
        assert_eq!(&rows[0][31], "fotos");
    }

    #[test]
    fn test_one_row_per_record_with_photos_joined() {
        let mut first = sample_rnc("2026-002");
        first.status = RncStatus::Closed;
        first.closed_by = Some("Ana".to_string());
        first.title = "Solda, com vírgula".to_string();
        let second = sample_rnc("2026-001");

        let photos = vec![
            sample_photo(first.id, PhotoStage::Opening, 1, "a.jpg"),
            sample_photo(second.id, PhotoStage::Opening, 2, "b.jpg"),
            sample_photo(first.id, PhotoStage::Closing, 3, "c.jpg"),
        ];

        let bytes = write_csv(&[first.clone(), second.clone()], &photos).unwrap();
        let rows = parse(&bytes);

        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[1][2], "2026-002");
        assert_eq!(&rows[1][6], "Solda, com vírgula");
        assert_eq!(&rows[1][16], "Encerrada");
        assert_eq!(&rows[1][18], "Ana");
        assert_eq!(
            &rows[1][31],
            format!("{} | {}", photos[0].url, photos[2].url)
        );
        assert_eq!(&rows[2][2], "2026-001");
        assert_eq!(&rows[2][31], photos[1].url.as_str());
    }
}
