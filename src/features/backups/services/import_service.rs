use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::core::error::{AppError, Result};
use crate::features::backups::dtos::ImportResultDto;
use crate::features::rncs::models::{LifecycleHistory, NewRnc, RncStatus};
use crate::features::rncs::RncService;
use crate::shared::delimited::{detect_delimiter, strip_bom};

/// Columns understood on import; anything else (including `id`) is ignored
const IMPORT_COLUMNS: &[&str] = &[
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
    "responsavel_acao",
    "status",
    "encerrada_em",
    "encerrada_por",
    "encerramento_obs",
    "encerramento_desc",
    "eficacia",
    "reaberta_em",
    "reaberta_por",
    "reabertura_motivo",
    "reabertura_desc",
    "cancelada_em",
    "cancelada_por",
    "cancelamento_motivo",
];

/// One CSV row mapped onto a new record
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub rnc_number: Option<String>,
    pub data: NewRnc,
}

/// Restores RNCs from a CSV produced by the export (or a hand-made sheet)
pub struct CsvImportService {
    rnc_service: Arc<RncService>,
}

impl CsvImportService {
    pub fn new(rnc_service: Arc<RncService>) -> Self {
        Self { rnc_service }
    }

    pub async fn import(&self, data: &[u8]) -> Result<ImportResultDto> {
        let (rows, skipped) = parse_rows(data)?;
        let mut result = ImportResultDto {
            skipped,
            ..Default::default()
        };

        let total = rows.len();
        for row in rows {
            let (_, auto_numbered) = self
                .rnc_service
                .import(row.data, row.rnc_number.as_deref())
                .await
                .inspect_err(|e| {
                    tracing::error!(
                        "CSV import stopped after {} of {} row(s): {}",
                        result.inserted,
                        total,
                        e
                    );
                })?;

            result.inserted += 1;
            if auto_numbered {
                result.auto_numbered += 1;
            }
        }

        tracing::info!(
            "CSV import: {} inserted, {} auto-numbered, {} skipped",
            result.inserted,
            result.auto_numbered,
            result.skipped
        );
        Ok(result)
    }
}

/// Accepts `2026-03-01`, `2026-03-01 10:00:00`, `2026-03-01T10:00:00Z` and `01/03/2026`
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(value, "%d/%m/%Y").ok())
}

/// Accepts the export's `2026-03-01 10:22:00` (UTC), RFC 3339 or a bare date at midnight
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|t| t.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .map(|t| t.with_timezone(&Utc))
                .ok()
        })
        .or_else(|| parse_date(value).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|t| t.and_utc()))
}

/// Parse rows and count the ones carrying no usable value
pub fn parse_rows(data: &[u8]) -> Result<(Vec<ImportRow>, usize)> {
    let data = strip_bom(data);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(data))
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("Invalid CSV header: {}", e)))?
        .clone();

    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            IMPORT_COLUMNS
                .iter()
                .find(|known| known.eq_ignore_ascii_case(name.trim()))
                .map(|known| (*known, index))
        })
        .collect();

    if columns.is_empty() {
        return Err(AppError::BadRequest(format!(
            "CSV has no recognised columns. Expected some of: {}",
            IMPORT_COLUMNS.join(", ")
        )));
    }

    let mut rows = Vec::new();
    let mut skipped = 0;

    for record in reader.records() {
        let record = record.map_err(|e| AppError::BadRequest(format!("Invalid CSV row: {}", e)))?;
        let get = |name: &str| -> String {
            columns
                .get(name)
                .and_then(|index| record.get(*index))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        let is_blank = columns
            .values()
            .all(|index| record.get(*index).map_or(true, |v| v.trim().is_empty()));
        if is_blank {
            skipped += 1;
            continue;
        }

        let optional = |name: &str| Some(get(name)).filter(|v| !v.is_empty());

        let rnc_number = optional("rnc_num");
        let status = RncStatus::parse(&get("status")).unwrap_or(RncStatus::Open);

        rows.push(ImportRow {
            rnc_number,
            data: NewRnc {
                inspection_date: parse_date(&get("data")),
                issuer: get("emitente"),
                area: get("area"),
                pep: get("pep"),
                title: get("titulo"),
                responsible: get("responsavel"),
                description: get("descricao"),
                reference_docs: get("referencias"),
                cause: get("causador"),
                process: get("processo_envolvido"),
                origin: get("origem"),
                severity: get("severidade"),
                category: get("categoria"),
                actions: get("acoes"),
                action_responsible: get("responsavel_acao"),
                status: Some(status),
                history: LifecycleHistory {
                    closed_at: parse_timestamp(&get("encerrada_em")),
                    closed_by: optional("encerrada_por"),
                    closing_notes: optional("encerramento_obs"),
                    closing_description: optional("encerramento_desc"),
                    effectiveness: optional("eficacia"),
                    reopened_at: parse_timestamp(&get("reaberta_em")),
                    reopened_by: optional("reaberta_por"),
                    reopening_reason: optional("reabertura_motivo"),
                    reopening_description: optional("reabertura_desc"),
                    cancelled_at: parse_timestamp(&get("cancelada_em")),
                    cancelled_by: optional("cancelada_por"),
                    cancellation_reason: optional("cancelamento_motivo"),
                },
            },
        });
    }

    Ok((rows, skipped))
}
