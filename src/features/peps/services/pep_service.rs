use std::collections::BTreeSet;

use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::peps::models::Pep;
use crate::shared::delimited::{detect_delimiter, strip_bom};

/// Service for the PEP code catalog
pub struct PepService {
    pool: PgPool,
}

impl PepService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All codes in alphabetical order
    pub async fn list(&self) -> Result<Vec<Pep>> {
        sqlx::query_as::<_, Pep>("SELECT id, code, created_at FROM peps ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list PEPs: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Insert codes that are not in the catalog yet; returns how many were new
    pub async fn add_bulk(&self, codes: &[String]) -> Result<u64> {
        let codes = normalize_codes(codes);
        if codes.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO peps (code)
            SELECT UNNEST($1::text[])
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&codes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to add PEPs: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Added {} of {} PEP code(s)",
            result.rows_affected(),
            codes.len()
        );
        Ok(result.rows_affected())
    }

    /// Parse a CSV file and add its codes
    pub async fn import_csv(&self, data: &[u8]) -> Result<(u64, usize)> {
        let codes = codes_from_csv(data)?;
        let received = codes.len();
        let added = self.add_bulk(&codes).await?;
        Ok((added, received))
    }
}

/// Trimmed, non-blank, de-duplicated codes in sorted order
pub fn normalize_codes(codes: &[String]) -> Vec<String> {
    codes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Codes from the `code` column when the header has one, else the first column.
/// Without a `code` header the first line is treated as data.
pub fn codes_from_csv(data: &[u8]) -> Result<Vec<String>> {
    let data = strip_bom(data);
    let delimiter = detect_delimiter(data);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut records = reader.records();
    let mut codes = Vec::new();

    let first = match records.next() {
        Some(row) => row.map_err(|e| AppError::BadRequest(format!("Invalid CSV: {}", e)))?,
        None => return Ok(codes),
    };

    let code_column = first
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("code"));

    let column = match code_column {
        Some(index) => index,
        None => {
            if let Some(value) = first.get(0) {
                codes.push(value.to_string());
            }
            0
        }
    };

    for row in records {
        let row = row.map_err(|e| AppError::BadRequest(format!("Invalid CSV: {}", e)))?;
        if let Some(value) = row.get(column) {
            codes.push(value.to_string());
        }
    }

    Ok(normalize_codes(&codes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_codes() {
        let codes = vec![
            " PEP-002 ".to_string(),
            "".to_string(),
            "PEP-001".to_string(),
            "PEP-002".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(normalize_codes(&codes), vec!["PEP-001", "PEP-002"]);
    }

    #[test]
    fn test_csv_with_code_header() {
        let csv = "descricao;code\nLinha A;P-10\nLinha B;P-11\n";
        assert_eq!(codes_from_csv(csv.as_bytes()).unwrap(), vec!["P-10", "P-11"]);
    }

    #[test]
    fn test_csv_without_header_uses_first_column() {
        let csv = "P-01,obra norte\nP-02,obra sul\n\nP-01,repetido\n";
        assert_eq!(codes_from_csv(csv.as_bytes()).unwrap(), vec!["P-01", "P-02"]);
    }

    #[test]
    fn test_csv_with_bom() {
        let csv = "\u{feff}code\nX-1\n";
        assert_eq!(codes_from_csv(csv.as_bytes()).unwrap(), vec!["X-1"]);
    }

    #[test]
    fn test_empty_csv() {
        assert!(codes_from_csv(b"").unwrap().is_empty());
    }
}
