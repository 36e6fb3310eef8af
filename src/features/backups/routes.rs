use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::backups::handlers::{self, BackupState};
use crate::features::backups::services::{CsvExportService, CsvImportService};
use crate::shared::constants::MAX_CSV_SIZE;

/// CSV export (public) and import (quality session)
pub fn routes(
    export_service: Arc<CsvExportService>,
    import_service: Arc<CsvImportService>,
) -> Router {
    let state = BackupState {
        export_service,
        import_service,
    };

    Router::new()
        .route("/api/rncs/export.csv", get(handlers::export_csv))
        .route(
            "/api/rncs/import",
            post(handlers::import_csv).layer(DefaultBodyLimit::max(MAX_CSV_SIZE + 1024 * 1024)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::shared::delimited::UTF8_BOM;
    use crate::shared::test_helpers::{test_app, TEST_PASSWORD};

    async fn login(server: &TestServer) -> String {
        let body: Value = server
            .post("/api/auth/login")
            .json(&json!({ "password": TEST_PASSWORD }))
            .await
            .json();
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_export_has_one_row_per_record() {
        let app = test_app(false);
        let server = TestServer::new(app.router.clone()).unwrap();
        let token = login(&server).await;

        for title in ["Primeira", "Segunda", "Terceira"] {
            server
                .post("/api/rncs")
                .authorization_bearer(&token)
                .json(&json!({ "title": title }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server.get("/api/rncs/export.csv").await;
        response.assert_status_ok();
        let bytes = response.as_bytes().to_vec();
        assert!(bytes.starts_with(UTF8_BOM));

        let mut reader = csv::Reader::from_reader(&bytes[UTF8_BOM.len()..]);
        assert_eq!(reader.records().count(), 3);
    }

    #[tokio::test]
    async fn test_import_requires_session_and_inserts_rows() {
        let app = test_app(false);
        let server = TestServer::new(app.router.clone()).unwrap();

        let csv = "rnc_num;titulo;status\n2023-007;Importada;Encerrada\n;Sem número;\n";
        let form = || {
            MultipartForm::new().add_part(
                "file",
                Part::bytes(csv.as_bytes().to_vec())
                    .file_name("backup.csv")
                    .mime_type("text/csv"),
            )
        };

        server
            .post("/api/rncs/import")
            .multipart(form())
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let token = login(&server).await;
        let response = server
            .post("/api/rncs/import")
            .authorization_bearer(&token)
            .multipart(form())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["inserted"], 2);
        assert_eq!(body["data"]["auto_numbered"], 1);

        let list: Value = server.get("/api/rncs?search=2023-007").await.json();
        assert_eq!(list["data"][0]["status"], "closed");
    }
}
