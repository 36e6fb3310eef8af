use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::rncs::handlers::{self, RncState};
use crate::features::rncs::services::RncService;
use crate::shared::constants::{MAX_PHOTOS_PER_UPLOAD, MAX_PHOTO_SIZE};

/// Create routes for the RNC feature
///
/// Reads are public; mutating handlers require a `QualitySession`.
pub fn routes(rnc_service: Arc<RncService>) -> Router {
    let state = RncState { rnc_service };

    Router::new()
        .route("/api/rncs/options", get(handlers::get_options))
        .route(
            "/api/rncs",
            get(handlers::list_rncs).post(handlers::create_rnc),
        )
        .route(
            "/api/rncs/{id}",
            get(handlers::get_rnc).delete(handlers::delete_rnc),
        )
        .route("/api/rncs/{id}/close", post(handlers::close_rnc))
        .route("/api/rncs/{id}/reopen", post(handlers::reopen_rnc))
        .route("/api/rncs/{id}/cancel", post(handlers::cancel_rnc))
        .route(
            "/api/rncs/{id}/photos",
            // Whole batch plus multipart overhead
            post(handlers::upload_photos).layer(DefaultBodyLimit::max(
                MAX_PHOTO_SIZE * MAX_PHOTOS_PER_UPLOAD + 1024 * 1024,
            )),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::shared::test_helpers::{png_bytes, test_app, TestApp, TEST_PASSWORD};

    fn server(app: &TestApp) -> TestServer {
        TestServer::new(app.router.clone()).unwrap()
    }

    async fn login(server: &TestServer) -> String {
        let response = server
            .post("/api/auth/login")
            .json(&json!({ "password": TEST_PASSWORD }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    async fn create(server: &TestServer, token: &str, title: &str) -> Value {
        let response = server
            .post("/api/rncs")
            .authorization_bearer(token)
            .json(&json!({ "title": title, "area": "Pintura", "severity": "Alta" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let app = test_app(false);
        let server = server(&app);

        server
            .post("/api/auth/login")
            .json(&json!({ "password": "errada" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_mutations_require_session() {
        let app = test_app(false);
        let server = server(&app);

        server
            .post("/api/rncs")
            .json(&json!({ "title": "Sem login" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .post("/api/rncs")
            .authorization_bearer("not-a-token")
            .json(&json!({ "title": "Token inválido" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        // Reads stay public
        server.get("/api/rncs").await.assert_status_ok();
        server.get("/api/rncs/options").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_open_close_reopen_over_http() {
        let app = test_app(false);
        let server = server(&app);
        let token = login(&server).await;

        let rnc = create(&server, &token, "Bolha na pintura").await;
        assert_eq!(rnc["status"], "open");
        assert_eq!(rnc["status_label"], "Aberta");
        let id = rnc["id"].as_str().unwrap().to_string();

        let response = server
            .post(&format!("/api/rncs/{}/close", id))
            .authorization_bearer(&token)
            .json(&json!({ "closed_by": "Ana", "effectiveness": "Eficaz" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], "closed");

        let response = server
            .post(&format!("/api/rncs/{}/reopen", id))
            .authorization_bearer(&token)
            .json(&json!({ "reopened_by": "Bruno", "reason": "Bolhas voltaram" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], "reopened");

        let detail: Value = server.get(&format!("/api/rncs/{}", id)).await.json();
        assert_eq!(detail["data"]["status"], "reopened");
        assert_eq!(detail["data"]["reopening_reason"], "Bolhas voltaram");
    }

    #[tokio::test]
    async fn test_disallowed_transition_is_conflict() {
        let app = test_app(false);
        let server = server(&app);
        let token = login(&server).await;

        let rnc = create(&server, &token, "Solda porosa").await;
        let id = rnc["id"].as_str().unwrap();

        server
            .post(&format!("/api/rncs/{}/reopen", id))
            .authorization_bearer(&token)
            .json(&json!({ "reopened_by": "Bruno", "reason": "?" }))
            .await
            .assert_status(StatusCode::CONFLICT);

        let detail: Value = server.get(&format!("/api/rncs/{}", id)).await.json();
        assert_eq!(detail["data"]["status"], "open");
    }

    #[tokio::test]
    async fn test_list_filters_and_counts() {
        let app = test_app(false);
        let server = server(&app);
        let token = login(&server).await;

        create(&server, &token, "Pintura descascada").await;
        create(&server, &token, "Solda trincada").await;
        create(&server, &token, "Solda sem penetração").await;

        let body: Value = server.get("/api/rncs?search=solda").await.json();
        assert_eq!(body["meta"]["total"], 2);
        // Newest first
        assert_eq!(body["data"][0]["title"], "Solda sem penetração");

        let body: Value = server
            .get("/api/rncs?status=closed")
            .await
            .json();
        assert_eq!(body["meta"]["total"], 0);
    }

    #[tokio::test]
    async fn test_photo_upload_links_urls() {
        let app = test_app(false);
        let server = server(&app);
        let token = login(&server).await;

        let rnc = create(&server, &token, "Chapa amassada").await;
        let id = rnc["id"].as_str().unwrap();

        let form = MultipartForm::new().add_text("stage", "opening").add_part(
            "file",
            Part::bytes(png_bytes())
                .file_name("amassado.png")
                .mime_type("image/png"),
        );
        server
            .post(&format!("/api/rncs/{}/photos", id))
            .authorization_bearer(&token)
            .multipart(form)
            .await
            .assert_status(StatusCode::CREATED);

        assert_eq!(app.storage.object_count(), 1);
        let detail: Value = server.get(&format!("/api/rncs/{}", id)).await.json();
        let opening = detail["data"]["photos"]["opening"].as_array().unwrap();
        assert_eq!(opening.len(), 1);
        assert!(opening[0]["url"]
            .as_str()
            .unwrap()
            .starts_with("https://storage.test/rnc-fotos/"));
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation_word() {
        let app = test_app(false);
        let server = server(&app);
        let token = login(&server).await;

        let rnc = create(&server, &token, "Duplicada").await;
        let path = format!("/api/rncs/{}", rnc["id"].as_str().unwrap());

        server
            .delete(&path)
            .authorization_bearer(&token)
            .json(&json!({ "confirmation": "ok" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .delete(&path)
            .authorization_bearer(&token)
            .json(&json!({ "confirmation": "CONFIRMAR" }))
            .await
            .assert_status_ok();

        server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_opening_sends_email() {
        let app = test_app(false);
        let server = server(&app);
        let token = login(&server).await;

        let rnc = create(&server, &token, "Vazamento de óleo").await;

        for _ in 0..50 {
            if !app.mailer.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0]
            .subject
            .contains(rnc["rnc_number"].as_str().unwrap()));
    }

    #[tokio::test]
    async fn test_failing_mailer_does_not_block_writes() {
        let app = test_app(true);
        let server = server(&app);
        let token = login(&server).await;

        let rnc = create(&server, &token, "Parafuso faltando").await;
        server
            .post(&format!("/api/rncs/{}/close", rnc["id"].as_str().unwrap()))
            .authorization_bearer(&token)
            .json(&json!({ "closed_by": "Ana" }))
            .await
            .assert_status_ok();
    }
}
