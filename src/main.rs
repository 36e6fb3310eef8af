mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth::{routes as auth_routes, SessionService};
use crate::features::backups::{routes as backups_routes, CsvExportService, CsvImportService};
use crate::features::notifications::NotificationService;
use crate::features::pdf_reports::{routes as pdf_routes, PdfReportService};
use crate::features::peps::{routes as peps_routes, PepService};
use crate::features::rncs::{
    routes as rncs_routes, PgRncRepository, PhotoService, RncRepository, RncService,
};
use crate::features::settings::{routes as settings_routes, SettingsService};
use crate::modules::mailer::{Mailer, SmtpMailer};
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run migrations automatically
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Session tokens for the quality team
    let session_service = Arc::new(SessionService::new(&config.auth));
    tracing::info!("Session service initialized");

    // Photo storage is optional; uploads answer 503 without it
    let storage = modules::storage::connect(&config.storage)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize photo storage: {}", e))?;
    match &storage {
        Some(s) => tracing::info!("Photo storage ready (bucket: {})", s.bucket_name()),
        None => tracing::warn!("Photo storage not configured, photo uploads are disabled"),
    }
    let photo_service = Arc::new(PhotoService::new(storage));

    // Email notifications are optional as well
    let mailer: Option<Arc<dyn Mailer>> = match &config.smtp {
        Some(smtp) => {
            let mailer = SmtpMailer::new(smtp)
                .map_err(|e| anyhow::anyhow!("Failed to initialize SMTP mailer: {}", e))?;
            tracing::info!("Email notifications enabled via {}:{}", smtp.host, smtp.port);
            Some(Arc::new(mailer))
        }
        None => {
            tracing::info!("Email notifications disabled (SMTP not configured)");
            None
        }
    };
    let notification_service = Arc::new(NotificationService::new(mailer));

    // RNC records
    let rnc_repository: Arc<dyn RncRepository> = Arc::new(PgRncRepository::new(pool.clone()));
    let rnc_service = Arc::new(RncService::new(
        Arc::clone(&rnc_repository),
        Arc::clone(&photo_service),
        Arc::clone(&notification_service),
    ));
    tracing::info!("RNC service initialized");

    let settings_service = Arc::new(SettingsService::new(pool.clone()));
    let pep_service = Arc::new(PepService::new(pool.clone()));

    let report_service = Arc::new(
        PdfReportService::new(Arc::clone(&rnc_service), config.report.photo_fetch_timeout)
            .map_err(|e| anyhow::anyhow!("Failed to initialize PDF reports: {}", e))?,
    );
    let export_service = Arc::new(CsvExportService::new(Arc::clone(&rnc_repository)));
    let import_service = Arc::new(CsvImportService::new(Arc::clone(&rnc_service)));
    tracing::info!("Report, backup, PEP and settings services initialized");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Reads are public; mutating handlers demand the session the middleware resolves
    let api_routes = Router::new()
        .merge(auth_routes(Arc::clone(&session_service)))
        .merge(rncs_routes(Arc::clone(&rnc_service)))
        .merge(pdf_routes(report_service, Arc::clone(&settings_service)))
        .merge(backups_routes(export_service, import_service))
        .merge(peps_routes(pep_service))
        .merge(settings_routes(settings_service))
        .layer(axum::middleware::from_fn_with_state(
            session_service,
            middleware::session_middleware,
        ));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(api_routes)
        .merge(health_route)
        .layer(
            ServiceBuilder::new()
                // Generate X-Request-Id using UUID v7 (or use client-provided one)
                .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(middleware::MakeSpanWithRequestId)
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                // Propagate X-Request-Id to response headers
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::cors_layer(
                    config.app.cors_allowed_origins.clone(),
                )),
        );

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
