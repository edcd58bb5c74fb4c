mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::clients::{routes as clients_routes, ClientService};
use crate::features::dashboard::{routes as dashboard_routes, services::DashboardService};
use crate::features::pipeline::events;
use crate::features::pipeline::services::{
    Notifier, RouterService, StagingLoader, ValidationService,
};
use crate::features::pipeline::workers::PipelineWorker;
use crate::features::uploads::routes as uploads_routes;
use crate::features::uploads::services::{FileRecordService, IntakeService};
use crate::modules::storage::create_store;
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
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

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
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

    // Initialize object storage
    let store = create_store(&config.storage)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize object store: {}", e))?;
    tracing::info!(
        "Object store initialized (backend: {}, bucket: {})",
        config.storage.backend,
        config.storage.bucket
    );

    // Initialize services
    let client_service = Arc::new(ClientService::new(pool.clone()));
    let record_service = Arc::new(FileRecordService::new(pool.clone()));
    let dashboard_service = Arc::new(DashboardService::new(pool.clone()));
    tracing::info!("Client, file record and dashboard services initialized");

    // Pipeline event channel and stages
    let (pipeline_handle, event_rx) = events::channel(config.pipeline.event_buffer);

    let validation_service = Arc::new(ValidationService::new(
        Arc::clone(&record_service),
        Arc::clone(&store),
        config.pipeline.rules,
        config.pipeline.policy,
    ));
    let router_service = Arc::new(RouterService::new(
        Arc::clone(&record_service),
        Arc::clone(&store),
    ));
    let staging_loader = Arc::new(StagingLoader::new(
        pool.clone(),
        Arc::clone(&store),
        config.pipeline.rules,
        config.pipeline.policy,
    ));
    let notifier = Arc::new(Notifier::new(
        Arc::clone(&store),
        Arc::clone(&client_service),
    ));

    let worker = PipelineWorker::new(
        Arc::clone(&record_service),
        validation_service,
        router_service,
        staging_loader,
        notifier,
        config.pipeline.clone(),
        pipeline_handle.clone(),
    );
    tokio::spawn(async move {
        worker.run(event_rx).await;
    });
    tracing::info!("Pipeline worker spawned");

    let intake_service = Arc::new(IntakeService::new(
        Arc::clone(&client_service),
        Arc::clone(&record_service),
        Arc::clone(&store),
        pipeline_handle,
    ));
    tracing::info!("Intake service initialized");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

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

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // API routes; upload and query endpoints authenticate in-band
    let api_routes = Router::new()
        .merge(clients_routes::routes(Arc::clone(&client_service)))
        .merge(uploads_routes::routes(
            intake_service,
            Arc::clone(&record_service),
            Arc::clone(&client_service),
            config.app.max_request_body_size,
        ))
        .merge(dashboard_routes::routes(dashboard_service));

    // Operator endpoints share the basic-auth credentials with Swagger UI
    let api_routes = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Operator client management endpoints enabled");
        api_routes.merge(
            clients_routes::admin_routes(client_service).layer(from_fn(
                middleware::basic_auth_middleware(Arc::new(credentials)),
            )),
        )
    } else {
        tracing::info!("Operator client management endpoints disabled (no credentials configured)");
        api_routes
    };

    let app = Router::new()
        .merge(swagger)
        .merge(api_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

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
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

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
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
