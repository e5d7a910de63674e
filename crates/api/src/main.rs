use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use synthgen_api::config::{ProviderConfig, ServerConfig};
use synthgen_api::router::build_app_router;
use synthgen_api::state::AppState;
use synthgen_pipeline::{Orchestrator, SessionRegistry, UploadRelay};
use synthgen_providers::gemini::DEFAULT_GEMINI_BASE_URL;
use synthgen_providers::openai::DEFAULT_OPENAI_BASE_URL;
use synthgen_providers::{GeminiTextClient, OpenAiImageClient, S3ObjectStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often idle sessions are swept.
const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "synthgen_api=debug,synthgen_pipeline=debug,synthgen_providers=debug,tower_http=debug"
            .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let providers = ProviderConfig::from_env();
    tracing::info!(
        text_model = %providers.gemini_model,
        image_model = %providers.openai_image_model,
        image_concurrency = providers.image_concurrency,
        batch_policy = providers.batch_policy.name(),
        bucket = %providers.storage_bucket,
        "Loaded provider configuration"
    );

    // --- Provider clients ---
    let http = reqwest::Client::new();
    let text = GeminiTextClient::with_client(
        http.clone(),
        providers
            .gemini_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
        providers.gemini_api_key.clone(),
        providers.gemini_model.clone(),
    );
    let images = OpenAiImageClient::with_client(
        http,
        providers
            .openai_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
        providers.openai_api_key.clone(),
    );
    let store = S3ObjectStore::from_env(
        providers.storage_bucket.clone(),
        providers.storage_public_url.clone(),
    )
    .await;
    tracing::info!("Provider clients created");

    let orchestrator = Orchestrator::new(
        Arc::new(text),
        Arc::new(images),
        providers.openai_image_model.clone(),
    )
    .with_concurrency(providers.image_concurrency)
    .expect("IMAGE_CONCURRENCY out of range")
    .with_policy(providers.batch_policy);

    let relay = UploadRelay::new(Arc::new(store))
        .with_max_concurrent(providers.max_concurrent_uploads)
        .expect("MAX_CONCURRENT_UPLOADS out of range")
        .with_category(providers.storage_prefix.clone())
        .with_max_bytes(providers.max_upload_bytes);

    // --- App state ---
    let sessions = Arc::new(SessionRegistry::new());
    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::clone(&sessions),
        orchestrator: Arc::new(orchestrator),
        relay: Arc::new(relay),
    };

    // --- Idle session sweeper ---
    let max_idle = chrono::Duration::minutes(config.session_idle_minutes);
    let prune_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            sessions.prune_idle(max_idle).await;
        }
    });

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    prune_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Resolves on SIGINT, or SIGTERM on unix. In-flight generations keep
/// running until the server has drained.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    // A failed Ctrl-C registration disables that branch instead of exiting.
    let signal = tokio::select! {
        Ok(()) = tokio::signal::ctrl_c() => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Draining in-flight requests before shutdown");
}
