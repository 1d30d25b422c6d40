use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use haven::api::{create_router, AppState};
use haven::cache;
use haven::config::Config;
use haven::embeddings::{ApiConfig, EmbeddingApiClient};
use haven::llm::LlmProvider;
use haven::policy::KeywordPolicy;
use haven::search::QdrantClient;

#[derive(Parser)]
#[command(name = "haven")]
#[command(about = "Chat assistant for finding shelters in Dallas–Fort Worth")]
struct Args {
    /// Address to bind, overrides HAVEN_HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overrides HAVEN_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Initializing cache backend: {}...", config.cache.backend.as_str());
    let cache = cache::from_config(&config.cache)?;

    tracing::info!("Using embedding model: {}", config.embeddings.model);
    let embedder = EmbeddingApiClient::new(ApiConfig::from_embeddings_config(&config.embeddings))?;

    tracing::info!(
        "Using Qdrant collection '{}' at {}",
        config.vector_store.collection,
        config.vector_store.url
    );
    let index = QdrantClient::new(&config.vector_store)?;

    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::select(config.llm.as_ref(), config.llm_fallback.as_ref()).await;
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - chat requests will fail until one is configured");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::new(
        config,
        Arc::new(embedder),
        Arc::new(index),
        Arc::new(llm),
        cache,
        Arc::new(KeywordPolicy),
    );
    let app = create_router(state);

    tracing::info!("Haven starting on http://{}", addr);
    tracing::info!("  Chat endpoint: http://{}/api/chat", addr);
    tracing::info!("  Health check:  http://{}/api/health", addr);
    tracing::info!("  API docs:      http://{}/api/docs", addr);

    let cancel_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel_token.cancelled_owned())
        .await?;

    tracing::info!("Haven stopped");

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "haven=info,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
    cancel_token.cancel();
}
