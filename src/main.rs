// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, num::NonZeroUsize, sync::Arc};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::memoizer::{Memoizer, PassThrough};
use crate::application::streaming_service::StreamingDashboardService;
use crate::application::transaction_source::TransactionSource;
use crate::domain::dataset::Dataset;
use crate::infrastructure::config::{load_app_config, load_widgets_config, DataSettings};
use crate::infrastructure::csv_source::CsvTransactionSource;
use crate::infrastructure::memo_cache::LruMemoizer;
use crate::infrastructure::synthetic_source::SyntheticTransactionSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_dashboard, get_filters, health_check, stream_dashboard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config()?;
    let widgets_config = load_widgets_config()?;

    // Load the dataset once; any failure here stops startup
    let source: Box<dyn TransactionSource> = match &app_config.data {
        DataSettings::Csv { path } => Box::new(CsvTransactionSource::new(path)),
        DataSettings::Synthetic { rows, seed } => Box::new(SyntheticTransactionSource::new(*rows, *seed)),
    };
    let dataset = match source.load().await.and_then(Dataset::new) {
        Ok(dataset) => Arc::new(dataset),
        Err(e) => {
            tracing::error!("Failed to load {}: {}", source.describe(), e);
            return Err(e.into());
        }
    };
    tracing::info!(
        "Loaded {} rows from {} ({} to {}, version {:x})",
        dataset.transactions().len(),
        source.describe(),
        dataset.min_date(),
        dataset.max_date(),
        dataset.version()
    );

    // Memoization; capacity 0 runs every request uncached
    let memoizer: Arc<dyn Memoizer> = match NonZeroUsize::new(app_config.cache.capacity) {
        Some(capacity) => Arc::new(LruMemoizer::new(capacity)),
        None => {
            tracing::info!("Memoization disabled");
            Arc::new(PassThrough)
        }
    };

    // Create services (application layer)
    let dashboard_service = DashboardService::new(
        dataset,
        memoizer,
        widgets_config,
        app_config.dashboard.clone(),
    );
    let streaming_service = StreamingDashboardService::new(dashboard_service.clone());

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service,
        streaming_service,
    });

    // Build router (presentation layer)
    // Responses are compressed by our own builders, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/filters", get(get_filters))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/stream", get(stream_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", app_config.server.host, app_config.server.port).parse()?;
    tracing::info!("Starting {} on {}", app_config.dashboard.title, addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
