use scf_mock_gateway::client::DashboardClient;
use scf_mock_gateway::config::Config;
use scf_mock_gateway::handlers::{build_router, AppState};
use scf_mock_gateway::router::{RequestRouter, RouterConfig};
use scf_mock_gateway::synthetic::MockCatalog;
use scf_mock_gateway::transport::HttpTransport;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the gateway.
///
/// Initializes tracing and configuration, loads the embedded templates and
/// fixtures, wires the request router to the real backend and serves the
/// dashboard API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scf_mock_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let transport = HttpTransport::new(&config.api_base_url, config.request_timeout())?;
    tracing::info!("Real backend: {}", transport.base_url());

    let catalog = MockCatalog::builtin(config.upload_max_bytes)?;
    tracing::info!(
        "Synthetic catalog loaded ({} entities)",
        catalog.analytics().list_entities().total
    );

    let router = RequestRouter::new(RouterConfig::from_config(&config), Arc::new(transport));
    if config.mock_enabled {
        tracing::info!("Mock path enabled, default delay {:?}", config.mock_delay());
    } else {
        tracing::warn!("Mock path disabled, every request goes to the real backend");
    }

    let app_state = Arc::new(AppState {
        client: DashboardClient::new(router, catalog),
        config: config.clone(),
    });
    let app = build_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
