//! Campus web server

use anyhow::Context;
use campus_api::{AppState, routes};
use campus_config::SiteConfig;
use campus_db::{create_pool, run_migrations};
use campus_storage::MediaLibrary;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var("CAMPUS_CONFIG").unwrap_or_else(|_| "campus.kdl".to_string());
    let config = SiteConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path))?;
    info!(site = %config.name, config = %config_path, "Configuration loaded");

    // Create database pool
    info!("Connecting to database...");
    let pool = create_pool(&config.database.url, config.database.max_connections).await?;
    run_migrations(&pool).await?;
    info!("Database connected");

    let store = campus_storage::from_settings(&config.storage).await?;
    info!(backend = store.name(), bucket = %config.storage.bucket, "Media storage ready");
    let media = MediaLibrary::new(
        store,
        config.storage.cdn_url.clone(),
        config.storage.max_upload_bytes,
    );

    if config.admin_token.is_none() {
        tracing::warn!("No admin token configured, the admin API is disabled");
    }

    let listen = config.server.listen.clone();
    let state = AppState::new(pool, config, media);

    // Build router
    let app = routes::router(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start server
    info!("Starting server on {}", listen);
    let listener = TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
