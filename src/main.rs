use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use messagely::{
    api::{create_router, AppState},
    config::Config,
    db,
    error::AppError,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,messagely=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting messagely server v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded (hash work factor {})", config.hash_work_factor);

    // Connect and migrate
    let pool = db::connect(&config).await?;
    tracing::info!("✅ Database ready: {}", config.database_url);

    // Create shared application state
    let state = AppState::new(pool, config.clone())?;

    // Build router
    let app = create_router(state);

    // Bind and serve
    let addr = config.server_address();
    tracing::info!("🌐 Server listening on http://{}", addr);
    tracing::info!("");
    tracing::info!("📚 API Endpoints:");
    tracing::info!("  POST /auth/register           - Register new user");
    tracing::info!("  POST /auth/login              - Login with username/password");
    tracing::info!("  GET  /users                   - List users (requires auth)");
    tracing::info!("  GET  /users/:username         - User profile (requires auth)");
    tracing::info!("  GET  /users/:username/from    - Sent messages (requires auth)");
    tracing::info!("  GET  /users/:username/to      - Received messages (requires auth)");
    tracing::info!("");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
