use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use learning_portal::{
    api::{create_router, AppState},
    Config, Database, LearningService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    config.validate()?;

    // Initialize logging with console and rotating file output
    let _guard = setup_logging(&config)?;

    info!("Starting Learning Portal server...");

    // Initialize database
    let db = Database::new(&config.database.url).await?;
    info!("Database initialized successfully");

    // Initialize services
    let learning_service = LearningService::new(db);

    let state = AppState { learning_service };

    // Build the application router
    let app = create_router(state).layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    use std::fs;
    use tracing_subscriber::fmt;

    // Configure log level from environment variable
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    let console_layer = config.logging.console_enabled.then(|| {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
    });

    // File output without ANSI colors, rotated daily
    let (file_layer, guard) = if config.logging.file_enabled {
        fs::create_dir_all(&config.logging.log_directory).unwrap_or_else(|e| {
            eprintln!("Warning: Could not create logs directory: {}", e);
        });

        let file_appender =
            tracing_appender::rolling::daily(&config.logging.log_directory, "learning-portal.log");
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

        let layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(non_blocking_file);

        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if config.logging.file_enabled {
        info!(
            "Logging initialized - writing to {}/learning-portal.log with daily rotation",
            config.logging.log_directory
        );
    }

    Ok(guard)
}
