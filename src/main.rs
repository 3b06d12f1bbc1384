use axum::http::HeaderValue;
use clap::{Parser, Subcommand};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use crud_backend::config::{config, AppConfig};
use crud_backend::database::{migrate, DatabaseManager};
use crud_backend::handlers::{self, Repositories};

#[derive(Parser)]
#[command(name = "crud-backend")]
#[command(about = "REST backend over PostgreSQL with client-supplied JSON filters")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Start the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Listen port, overrides PORT/API_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Create missing tables and exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, DB_*, etc.
    let _ = dotenvy::dotenv();

    let config = config();
    init_tracing(config);

    match Cli::parse().command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(config, port).await,
        Command::Migrate => {
            let pool = DatabaseManager::connect(&config.database).await?;
            migrate::run(&pool).await?;
            tracing::info!("Migration complete");
            Ok(())
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let default_level = if crud_backend::is_development!() { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::info!("Starting in {:?} mode", config.environment);
}

async fn serve(config: &AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    let mut app = handlers::router(Repositories::from_pool(pool.clone()));

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.api.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if allowed.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
