//! Bookstore Server - book borrowing management
//!
//! A Rust REST API server for books, categories and borrowing requests.

use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookstore_server::{
    api,
    config::{AppConfig, LoggingConfig, StorageBackend},
    models::user::User,
    repository::{memory::MemoryStore, Repository},
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    init_tracing(&config.logging);

    tracing::info!("Starting Bookstore Server v{}", env!("CARGO_PKG_VERSION"));

    let repository = match config.database.backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .connect(&config.database.url)
                .await?;

            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations").run(&pool).await?;

            tracing::info!("Database migrations completed");

            Repository::new(pool)
        }
        StorageBackend::Memory => {
            tracing::warn!(
                "Using in-memory storage with {} seeded user(s); data is lost on restart",
                config.seed_users.len()
            );
            let users = config.seed_users.iter().map(|u| User {
                id: u.id,
                login: u.login.clone(),
                role: u.role,
            });
            Repository::in_memory(MemoryStore::with_users(users))
        }
    };

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let services = Services::new(repository, config.borrowing.clone());

    tracing::info!(
        "Borrowing transition policy: {:?}",
        config.borrowing.transition_policy
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Install the global subscriber, `pretty` or `json` per configuration
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bookstore_server={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
