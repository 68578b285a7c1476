// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::Context;
use axum::http::HeaderName;
use server::config::{Config, SessionBackend};
use server::session::{MemorySessionStore, SessionStore, SqliteSessionStore};
use server::state::AppState;
use server::{database, routes};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting up the server...");

    let config = Config::from_env().context("Invalid configuration")?;

    let db_pool = match database::establish_connection_pool(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("Database connection was made successfully.");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect with the database: {:?}", e);
            std::process::exit(1);
        }
    };

    let sessions: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Sqlite => Arc::new(SqliteSessionStore::new(db_pool.clone())),
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
    };
    let state = AppState::new(db_pool, sessions);

    if let Some(admin) = &config.bootstrap_admin {
        state
            .accounts
            .ensure_admin(&admin.username, &admin.password)
            .await
            .context("Failed to bootstrap the admin account")?;
    }

    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("authorization"),
        ])
        .allow_origin(Any);

    let app = routes::create_router(state).layer(cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("The server listens on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
