//! Corbel API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod redis_session_store;
mod state;

use corbel_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, SessionStoreConfig, init_tracing};
use crate::api_services::{
    build_app_state, build_postgres_session_layer, build_redis_client,
    build_redis_session_layer, connect_and_migrate,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url).await?;

    if config.migrate_only {
        info!("migrations applied successfully");
        return Ok(());
    }

    let app_state = build_app_state(pool.clone(), &config).await?;
    let router = match config.session_store {
        SessionStoreConfig::Postgres => {
            let session_layer = build_postgres_session_layer(pool, config.cookie_secure).await?;
            api_router::build_router(app_state, &config.frontend_url, session_layer)?
        }
        SessionStoreConfig::Redis => {
            let redis_url = config.redis_url.as_deref().ok_or_else(|| {
                AppError::Validation("REDIS_URL is required when SESSION_STORE=redis".to_owned())
            })?;
            let session_layer =
                build_redis_session_layer(build_redis_client(redis_url)?, config.cookie_secure);
            api_router::build_router(app_state, &config.frontend_url, session_layer)?
        }
    };

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "corbel api listening");
    axum::serve(listener, router)
        .await
        .map_err(|error| AppError::Internal(format!("api server failed: {error}")))
}
