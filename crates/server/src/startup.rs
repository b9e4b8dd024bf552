use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::info;

use common::Paginator;
use service::auth::{repo::seaorm::SeaOrmAuthRepository, AuthConfig, AuthService};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Assemble request state from validated config and an open connection.
///
/// Fails with `StartupError::InvalidConfig` when the page size is not positive.
pub fn build_state(cfg: &AppConfig, db: DatabaseConnection) -> Result<ServerState, StartupError> {
    let paginator = Paginator::new(cfg.posts.page_size)?;
    let repo = Arc::new(SeaOrmAuthRepository { db: db.clone() });
    let auth_cfg = AuthConfig {
        jwt_secret: cfg.auth.jwt_secret.clone(),
        password_algorithm: "argon2".into(),
        token_ttl_hours: cfg.auth.token_ttl_hours,
    };
    Ok(ServerState { db, auth: Arc::new(AuthService::new(repo, auth_cfg)), paginator })
}

pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl_c");
    }
    info!("shutdown signal received");
}

/// Connect, migrate, and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    models::db::migrate(&db).await?;

    let state = build_state(&cfg, db)?;
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, page_size = cfg.posts.page_size, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_page_size_stops_startup() -> anyhow::Result<()> {
        let db = models::db::connect_in_memory().await?;
        let mut cfg = AppConfig::default();
        cfg.posts.page_size = 0;
        assert!(matches!(build_state(&cfg, db), Err(StartupError::InvalidConfig(_))));
        Ok(())
    }
}
