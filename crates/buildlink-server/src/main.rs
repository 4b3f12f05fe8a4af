mod config;

use tracing::{error, info};

use buildlink_ai::GeminiClient;
use buildlink_api::{AppStateInner, router};
use buildlink_core::Portal;
use buildlink_db::Database;
use buildlink_gateway::Dispatcher;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buildlink=debug,tower_http=debug".into()),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("FATAL: {:#}. Fix your environment or .env file and restart.", e);
            std::process::exit(1);
        }
    };

    let db = Database::open(&config.db_path)?;
    let portal = Portal::open(db)?;

    let mut ai = GeminiClient::new(config.api_key.clone());
    if let Some(base_url) = &config.ai_base_url {
        ai = ai.with_base_url(base_url.as_str());
    }

    if config.admin_token.is_none() {
        info!("BUILDLINK_ADMIN_TOKEN not set, admin routes disabled");
    }

    let state = AppStateInner::new(
        portal,
        config.jwt_secret.clone(),
        config.admin_token.clone(),
        ai,
        Dispatcher::new(),
    );
    let app = router(state);

    info!("BuildLink server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
