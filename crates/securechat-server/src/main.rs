mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::TimeDelta;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use securechat_api::auth::{AppState, AppStateInner};
use securechat_db::Database;
use securechat_stego::ContainerSelector;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "securechat_server=debug,securechat_api=debug,securechat_db=info,securechat_stego=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    if config.has_placeholder_secret() {
        warn!("SECURECHAT_JWT_SECRET is unset or a placeholder; tokens are forgeable");
    }
    if config.expose_otp {
        warn!("Demo mode: OTPs are returned in API responses");
    }

    // Init database
    let db = Database::open(&config.db_path)?;

    let stickers = ContainerSelector::new(&config.sticker_dir);
    info!(
        "Found {} stickers ready for random selection in {}",
        stickers.candidates().len(),
        config.sticker_dir.display()
    );

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        stickers,
        auto_delete: TimeDelta::seconds(config.auto_delete_secs),
        expose_otp: config.expose_otp,
    });

    let app = securechat_api::router(state)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("SecureChat server listening on {}", addr);
    info!("Messages auto-delete {}s after being armed", config.auto_delete_secs);

    let listener = tokio::net::TcpListener::bind(addr).await?;
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
                warn!("Failed to install SIGTERM handler: {}", e);
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
