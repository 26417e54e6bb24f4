use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum_extra::extract::cookie::Key;
use tracing::{info, warn};

use warbler_api::auth::{AppState, AppStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warbler=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("WARBLER_DATABASE_PATH").unwrap_or_else(|_| "warbler.db".into());
    let static_dir = std::env::var("WARBLER_STATIC_DIR").unwrap_or_else(|_| "static".into());
    let host = std::env::var("WARBLER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("WARBLER_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Session cookies are signed with a key derived from the configured
    // secret. Without one, a fresh key is generated and every session
    // dies with the process.
    let cookie_key = match std::env::var("WARBLER_SECRET_KEY") {
        Ok(secret) if secret.len() >= 32 => Key::derive_from(secret.as_bytes()),
        Ok(_) => anyhow::bail!("WARBLER_SECRET_KEY must be at least 32 bytes"),
        Err(_) => {
            warn!("WARBLER_SECRET_KEY not set; sessions will not survive a restart");
            Key::generate()
        }
    };

    // Init database
    let db = warbler_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = AppState(Arc::new(AppStateInner { db, cookie_key }));

    let app = warbler_server::app(state, &PathBuf::from(static_dir));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Warbler server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
