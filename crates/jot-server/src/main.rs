use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use jot_api::AppStateInner;
use jot_api::token::TokenService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jot=debug,tower_http=debug".into()),
        )
        .init();

    // Config — read once here; nothing downstream touches the environment.
    // Rotating JOT_JWT_SECRET invalidates all outstanding tokens.
    let jwt_secret =
        std::env::var("JOT_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("JOT_DB_PATH").unwrap_or_else(|_| "jot.db".into());
    let host = std::env::var("JOT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("JOT_PORT")
        .unwrap_or_else(|_| "5000".into())
        .parse()?;

    // Init database
    let db = jot_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state: the signing secret lives only inside the TokenService
    let state = Arc::new(AppStateInner {
        db,
        tokens: TokenService::new(&jwt_secret),
    });

    let app = jot_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("jot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
