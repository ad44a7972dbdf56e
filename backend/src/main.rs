use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;
mod error;
mod middleware;
mod pest;
mod routes;
mod state;
mod upload;


use config::Config;
use error::SagipResult;
use pest::postgres::PgPestStore;
use state::AppState;
use upload::UploadStore;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SAGIP backend...");

    if let Err(e) = run().await {
        tracing::error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> SagipResult<()> {
    let config = Config::load()?;

    let pool = db::init_pool_with_options(config.database.clone());
    db::init_database(&pool, &config.admin_email, &config.admin_password).await?;

    let uploads = UploadStore::new(&config.upload_dir);
    uploads.ensure_dirs().await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app_state = AppState {
        pool: pool.clone(),
        pests: Arc::new(PgPestStore::new(pool)),
        uploads,
        config: Arc::new(config),
    };
    let app = routes::create_router(app_state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
