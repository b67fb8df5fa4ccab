use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use multishop::entities::{primary_setup, setup_schema};
use multishop::{create_api_router, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(Config::from_env()?);

    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;
    setup_schema(&db).await?;

    let shared_db = Arc::new(db);
    primary_setup(&shared_db, &config).await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let app = create_api_router(shared_db, config.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "multishop listening");
    axum::serve(listener, app).await?;

    Ok(())
}
