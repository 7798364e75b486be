//! Load the demo company into the configured database.

use chrono::Utc;
use db::DBService;
use server::config::ServerConfig;
use services::services::{auth::AuthService, seed};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let db = DBService::new(&config.database_url).await?;
    let auth = AuthService::new(&config.jwt_secret, config.jwt_expiry_hours, config.bcrypt_cost);

    info!(database = %config.database_url, "Seeding database");
    let summary = seed::seed(&db.pool, &auth, Utc::now().date_naive()).await?;
    info!(?summary, "Seeding completed; every account uses password {}", seed::SEED_PASSWORD);
    Ok(())
}
