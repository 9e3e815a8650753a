//! CLI subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

/// Database URL from `PROSTORE_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first so local runs pick up the same settings as the server.
fn database_url() -> Result<SecretString, String> {
    dotenvy::dotenv().ok();

    std::env::var("PROSTORE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "PROSTORE_DATABASE_URL not set".to_owned())
}

/// Connect using the storefront's pool settings.
async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let database_url = database_url()?;
    tracing::info!("Connecting to database...");
    let pool = prostore_storefront::db::create_pool(&database_url).await?;
    Ok(pool)
}
