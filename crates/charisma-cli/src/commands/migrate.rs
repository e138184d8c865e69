//! Database migration management.

use anyhow::Context;

use charisma_core::config::AppConfig;
use charisma_database::DatabasePool;
use charisma_database::migration::run_migrations;

use crate::output;

/// Apply pending migrations to `database.url`.
pub async fn execute(config: &AppConfig) -> anyhow::Result<()> {
    println!("Running database migrations...");
    let pool = DatabasePool::connect(&config.database)
        .await
        .context("Database connection failed")?;
    run_migrations(pool.pool()).await.context("Migration failed")?;
    pool.close().await;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
