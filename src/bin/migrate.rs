use food_order_api::{config::AppConfig, db::create_orm_conn, migration::Migrator};
use sea_orm_migration::MigratorTrait;

/// Applies pending schema migrations and exits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;

    let pending = Migrator::get_pending_migrations(&orm).await?;
    if pending.is_empty() {
        tracing::info!("schema is up to date");
        return Ok(());
    }
    for migration in &pending {
        tracing::info!(name = migration.name(), "applying migration");
    }

    Migrator::up(&orm, None).await?;
    tracing::info!(applied = pending.len(), "migrations applied");
    Ok(())
}
