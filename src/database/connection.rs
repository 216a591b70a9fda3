use crate::config::DatabaseConfig;
use crate::entities::{
    coupon_entity, coupon_usage_entity, linkedin_account_entity, payment_entity, plan_entity,
    scheduled_post_entity,
};
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut opts = ConnectOptions::new(config.url.clone());
    opts.max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let pool = Database::connect(opts).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// Builds every table straight from the entity definitions.
///
/// Production schemas come from the `migration` crate; this is for SQLite
/// databases (tests, local tooling) where the Postgres migrations don't apply.
pub async fn create_tables(pool: &DbPool) -> AppResult<()> {
    let backend = pool.get_database_backend();
    let schema = Schema::new(backend);

    let statements = [
        schema.create_table_from_entity(plan_entity::Entity),
        schema.create_table_from_entity(coupon_entity::Entity),
        schema.create_table_from_entity(payment_entity::Entity),
        schema.create_table_from_entity(coupon_usage_entity::Entity),
        schema.create_table_from_entity(linkedin_account_entity::Entity),
        schema.create_table_from_entity(scheduled_post_entity::Entity),
    ];

    for stmt in statements.iter() {
        pool.execute(backend.build(stmt)).await?;
    }

    Ok(())
}
