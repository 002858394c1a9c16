use crate::config::AppConfig;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
};
use std::time::Duration;
use tracing::info;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool using the application configuration.
pub async fn establish_connection(config: &AppConfig) -> Result<DbPool, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    info!("Database connection established");
    Ok(pool)
}

/// Creates any missing tables from the entity definitions.
///
/// Schema is derived from the entities themselves so the sqlite test harness
/// and `auto_migrate` deployments share one source of truth.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    macro_rules! create_table {
        ($entity:expr) => {{
            let mut statement = schema.create_table_from_entity($entity);
            statement.if_not_exists();
            db.execute(builder.build(&statement)).await?;
        }};
    }

    create_table!(crate::entities::customer::Entity);
    create_table!(crate::entities::product::Entity);
    create_table!(crate::entities::subscription_plan::Entity);
    create_table!(crate::entities::order::Entity);
    create_table!(crate::entities::order_item::Entity);

    info!("Database schema is up to date");
    Ok(())
}
