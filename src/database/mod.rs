use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub mod navigation_records_repo;
pub mod notifications_repo;
pub mod pharmacy_profiles_repo;
pub mod prescriptions_repo;
pub mod subscriptions_repo;

pub async fn connect(database_url: &str) -> sqlx::Result<SqlitePool> {
    SqlitePoolOptions::new().connect(database_url).await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Single-connection in-memory database; every connection would otherwise see its own schema.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
