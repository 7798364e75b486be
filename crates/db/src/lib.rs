use std::str::FromStr;

use sqlx::{
    Error, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::{info, warn};

pub mod models;

/// Tables the API cannot run without.
pub const REQUIRED_TABLES: &[&str] = &[
    "users",
    "clients",
    "trade_roles",
    "trade_persons",
    "trade_person_roles",
    "jobs",
    "job_requirements",
    "allocations",
    "notes",
];

#[derive(Clone)]
pub struct DBService {
    pub pool: SqlitePool,
}

impl DBService {
    /// Open (creating if needed) the database at `database_url` and run migrations.
    pub async fn new(database_url: &str) -> Result<DBService, Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::migrate(&pool).await?;
        Ok(DBService { pool })
    }

    /// A private in-memory database. Pinned to a single connection, since every
    /// new connection to `:memory:` would see an empty database.
    pub async fn new_in_memory() -> Result<DBService, Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::migrate(&pool).await?;
        Ok(DBService { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(pool).await?;
        Ok(())
    }

    /// Confirms the schema is in place, returning the names of any missing tables.
    pub async fn verify_schema(&self) -> Result<Vec<String>, Error> {
        let mut missing = Vec::new();
        for table in REQUIRED_TABLES {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&self.pool)
            .await?
                > 0;
            if !exists {
                missing.push(table.to_string());
            }
        }

        let applied = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        if missing.is_empty() {
            info!(migrations_applied = applied, "Database schema OK");
        } else {
            warn!(migrations_applied = applied, missing = ?missing, "Database schema incomplete");
        }
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_has_full_schema() {
        let db = DBService::new_in_memory().await.unwrap();
        let missing = db.verify_schema().await.unwrap();
        assert!(missing.is_empty(), "missing tables: {:?}", missing);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = DBService::new_in_memory().await.unwrap();
        let result = sqlx::query("INSERT INTO trade_persons (user_id) VALUES (999)")
            .execute(&db.pool)
            .await;
        let err = result.unwrap_err();
        let db_err = err.as_database_error().expect("database error");
        assert!(db_err.is_foreign_key_violation());
    }
}
