//! SQLite connection pool for the entity graph
//!
//! Opening a [`Database`] creates the file and its directory when missing,
//! turns on foreign keys for every pooled connection and, unless disabled,
//! brings the schema up to [`migrations::CURRENT_VERSION`].

use crate::storage::migrations;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    pub path: PathBuf,
    pub max_connections: u32,
    /// Apply pending migrations on open
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// A private in-memory graph; one connection so every query sees the same data
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            auto_migrate: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn no_migrate(mut self) -> Self {
        self.auto_migrate = false;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };
        Ok(options.foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().max_connections(self.max_connections);
        if self.is_in_memory() {
            // Closing the only connection would drop the whole graph
            options.idle_timeout(None).max_lifetime(None)
        } else {
            options
        }
    }
}

/// `<platform data dir>/glossary/glossary.db`
pub fn default_database_path() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("glossary").join("glossary.db"),
        None => PathBuf::from("glossary.db"),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory: {}", dir.display())),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl Database {
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        if !config.is_in_memory() {
            ensure_parent_dir(&config.path)?;
        }

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .with_context(|| format!("Failed to open database: {}", config.path.display()))?;

        let db = Self { pool, config };
        if db.config.auto_migrate {
            db.migrate().await?;
        }

        tracing::debug!(path = %db.config.path.display(), "Database opened");
        Ok(db)
    }

    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub async fn migrate(&self) -> Result<()> {
        migrations::run_migrations(&self.pool)
            .await
            .context("Failed to run database migrations")
    }

    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool)
            .await
            .context("Failed to check migration status")
    }

    /// Round-trip a trivial query through the pool
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::in_memory().await.expect("Failed to create in-memory database");

        db.health_check().await.expect("Health check failed");

        let status = db.migration_status().await.expect("Failed to get migration status");
        assert!(!status.needs_migration);
    }

    #[tokio::test]
    async fn test_database_config_builder() {
        let config = DatabaseConfig::with_path("/tmp/test.db")
            .max_connections(10)
            .no_migrate();

        assert_eq!(config.path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.max_connections, 10);
        assert!(!config.auto_migrate);
    }

    #[test]
    fn test_in_memory_detection() {
        assert!(DatabaseConfig::in_memory().is_in_memory());
        assert_eq!(DatabaseConfig::in_memory().max_connections, 1);
        assert!(!DatabaseConfig::with_path("memory.db").is_in_memory());
    }

    #[tokio::test]
    async fn test_no_migrate_leaves_schema_empty() {
        let db = Database::new(DatabaseConfig::in_memory().no_migrate())
            .await
            .expect("Failed to open database");

        let status = db.migration_status().await.expect("Failed to get migration status");
        assert_eq!(status.current_version, 0);
        assert!(status.needs_migration);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("glossary.db");

        let db = Database::new(DatabaseConfig::with_path(&path))
            .await
            .expect("Failed to open file database");
        db.health_check().await.expect("Health check failed");
        assert_eq!(db.path(), path.as_path());
        assert!(path.exists());
        db.close().await;
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::in_memory().await.expect("Failed to create database");

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .expect("Failed to check foreign_keys pragma");

        assert_eq!(result.0, 1, "Foreign keys should be enabled");
    }

    #[tokio::test]
    async fn test_dangling_membership_rejected() {
        let db = Database::in_memory().await.expect("Failed to create database");

        let result = sqlx::query("INSERT INTO in_scheme (scheme_iri, member_iri) VALUES (?, ?)")
            .bind("missing-scheme")
            .bind("missing-member")
            .execute(db.pool())
            .await;

        assert!(result.is_err(), "Dangling edge should violate foreign keys");
    }

    #[tokio::test]
    async fn test_cascade_delete() {
        let db = Database::in_memory().await.expect("Failed to create database");

        sqlx::query("INSERT INTO concept_schemes (iri) VALUES (?)")
            .bind("s1")
            .execute(db.pool())
            .await
            .expect("Failed to insert scheme");
        sqlx::query("INSERT INTO collection_members (iri, member_type) VALUES (?, 'concept')")
            .bind("c1")
            .execute(db.pool())
            .await
            .expect("Failed to insert member");
        sqlx::query("INSERT INTO in_scheme (scheme_iri, member_iri) VALUES (?, ?)")
            .bind("s1")
            .bind("c1")
            .execute(db.pool())
            .await
            .expect("Failed to insert edge");

        sqlx::query("DELETE FROM concept_schemes WHERE iri = ?")
            .bind("s1")
            .execute(db.pool())
            .await
            .expect("Failed to delete scheme");

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM in_scheme")
            .fetch_one(db.pool())
            .await
            .expect("Failed to count edges");
        assert_eq!(count, 0, "Edge should be deleted via cascade");
    }
}
