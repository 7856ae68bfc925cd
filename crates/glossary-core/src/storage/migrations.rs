//! Database migrations
//!
//! This module manages the SQLite schema of the entity graph.
//! Migrations are versioned and applied automatically on database connection.
//!
//! Table and column names are read directly by external tooling and must
//! stay stable.

use sqlx::{Executor, SqliteConnection, SqlitePool};

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// Graph tables, children first
pub const GRAPH_TABLES: [&str; 7] = [
    "in_collection",
    "in_scheme",
    "semantic_relations",
    "concepts",
    "collections",
    "collection_members",
    "concept_schemes",
];

/// Drops every graph table in `GRAPH_TABLES` order
const DROP_GRAPH_TABLES: &str = r#"
    DROP TABLE IF EXISTS in_collection;
    DROP TABLE IF EXISTS in_scheme;
    DROP TABLE IF EXISTS semantic_relations;
    DROP TABLE IF EXISTS concepts;
    DROP TABLE IF EXISTS collections;
    DROP TABLE IF EXISTS collection_members;
    DROP TABLE IF EXISTS concept_schemes;
"#;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Entity graph
const MIGRATION_V1: &str = r#"
    -- Concept schemes
    CREATE TABLE IF NOT EXISTS concept_schemes (
        iri TEXT PRIMARY KEY NOT NULL,
        notation TEXT NOT NULL DEFAULT '',
        "scopeNote" TEXT NOT NULL DEFAULT '',
        "prefLabels" TEXT NOT NULL DEFAULT '{}'
    );

    -- Shared member table for concepts and collections
    CREATE TABLE IF NOT EXISTS collection_members (
        iri TEXT PRIMARY KEY NOT NULL,
        notation TEXT NOT NULL DEFAULT '',
        "prefLabels" TEXT NOT NULL DEFAULT '{}',
        member_type TEXT NOT NULL CHECK (member_type IN ('concept', 'collection'))
    );

    CREATE TABLE IF NOT EXISTS collections (
        iri TEXT PRIMARY KEY NOT NULL REFERENCES collection_members(iri) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS concepts (
        iri TEXT PRIMARY KEY NOT NULL REFERENCES collection_members(iri) ON DELETE CASCADE,
        identifier TEXT NOT NULL DEFAULT '',
        "altLabels" TEXT NOT NULL DEFAULT '{}',
        "scopeNotes" TEXT NOT NULL DEFAULT '{}'
    );

    -- Directed concept-to-concept edges
    CREATE TABLE IF NOT EXISTS semantic_relations (
        type TEXT NOT NULL CHECK (type IN (
            'broader', 'narrower', 'related', 'broaderTransitive', 'narrowerTransitive'
        )),
        source_concept_iri TEXT NOT NULL REFERENCES concepts(iri) ON DELETE CASCADE,
        target_concept_iri TEXT NOT NULL REFERENCES concepts(iri) ON DELETE CASCADE,
        PRIMARY KEY (type, source_concept_iri, target_concept_iri)
    );

    -- Membership associations
    CREATE TABLE IF NOT EXISTS in_scheme (
        scheme_iri TEXT NOT NULL REFERENCES concept_schemes(iri) ON DELETE CASCADE,
        member_iri TEXT NOT NULL REFERENCES collection_members(iri) ON DELETE CASCADE,
        PRIMARY KEY (scheme_iri, member_iri)
    );

    CREATE TABLE IF NOT EXISTS in_collection (
        collection_iri TEXT NOT NULL REFERENCES collections(iri) ON DELETE CASCADE,
        member_iri TEXT NOT NULL REFERENCES collection_members(iri) ON DELETE CASCADE,
        PRIMARY KEY (collection_iri, member_iri)
    );
"#;

/// Migration 2: Reverse lookup indexes
const MIGRATION_V2: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_in_scheme_member ON in_scheme(member_iri);
    CREATE INDEX IF NOT EXISTS idx_in_collection_member ON in_collection(member_iri);
    CREATE INDEX IF NOT EXISTS idx_semantic_relations_target
        ON semantic_relations(target_concept_iri);
    CREATE INDEX IF NOT EXISTS idx_collection_members_type ON collection_members(member_type);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    // Ensure migrations table exists
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let row: Option<(Option<i32>,)> = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|(v,)| v).unwrap_or(0))
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Entity graph");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Reverse lookup indexes");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Drop every graph table and create them again on `conn`
///
/// Run inside a transaction so the graph is never left half-built.
pub async fn recreate_graph_schema(conn: &mut SqliteConnection) -> sqlx::Result<()> {
    Executor::execute(&mut *conn, DROP_GRAPH_TABLES).await?;
    Executor::execute(&mut *conn, MIGRATION_V1).await?;
    Executor::execute(&mut *conn, MIGRATION_V2).await?;
    Ok(())
}

/// Check if the database needs migrations
pub async fn needs_migration(pool: &SqlitePool) -> anyhow::Result<bool> {
    let current_version = get_current_version(pool).await?;
    Ok(current_version < CURRENT_VERSION)
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}
