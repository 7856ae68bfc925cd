//! Glossary Core Library
//!
//! This crate provides the core functionality for the glossary, including:
//! - SKOS RDF/XML parsing (concept schemes, concepts, collections, relations)
//! - Storage of the entity graph (SQLite with versioned migrations)
//! - Dataset ingestion (HTTP/file fetching, download cache, per-dataset failures)
//! - Read-side queries with language-tagged label selection
//! - Configuration (TOML file plus environment-only API key)

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod skos;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::glossary::{
        DEFAULT_LANG, EntityKind, GlossaryRepository, GlossaryService, GraphGate,
    };
    pub use crate::domain::ingestion::{DatasetOrchestrator, DatasetSource, InitDatasetsReport};
    pub use crate::error::{Error, Result};
    pub use crate::infrastructure::glossary::SqliteGlossaryRepository;
    pub use crate::infrastructure::source::HttpSourceFetcher;
    pub use crate::storage::{Database, DatabaseConfig};
}
