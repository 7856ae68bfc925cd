//! Domain layer
//!
//! Contains the entity graph model, its query service and the ingestion run.

pub mod glossary;
pub mod ingestion;
