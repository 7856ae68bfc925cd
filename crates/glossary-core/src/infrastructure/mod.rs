//! Infrastructure layer
//!
//! Contains implementations for external systems: the SQLite repository and
//! the dataset fetcher.

pub mod glossary;
pub mod source;
