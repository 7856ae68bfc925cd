//! Error types for the glossary

use thiserror::Error;

use crate::domain::glossary::EntityKind;

/// Result type alias using the glossary Error
pub type Result<T> = std::result::Result<T, Error>;

/// Glossary error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("{kind} {iri} not found.")]
    NotFound { kind: EntityKind, iri: String },

    // Acquisition errors (E100-E199)
    #[error("Network error: {0}. Check your internet connection.")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request to {url} failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Timed out after {secs} seconds fetching {url}")]
    FetchTimeout { url: String, secs: u64 },

    #[error("Dataset source not found: {0}")]
    SourceNotFound(String),

    // Parse errors (E200-E299)
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid dataset document: {0}")]
    InvalidDocument(String),

    #[error("Forbidden XML construct: {0}")]
    ForbiddenXml(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    // Auth errors (E500-E599)
    #[error("The API key is missing for: {0}.")]
    MissingApiKey(String),

    #[error("Invalid API Key")]
    InvalidApiKey,

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a typed not-found condition
    pub fn not_found(kind: EntityKind, iri: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            iri: iri.into(),
        }
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E001",
            Self::NetworkError(_) => "E100",
            Self::HttpStatus { .. } => "E101",
            Self::FetchTimeout { .. } => "E102",
            Self::SourceNotFound(_) => "E103",
            Self::Xml(_) => "E200",
            Self::InvalidDocument(_) => "E201",
            Self::ForbiddenXml(_) => "E202",
            Self::DatabaseError(_) => "E400",
            Self::CorruptRow { .. } => "E401",
            Self::MissingApiKey(_) => "E500",
            Self::InvalidApiKey => "E501",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Json(_) => "E801",
            Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound {
                kind: EntityKind::ConceptScheme,
                ..
            } => Some("glossary schemes".to_string()),
            Self::NotFound { .. } => Some("glossary search <term>".to_string()),
            Self::NetworkError(_) | Self::FetchTimeout { .. } => {
                Some("Check internet connection".to_string())
            }
            Self::MissingApiKey(_) | Self::InvalidApiKey => {
                Some("Set the GLOSSARY_API_KEY environment variable".to_string())
            }
            Self::DatabaseError(_) => Some("glossary doctor".to_string()),
            _ => None,
        }
    }

    /// Whether this is the typed not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
