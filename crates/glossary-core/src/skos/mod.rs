//! SKOS RDF/XML reading
//!
//! - `xml`: hardened, namespace-aware XML tree and generic extractors
//! - `parser`: SKOS vocabulary mapping onto the glossary entity graph

pub mod parser;
pub mod xml;

pub use parser::{parse_dataset, parse_dataset_bytes};
pub use xml::{XmlElement, parse_document};
