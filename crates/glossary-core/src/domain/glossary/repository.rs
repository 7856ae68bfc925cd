//! Repository trait for entity graph persistence
//!
//! The trait abstracts over storage backends. Writes happen only through
//! [`GlossaryRepository::save_dataset`] and [`GlossaryRepository::reset`].

use async_trait::async_trait;

use crate::error::Result;

use super::dataset::{GraphStats, ParsedDataset};
use super::entity::{
    CollectionWithMembers, ConceptScheme, ConceptWithSchemes, Member, SchemeWithMembers,
};
use super::relation::SemanticRelation;

/// Summary of one successful `save_dataset` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub concept_schemes: usize,
    pub concepts: usize,
    pub collections: usize,
    pub semantic_relations: usize,
    pub in_scheme: usize,
    /// Collection edges inserted after member resolution
    pub in_collection: usize,
    /// Collection member IRIs that matched no stored member
    pub unresolved_members: usize,
}

/// Repository trait for the glossary entity graph
#[async_trait]
pub trait GlossaryRepository: Send + Sync {
    // ========== Write Operations ==========

    /// Persist one parsed dataset atomically, then resolve collection
    /// members against every stored member.
    ///
    /// Nothing is committed if any row violates a constraint.
    async fn save_dataset(&self, dataset: &ParsedDataset) -> Result<SaveSummary>;

    /// Drop and recreate the whole entity graph
    async fn reset(&self) -> Result<()>;

    // ========== Scheme Operations ==========

    /// List all concept schemes ordered by IRI
    async fn list_concept_schemes(&self) -> Result<Vec<ConceptScheme>>;

    /// Get a concept scheme with its members
    async fn get_concept_scheme(&self, iri: &str) -> Result<Option<SchemeWithMembers>>;

    // ========== Member Operations ==========

    /// Get a collection with its resolved members
    async fn get_collection(&self, iri: &str) -> Result<Option<CollectionWithMembers>>;

    /// Get a concept with the schemes that own it
    async fn get_concept(&self, iri: &str) -> Result<Option<ConceptWithSchemes>>;

    /// All edges where the concept is source or target
    async fn get_relations(&self, concept_iri: &str) -> Result<Vec<SemanticRelation>>;

    // ========== Search Operations ==========

    /// Substring search over prefLabel and altLabels with English fallback
    async fn search_concepts(
        &self,
        term: &str,
        lang: &str,
        case_sensitive: bool,
    ) -> Result<Vec<Member>>;

    // ========== Statistics ==========

    /// Row counts per graph table
    async fn stats(&self) -> Result<GraphStats>;
}
