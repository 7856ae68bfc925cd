//! Parsed dataset batches and membership edges

use serde::{Deserialize, Serialize};

use super::entity::{ConceptScheme, Member};
use super::relation::SemanticRelation;

/// Scheme membership edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InScheme {
    pub scheme_iri: String,
    pub member_iri: String,
}

impl InScheme {
    pub fn new(scheme_iri: impl Into<String>, member_iri: impl Into<String>) -> Self {
        Self {
            scheme_iri: scheme_iri.into(),
            member_iri: member_iri.into(),
        }
    }
}

/// Collection membership edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InCollection {
    pub collection_iri: String,
    pub member_iri: String,
}

impl InCollection {
    pub fn new(collection_iri: impl Into<String>, member_iri: impl Into<String>) -> Self {
        Self {
            collection_iri: collection_iri.into(),
            member_iri: member_iri.into(),
        }
    }
}

/// Everything extracted from one dataset file, before persistence
///
/// `concepts` only holds concept members and `collections` only holds
/// collection members.
#[derive(Debug, Clone, Default)]
pub struct ParsedDataset {
    pub concept_schemes: Vec<ConceptScheme>,
    pub concepts: Vec<Member>,
    pub collections: Vec<Member>,
    pub in_schemes: Vec<InScheme>,
    pub in_collections: Vec<InCollection>,
    pub semantic_relations: Vec<SemanticRelation>,
}

impl ParsedDataset {
    pub fn is_empty(&self) -> bool {
        self.concept_schemes.is_empty() && self.concepts.is_empty() && self.collections.is_empty()
    }

    /// IRIs a collection should contain: its captured member list followed
    /// by any extra in-collection edges, without duplicates
    pub fn collection_targets(&self, collection: &Member) -> Vec<String> {
        let mut targets: Vec<String> = Vec::new();
        let captured = collection
            .as_collection()
            .map(|c| c.member_iris.as_slice())
            .unwrap_or(&[]);
        let edges = self
            .in_collections
            .iter()
            .filter(|e| e.collection_iri == collection.iri)
            .map(|e| &e.member_iri);

        for iri in captured.iter().chain(edges) {
            if !targets.contains(iri) {
                targets.push(iri.clone());
            }
        }
        targets
    }
}

/// Row counts of the entity graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub concept_schemes: u64,
    pub concepts: u64,
    pub collections: u64,
    pub semantic_relations: u64,
    pub in_scheme: u64,
    pub in_collection: u64,
}
