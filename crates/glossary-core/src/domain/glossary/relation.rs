//! Semantic relations between concepts
//!
//! Relations are typed, directed edges. Their identity is the triple
//! (type, source, target); broader and narrower are never inverted
//! automatically.

use serde::{Deserialize, Serialize};

/// Type of semantic relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SemanticRelationType {
    #[serde(rename = "broader")]
    Broader,
    #[serde(rename = "narrower")]
    Narrower,
    #[serde(rename = "related")]
    Related,
    #[serde(rename = "broaderTransitive")]
    BroaderTransitive,
    #[serde(rename = "narrowerTransitive")]
    NarrowerTransitive,
}

impl SemanticRelationType {
    /// Every relation type, in the order their tags are read
    pub const ALL: [Self; 5] = [
        Self::Broader,
        Self::Narrower,
        Self::Related,
        Self::BroaderTransitive,
        Self::NarrowerTransitive,
    ];

    /// Stored value, identical to the SKOS local name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broader => "broader",
            Self::Narrower => "narrower",
            Self::Related => "related",
            Self::BroaderTransitive => "broaderTransitive",
            Self::NarrowerTransitive => "narrowerTransitive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for SemanticRelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed edge between two concepts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemanticRelation {
    #[serde(rename = "type")]
    pub relation_type: SemanticRelationType,
    pub source_concept_iri: String,
    pub target_concept_iri: String,
}

impl SemanticRelation {
    pub fn new(
        relation_type: SemanticRelationType,
        source_concept_iri: impl Into<String>,
        target_concept_iri: impl Into<String>,
    ) -> Self {
        Self {
            relation_type,
            source_concept_iri: source_concept_iri.into(),
            target_concept_iri: target_concept_iri.into(),
        }
    }

    /// Whether `concept_iri` is the source or the target of this edge
    pub fn involves(&self, concept_iri: &str) -> bool {
        self.source_concept_iri == concept_iri || self.target_concept_iri == concept_iri
    }
}
