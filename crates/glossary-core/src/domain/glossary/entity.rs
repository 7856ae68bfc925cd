//! Glossary entity types
//!
//! Concept schemes own members. A member is either a concept or a
//! collection; both share the fields on [`Member`] and carry their
//! variant-specific payload in [`MemberKind`].

use serde::{Deserialize, Serialize};

use super::labels::{LabelListMap, LabelMap};

/// Kind of glossary entity, used in not-found conditions and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ConceptScheme,
    Concept,
    Collection,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConceptScheme => "Concept scheme",
            Self::Concept => "Concept",
            Self::Collection => "Collection",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A taxonomy or classification, e.g. "Combined Nomenclature 2024"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptScheme {
    pub iri: String,
    pub notation: String,
    /// Free text or an IRI reference
    pub scope_note: String,
    pub pref_labels: LabelMap,
}

impl ConceptScheme {
    pub fn new(iri: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            notation: String::new(),
            scope_note: String::new(),
            pref_labels: LabelMap::new(),
        }
    }

    pub fn with_notation(mut self, notation: impl Into<String>) -> Self {
        self.notation = notation.into();
        self
    }

    pub fn with_scope_note(mut self, scope_note: impl Into<String>) -> Self {
        self.scope_note = scope_note.into();
        self
    }

    pub fn with_pref_labels(mut self, pref_labels: LabelMap) -> Self {
        self.pref_labels = pref_labels;
        self
    }
}

/// Discriminator stored in `collection_members.member_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    Concept,
    Collection,
}

impl MemberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Collection => "collection",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "concept" => Some(Self::Concept),
            "collection" => Some(Self::Collection),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemberType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Concept-specific fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptData {
    /// Domain code, e.g. a CN code without spaces
    pub identifier: String,
    pub alt_labels: LabelListMap,
    pub scope_notes: LabelMap,
}

/// Collection-specific fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionData {
    /// IRIs listed by the collection's `member` tags. Unresolved when
    /// parsed; when read back it holds the resolved members only.
    pub member_iris: Vec<String>,
}

/// Variant payload of a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemberKind {
    Concept(ConceptData),
    Collection(CollectionData),
}

/// A concept or collection belonging to schemes and collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub iri: String,
    pub notation: String,
    pub pref_labels: LabelMap,
    pub kind: MemberKind,
}

impl Member {
    /// Create a concept member
    pub fn concept(iri: impl Into<String>, data: ConceptData) -> Self {
        Self {
            iri: iri.into(),
            notation: String::new(),
            pref_labels: LabelMap::new(),
            kind: MemberKind::Concept(data),
        }
    }

    /// Create a collection member
    pub fn collection(iri: impl Into<String>, member_iris: Vec<String>) -> Self {
        Self {
            iri: iri.into(),
            notation: String::new(),
            pref_labels: LabelMap::new(),
            kind: MemberKind::Collection(CollectionData { member_iris }),
        }
    }

    pub fn with_notation(mut self, notation: impl Into<String>) -> Self {
        self.notation = notation.into();
        self
    }

    pub fn with_pref_labels(mut self, pref_labels: LabelMap) -> Self {
        self.pref_labels = pref_labels;
        self
    }

    pub fn member_type(&self) -> MemberType {
        match self.kind {
            MemberKind::Concept(_) => MemberType::Concept,
            MemberKind::Collection(_) => MemberType::Collection,
        }
    }

    pub fn as_concept(&self) -> Option<&ConceptData> {
        match &self.kind {
            MemberKind::Concept(data) => Some(data),
            MemberKind::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionData> {
        match &self.kind {
            MemberKind::Collection(data) => Some(data),
            MemberKind::Concept(_) => None,
        }
    }

    pub fn is_concept(&self) -> bool {
        self.member_type() == MemberType::Concept
    }

    /// Whether `term` occurs in the prefLabel or any altLabel for `lang`
    ///
    /// Both lookups use the English fallback of the label maps. Collections
    /// never match.
    pub fn matches_label(&self, term: &str, lang: &str, case_sensitive: bool) -> bool {
        let Some(concept) = self.as_concept() else {
            return false;
        };

        let contains = |haystack: &str| {
            if case_sensitive {
                haystack.contains(term)
            } else {
                haystack.to_lowercase().contains(&term.to_lowercase())
            }
        };

        contains(self.pref_labels.get(lang))
            || concept.alt_labels.get_list(lang).iter().any(|l| contains(l))
    }
}

/// A concept scheme with its members loaded
#[derive(Debug, Clone)]
pub struct SchemeWithMembers {
    pub scheme: ConceptScheme,
    pub members: Vec<Member>,
}

impl SchemeWithMembers {
    pub fn concepts(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_concept())
    }

    pub fn collections(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| !m.is_concept())
    }
}

/// A collection with its resolved members loaded
#[derive(Debug, Clone)]
pub struct CollectionWithMembers {
    pub collection: Member,
    pub members: Vec<Member>,
}

/// A concept with the schemes it belongs to
#[derive(Debug, Clone)]
pub struct ConceptWithSchemes {
    pub concept: Member,
    pub schemes: Vec<ConceptScheme>,
}
