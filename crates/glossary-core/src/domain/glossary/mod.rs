//! Glossary domain module
//!
//! The entity graph built from SKOS datasets:
//!
//! - **ConceptScheme**: a taxonomy owning members
//! - **Member**: a concept or a collection, distinguished by [`MemberKind`]
//! - **SemanticRelation**: a typed, directed edge between two concepts
//! - **InScheme / InCollection**: membership edges
//!
//! Labels are language-tagged maps with English fallback. The
//! [`GlossaryService`] is the read side; writes go through
//! [`GlossaryRepository::save_dataset`].

mod dataset;
mod entity;
mod gate;
mod labels;
mod relation;
mod repository;
mod service;

pub use dataset::{GraphStats, InCollection, InScheme, ParsedDataset};
pub use entity::{
    CollectionData, CollectionWithMembers, ConceptData, ConceptScheme, ConceptWithSchemes,
    EntityKind, Member, MemberKind, MemberType, SchemeWithMembers,
};
pub use gate::GraphGate;
pub use labels::{DEFAULT_LANG, LabelListMap, LabelMap};
pub use relation::{SemanticRelation, SemanticRelationType};
pub use repository::{GlossaryRepository, SaveSummary};
pub use service::{
    CollectionView, ConceptSchemeView, ConceptView, EntityView, FullConceptSchemeView,
    FullConceptView, GlossaryService,
};
