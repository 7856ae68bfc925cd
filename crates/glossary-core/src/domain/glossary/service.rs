//! Glossary query service
//!
//! Read-side composition over the repository. Every operation selects
//! labels for one language (English when unspecified) and turns missing
//! entities into [`Error::NotFound`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::entity::{ConceptScheme, EntityKind, Member};
use super::gate::GraphGate;
use super::labels::DEFAULT_LANG;
use super::relation::SemanticRelation;
use super::repository::GlossaryRepository;

/// Concept scheme as presented to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptSchemeView {
    pub iri: String,
    pub notation: String,
    #[serde(rename = "scopeNote")]
    pub scope_note: String,
    #[serde(rename = "prefLabel")]
    pub pref_label: String,
}

impl ConceptSchemeView {
    pub fn from_scheme(scheme: &ConceptScheme, lang: &str) -> Self {
        Self {
            iri: scheme.iri.clone(),
            notation: scheme.notation.clone(),
            scope_note: scheme.scope_note.clone(),
            pref_label: scheme.pref_labels.get(lang).to_string(),
        }
    }
}

/// Any member reduced to its shared fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub iri: String,
    pub notation: String,
    #[serde(rename = "prefLabel")]
    pub pref_label: String,
}

impl EntityView {
    pub fn from_member(member: &Member, lang: &str) -> Self {
        Self {
            iri: member.iri.clone(),
            notation: member.notation.clone(),
            pref_label: member.pref_labels.get(lang).to_string(),
        }
    }
}

/// Concept as presented to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptView {
    pub iri: String,
    pub identifier: String,
    pub notation: String,
    #[serde(rename = "prefLabel")]
    pub pref_label: String,
    #[serde(rename = "altLabels")]
    pub alt_labels: Vec<String>,
    #[serde(rename = "scopeNote")]
    pub scope_note: String,
}

impl ConceptView {
    /// Returns None for collection members
    pub fn from_member(member: &Member, lang: &str) -> Option<Self> {
        let concept = member.as_concept()?;
        Some(Self {
            iri: member.iri.clone(),
            identifier: concept.identifier.clone(),
            notation: member.notation.clone(),
            pref_label: member.pref_labels.get(lang).to_string(),
            alt_labels: concept.alt_labels.get_list(lang).to_vec(),
            scope_note: concept.scope_notes.get(lang).to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullConceptSchemeView {
    #[serde(flatten)]
    pub scheme: ConceptSchemeView,
    pub collections: Vec<EntityView>,
    pub concepts: Vec<ConceptView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionView {
    #[serde(flatten)]
    pub collection: EntityView,
    pub collections: Vec<EntityView>,
    pub concepts: Vec<ConceptView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullConceptView {
    #[serde(flatten)]
    pub concept: ConceptView,
    pub concept_schemes: Vec<String>,
    pub relations: Vec<SemanticRelation>,
}

/// Split members into (collections, concepts) views
fn member_views(members: &[Member], lang: &str) -> (Vec<EntityView>, Vec<ConceptView>) {
    let collections = members
        .iter()
        .filter(|m| !m.is_concept())
        .map(|m| EntityView::from_member(m, lang))
        .collect();
    let concepts = members
        .iter()
        .filter_map(|m| ConceptView::from_member(m, lang))
        .collect();
    (collections, concepts)
}

/// Read-side service over the entity graph
pub struct GlossaryService<R: GlossaryRepository> {
    repository: Arc<R>,
    gate: GraphGate,
    case_sensitive: bool,
}

impl<R: GlossaryRepository> GlossaryService<R> {
    pub fn new(repository: Arc<R>, gate: GraphGate) -> Self {
        Self {
            repository,
            gate,
            case_sensitive: true,
        }
    }

    /// Set whether search matching respects case
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub async fn get_concept_schemes(&self, lang: Option<&str>) -> Result<Vec<ConceptSchemeView>> {
        let lang = lang.unwrap_or(DEFAULT_LANG);
        let _guard = self.gate.read().await;

        let schemes = self.repository.list_concept_schemes().await?;
        Ok(schemes
            .iter()
            .map(|s| ConceptSchemeView::from_scheme(s, lang))
            .collect())
    }

    pub async fn get_concept_scheme(
        &self,
        iri: &str,
        lang: Option<&str>,
    ) -> Result<FullConceptSchemeView> {
        let lang = lang.unwrap_or(DEFAULT_LANG);
        let _guard = self.gate.read().await;

        let loaded = self
            .repository
            .get_concept_scheme(iri)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::ConceptScheme, iri))?;

        let (collections, concepts) = member_views(&loaded.members, lang);
        Ok(FullConceptSchemeView {
            scheme: ConceptSchemeView::from_scheme(&loaded.scheme, lang),
            collections,
            concepts,
        })
    }

    /// Collections belonging to a scheme
    pub async fn get_collections(
        &self,
        scheme_iri: &str,
        lang: Option<&str>,
    ) -> Result<Vec<EntityView>> {
        Ok(self.get_concept_scheme(scheme_iri, lang).await?.collections)
    }

    /// Concepts belonging to a scheme
    pub async fn get_concepts(
        &self,
        scheme_iri: &str,
        lang: Option<&str>,
    ) -> Result<Vec<ConceptView>> {
        Ok(self.get_concept_scheme(scheme_iri, lang).await?.concepts)
    }

    pub async fn get_collection(&self, iri: &str, lang: Option<&str>) -> Result<CollectionView> {
        let lang = lang.unwrap_or(DEFAULT_LANG);
        let _guard = self.gate.read().await;

        let loaded = self
            .repository
            .get_collection(iri)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::Collection, iri))?;

        let (collections, concepts) = member_views(&loaded.members, lang);
        Ok(CollectionView {
            collection: EntityView::from_member(&loaded.collection, lang),
            collections,
            concepts,
        })
    }

    /// A concept with its scheme IRIs and every relation touching it
    pub async fn get_concept(&self, iri: &str, lang: Option<&str>) -> Result<FullConceptView> {
        let lang = lang.unwrap_or(DEFAULT_LANG);
        let _guard = self.gate.read().await;

        let loaded = self
            .repository
            .get_concept(iri)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::Concept, iri))?;
        let concept = ConceptView::from_member(&loaded.concept, lang)
            .ok_or_else(|| Error::not_found(EntityKind::Concept, iri))?;

        let relations = self.repository.get_relations(iri).await?;
        debug!(concept_iri = %iri, relations = relations.len(), "Concept loaded");

        Ok(FullConceptView {
            concept,
            concept_schemes: loaded.schemes.into_iter().map(|s| s.iri).collect(),
            relations,
        })
    }

    /// Concepts whose prefLabel or altLabels contain `term`
    pub async fn search(&self, term: &str, lang: Option<&str>) -> Result<Vec<ConceptView>> {
        let lang = lang.unwrap_or(DEFAULT_LANG);
        let _guard = self.gate.read().await;

        let matches = self
            .repository
            .search_concepts(term, lang, self.case_sensitive)
            .await?;
        debug!(term = %term, lang = %lang, matches = matches.len(), "Search completed");

        Ok(matches
            .iter()
            .filter_map(|m| ConceptView::from_member(m, lang))
            .collect())
    }
}
