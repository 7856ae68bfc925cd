//! SKOS dataset parser
//!
//! Turns one RDF/XML document into a [`ParsedDataset`]. Collection members
//! are captured as IRIs only; they are resolved when the dataset is saved.

use tracing::debug;

use crate::domain::glossary::{
    ConceptData, ConceptScheme, InCollection, InScheme, Member, ParsedDataset, SemanticRelation,
    SemanticRelationType,
};
use crate::error::{Error, Result};

use super::xml::{
    DC_NS, Name, RDF_NS, SKOS_NS, XmlElement, attribute, labels_by_language,
    labels_by_language_list, parse_document, sub_element_attributes, sub_element_text,
};

pub const RDF_ROOT: Name = Name::new(RDF_NS, "RDF");
pub const RDF_ABOUT: Name = Name::new(RDF_NS, "about");
pub const RDF_RESOURCE: Name = Name::new(RDF_NS, "resource");

pub const CONCEPT_SCHEME: Name = Name::new(SKOS_NS, "ConceptScheme");
pub const CONCEPT: Name = Name::new(SKOS_NS, "Concept");
pub const COLLECTION: Name = Name::new(SKOS_NS, "Collection");

pub const NOTATION: Name = Name::new(SKOS_NS, "notation");
pub const PREF_LABEL: Name = Name::new(SKOS_NS, "prefLabel");
pub const ALT_LABEL: Name = Name::new(SKOS_NS, "altLabel");
pub const SCOPE_NOTE: Name = Name::new(SKOS_NS, "scopeNote");
pub const IN_SCHEME: Name = Name::new(SKOS_NS, "inScheme");
pub const MEMBER: Name = Name::new(SKOS_NS, "member");
pub const IDENTIFIER: Name = Name::new(DC_NS, "identifier");

fn relation_tag(relation_type: SemanticRelationType) -> Name {
    Name::new(SKOS_NS, relation_type.as_str())
}

/// `rdf:about` of an entity element; required
fn about(element: &XmlElement, kind: Name) -> Result<String> {
    let iri = attribute(element, RDF_ABOUT);
    if iri.is_empty() {
        return Err(Error::InvalidDocument(format!(
            "{} element without rdf:about",
            kind.local
        )));
    }
    Ok(iri)
}

/// Resource references under `tag`, skipping children with no `rdf:resource`
fn references(element: &XmlElement, tag: Name) -> Vec<String> {
    sub_element_attributes(element, tag, RDF_RESOURCE)
        .into_iter()
        .filter(|iri| !iri.is_empty())
        .collect()
}

pub fn concept_scheme_from_xml(element: &XmlElement) -> Result<ConceptScheme> {
    Ok(ConceptScheme {
        iri: about(element, CONCEPT_SCHEME)?,
        notation: sub_element_text(element, NOTATION),
        scope_note: sub_element_text(element, SCOPE_NOTE),
        pref_labels: labels_by_language(element, PREF_LABEL),
    })
}

pub fn concept_from_xml(element: &XmlElement) -> Result<Member> {
    let data = ConceptData {
        identifier: sub_element_text(element, IDENTIFIER),
        alt_labels: labels_by_language_list(element, ALT_LABEL),
        scope_notes: labels_by_language(element, SCOPE_NOTE),
    };

    Ok(Member::concept(about(element, CONCEPT)?, data)
        .with_notation(sub_element_text(element, NOTATION))
        .with_pref_labels(labels_by_language(element, PREF_LABEL)))
}

pub fn collection_from_xml(element: &XmlElement) -> Result<Member> {
    Ok(
        Member::collection(about(element, COLLECTION)?, references(element, MEMBER))
            .with_notation(sub_element_text(element, NOTATION))
            .with_pref_labels(labels_by_language(element, PREF_LABEL)),
    )
}

/// One edge per `inScheme` reference of a concept or collection
pub fn in_schemes_from_xml(element: &XmlElement, member_iri: &str) -> Vec<InScheme> {
    references(element, IN_SCHEME)
        .into_iter()
        .map(|scheme_iri| InScheme::new(scheme_iri, member_iri))
        .collect()
}

/// One edge per `member` reference of a collection
pub fn in_collections_from_xml(element: &XmlElement, collection_iri: &str) -> Vec<InCollection> {
    references(element, MEMBER)
        .into_iter()
        .map(|member_iri| InCollection::new(collection_iri, member_iri))
        .collect()
}

/// One relation per (relation tag, reference) of a concept
pub fn semantic_relations_from_xml(element: &XmlElement, concept_iri: &str) -> Vec<SemanticRelation> {
    SemanticRelationType::ALL
        .into_iter()
        .flat_map(|relation_type| {
            references(element, relation_tag(relation_type))
                .into_iter()
                .map(move |target| SemanticRelation::new(relation_type, concept_iri, target))
        })
        .collect()
}

/// Parse a dataset from its `rdf:RDF` root element
pub fn parse_dataset(root: &XmlElement) -> Result<ParsedDataset> {
    if !root.is(RDF_ROOT) {
        return Err(Error::InvalidDocument(format!(
            "expected rdf:RDF root element, found '{}'",
            root.local
        )));
    }

    let scheme_elements: Vec<&XmlElement> = root.children_named(CONCEPT_SCHEME).collect();
    let collection_elements: Vec<&XmlElement> = root.children_named(COLLECTION).collect();
    let concept_elements: Vec<&XmlElement> = root.children_named(CONCEPT).collect();

    let mut dataset = ParsedDataset::default();

    for element in scheme_elements {
        dataset.concept_schemes.push(concept_scheme_from_xml(element)?);
    }

    for element in collection_elements {
        let collection = collection_from_xml(element)?;
        dataset
            .in_schemes
            .extend(in_schemes_from_xml(element, &collection.iri));
        dataset
            .in_collections
            .extend(in_collections_from_xml(element, &collection.iri));
        dataset.collections.push(collection);
    }

    for element in concept_elements {
        let concept = concept_from_xml(element)?;
        dataset
            .in_schemes
            .extend(in_schemes_from_xml(element, &concept.iri));
        dataset
            .semantic_relations
            .extend(semantic_relations_from_xml(element, &concept.iri));
        dataset.concepts.push(concept);
    }

    debug!(
        concept_schemes = dataset.concept_schemes.len(),
        concepts = dataset.concepts.len(),
        collections = dataset.collections.len(),
        relations = dataset.semantic_relations.len(),
        "Dataset parsed"
    );
    Ok(dataset)
}

/// Parse a dataset straight from document bytes
pub fn parse_dataset_bytes(bytes: &[u8]) -> Result<ParsedDataset> {
    let root = parse_document(bytes)?;
    parse_dataset(&root)
}
