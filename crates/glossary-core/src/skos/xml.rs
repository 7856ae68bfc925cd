//! Namespace-aware XML tree and element extractors
//!
//! Documents are read with quick-xml into a small owned tree. Names are
//! resolved to (namespace URI, local name) pairs, so lookups do not depend on
//! the prefixes a document happens to use.
//!
//! The reader is hardened for untrusted input: documents declaring entities
//! in a DTD are rejected and only the predefined XML entities and character
//! references are ever expanded.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

use crate::domain::glossary::{LabelListMap, LabelMap};
use crate::error::{Error, Result};

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const SKOS_NS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Deepest element nesting accepted
const MAX_DEPTH: usize = 256;

/// An expanded XML name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Name {
    pub namespace: &'static str,
    pub local: &'static str,
}

impl Name {
    pub const fn new(namespace: &'static str, local: &'static str) -> Self {
        Self { namespace, local }
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local)
    }
}

pub const XML_LANG: Name = Name::new(XML_NS, "lang");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: String,
    pub local: String,
    pub value: String,
}

/// One element of a parsed document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Empty when the element is in no namespace
    pub namespace: String,
    pub local: String,
    pub attributes: Vec<XmlAttribute>,
    /// Concatenated direct text content
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn is(&self, name: Name) -> bool {
        self.local == name.local && self.namespace == name.namespace
    }

    /// Direct children with the given name, in document order
    pub fn children_named(&self, name: Name) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter(move |c| c.is(name))
    }

    pub fn attribute(&self, name: Name) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local == name.local && a.namespace == name.namespace)
            .map(|a| a.value.as_str())
    }

    /// Value of `xml:lang`, "" when absent
    pub fn lang(&self) -> &str {
        self.attribute(XML_LANG).unwrap_or("")
    }
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<String> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => Ok(String::new()),
        ResolveResult::Unknown(prefix) if prefix == b"xml" => Ok(XML_NS.to_string()),
        ResolveResult::Unknown(prefix) => Err(Error::InvalidDocument(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn element_from(
    reader: &NsReader<&[u8]>,
    namespace: String,
    start: &BytesStart<'_>,
) -> Result<XmlElement> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let (attr_ns, local) = reader.resolve_attribute(attr.key);
        attributes.push(XmlAttribute {
            namespace: namespace_of(attr_ns)?,
            local: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value: attr.unescape_value()?.into_owned(),
        });
    }

    Ok(XmlElement {
        namespace,
        local: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

/// Parse a document and return its root element
pub fn parse_document(bytes: &[u8]) -> Result<XmlElement> {
    let mut reader = NsReader::from_reader(bytes);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        match event {
            Event::DocType(doctype) => {
                let declaration = String::from_utf8_lossy(&doctype);
                if declaration.contains("<!ENTITY") {
                    return Err(Error::ForbiddenXml("DTD entity declaration".to_string()));
                }
            }
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(Error::ForbiddenXml(format!(
                        "element nesting deeper than {MAX_DEPTH}"
                    )));
                }
                if root.is_some() {
                    return Err(Error::InvalidDocument(
                        "content after the root element".to_string(),
                    ));
                }
                let namespace = namespace_of(resolved)?;
                let element = element_from(&reader, namespace, &start)?;
                stack.push(element);
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(Error::InvalidDocument("unbalanced end tag".to_string()));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::InvalidDocument("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| Error::InvalidDocument("document has no root element".to_string()))
}

// ========== Element Extractors ==========

/// Attribute value, "" if absent
pub fn attribute(element: &XmlElement, name: Name) -> String {
    element.attribute(name).unwrap_or_default().to_string()
}

/// Text of the first child named `tag`, "" if absent
pub fn sub_element_text(element: &XmlElement, tag: Name) -> String {
    element
        .children_named(tag)
        .next()
        .map(|c| c.text.clone())
        .unwrap_or_default()
}

/// The `attr` value of every child named `tag`, "" where a child lacks it
pub fn sub_element_attributes(element: &XmlElement, tag: Name, attr: Name) -> Vec<String> {
    element
        .children_named(tag)
        .map(|c| attribute(c, attr))
        .collect()
}

/// Children named `tag` keyed by `xml:lang`; the last one wins per language
pub fn labels_by_language(element: &XmlElement, tag: Name) -> LabelMap {
    let mut labels = LabelMap::new();
    for child in element.children_named(tag) {
        labels.insert(child.lang(), child.text.clone());
    }
    labels
}

/// Children named `tag` grouped by `xml:lang`, in document order
pub fn labels_by_language_list(element: &XmlElement, tag: Name) -> LabelListMap {
    let mut labels = LabelListMap::new();
    for child in element.children_named(tag) {
        labels.push(child.lang(), child.text.clone());
    }
    labels
}
