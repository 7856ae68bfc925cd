//! Language-tagged label maps
//!
//! Every glossary entity carries its human-readable text as maps keyed by
//! language tag. Lookups fall back to English, then to an empty value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Language used when the requested one is absent
pub const DEFAULT_LANG: &str = "en";

/// Single-valued labels (prefLabel, scopeNote)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap(BTreeMap<String, String>);

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label in `lang`, else the English label, else ""
    pub fn get(&self, lang: &str) -> &str {
        self.0
            .get(lang)
            .or_else(|| self.0.get(DEFAULT_LANG))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Insert a label, replacing any previous one for the same language
    pub fn insert(&mut self, lang: impl Into<String>, label: impl Into<String>) {
        self.0.insert(lang.into(), label.into());
    }

    pub fn with(mut self, lang: impl Into<String>, label: impl Into<String>) -> Self {
        self.insert(lang, label);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Multi-valued labels (altLabel may repeat per language)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelListMap(BTreeMap<String, Vec<String>>);

impl LabelListMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels in `lang`, else the English labels, else an empty slice
    pub fn get_list(&self, lang: &str) -> &[String] {
        self.0
            .get(lang)
            .or_else(|| self.0.get(DEFAULT_LANG))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append a label to the list for `lang`
    pub fn push(&mut self, lang: impl Into<String>, label: impl Into<String>) {
        self.0.entry(lang.into()).or_default().push(label.into());
    }

    pub fn with(mut self, lang: impl Into<String>, label: impl Into<String>) -> Self {
        self.push(lang, label);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_requested_language() {
        let labels = LabelMap::new().with("en", "Horses").with("fr", "Chevaux");
        assert_eq!(labels.get("fr"), "Chevaux");
        assert_eq!(labels.get("en"), "Horses");
    }

    #[test]
    fn test_get_falls_back_to_english() {
        let labels = LabelMap::new().with("en", "Horses").with("de", "Pferde");
        for lang in ["fr", "it", "", "xx"] {
            assert_eq!(labels.get(lang), labels.get("en"));
        }
    }

    #[test]
    fn test_get_without_english_is_empty() {
        let labels = LabelMap::new().with("de", "Pferde");
        assert_eq!(labels.get("fr"), "");
        assert_eq!(LabelMap::new().get("en"), "");
    }

    #[test]
    fn test_get_list_fallback() {
        let labels = LabelListMap::new()
            .with("en", "Swine")
            .with("en", "Pig")
            .with("de", "Schwein");

        assert_eq!(labels.get_list("fr"), &["Swine".to_string(), "Pig".to_string()]);
        assert_eq!(labels.get_list("de"), &["Schwein".to_string()]);
        assert!(LabelListMap::new().get_list("en").is_empty());
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let labels = LabelMap::new().with("fr", "Chevaux").with("en", "Horses");
        let json = serde_json::to_string(&labels).unwrap();
        assert_eq!(json, r#"{"en":"Horses","fr":"Chevaux"}"#);

        let parsed: LabelListMap = serde_json::from_str(r#"{"en":["a","b"]}"#).unwrap();
        assert_eq!(parsed.get_list("en").len(), 2);
    }
}
