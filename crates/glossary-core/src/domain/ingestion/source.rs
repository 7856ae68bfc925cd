//! Dataset sources and the fetcher seam

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

const EUROPA_URL: &str = "http://publications.europa.eu/resource/distribution/";
const FAO_URL: &str = "https://storage.googleapis.com/fao-datalab-caliper/Downloads/";

/// A named SKOS document to ingest
///
/// `name` doubles as the cache file name under the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub name: String,
    pub url: String,
}

impl DatasetSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// The published Eurostat and FAO classification datasets
pub fn default_datasets() -> Vec<DatasetSource> {
    let europa = |path: &str| format!("{EUROPA_URL}{path}");
    let fao = |path: &str| format!("{FAO_URL}{path}");

    vec![
        DatasetSource::new(
            "ESTAT-CN2024.rdf",
            europa("combined-nomenclature-2024/20240425-0/rdf/skos_core/ESTAT-CN2024.rdf"),
        ),
        DatasetSource::new(
            "ESTAT-LoW2015.rdf",
            europa("low2015/20240425-0/rdf/skos_core/ESTAT-LoW2015.rdf"),
        ),
        DatasetSource::new(
            "ESTAT-NACE2.1.rdf",
            europa("nace2.1/20240425-0/rdf/skos_core/ESTAT-NACE2.1.rdf"),
        ),
        DatasetSource::new(
            "ESTAT-ICST-COM.rdf",
            europa("icst-com/20240425-0/rdf/skos_core/ESTAT-ICST-COM.rdf"),
        ),
        DatasetSource::new(
            "ESTAT-PRODCOM2023.rdf",
            europa("prodcom2023/20240425-0/rdf/skos_core/ESTAT-PRODCOM2023.rdf"),
        ),
        DatasetSource::new("ISIC4.rdf", fao("ISICRev4/ISIC4.rdf")),
        DatasetSource::new("ICC11.rdf", fao("ICCv1.1/ICC11.rdf")),
        DatasetSource::new("WCACROPS.rdf", fao("WCA2020Crops/WCACROPS.rdf")),
    ]
}

/// Retrieves the raw bytes of a dataset
///
/// Implementations may keep a copy under `cache_dir`; `reload` asks for a
/// fresh fetch even when a cached copy exists.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &DatasetSource, cache_dir: &Path, reload: bool)
        -> Result<Vec<u8>>;
}
