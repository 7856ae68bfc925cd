//! Dataset acquisition orchestrator
//!
//! Resets the graph, then fetches, parses and saves every configured dataset
//! in order. A failing dataset is recorded and the run moves on.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::glossary::{GlossaryRepository, GraphGate, SaveSummary};
use crate::error::{Error, Result};
use crate::skos::parse_dataset_bytes;

use super::source::{DatasetSource, SourceFetcher};

/// A dataset that failed at some stage, with the rendered error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDataset {
    pub name: String,
    pub url: String,
    pub error: String,
}

impl FailedDataset {
    fn new(source: &DatasetSource, error: &Error) -> Self {
        Self {
            name: source.name.clone(),
            url: source.url.clone(),
            error: error.to_string(),
        }
    }
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitDatasetsReport {
    #[serde(rename = "saved_datasets")]
    pub saved: Vec<DatasetSource>,
    #[serde(rename = "failed_datasets")]
    pub failed: Vec<FailedDataset>,
    pub completed_at: DateTime<Utc>,
}

impl InitDatasetsReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct DatasetOrchestrator<R: GlossaryRepository> {
    repository: Arc<R>,
    fetcher: Arc<dyn SourceFetcher>,
    datasets: Vec<DatasetSource>,
    gate: GraphGate,
    data_dir: PathBuf,
}

impl<R: GlossaryRepository> DatasetOrchestrator<R> {
    pub fn new(
        repository: Arc<R>,
        fetcher: Arc<dyn SourceFetcher>,
        datasets: Vec<DatasetSource>,
        gate: GraphGate,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repository,
            fetcher,
            datasets,
            gate,
            data_dir: data_dir.into(),
        }
    }

    pub fn datasets(&self) -> &[DatasetSource] {
        &self.datasets
    }

    /// Rebuild the graph from the configured datasets
    ///
    /// Holds the write side of the graph gate for the whole run. With
    /// `reload` set, cached downloads are ignored and every dataset is
    /// fetched again. Only a failed reset aborts the run.
    pub async fn init_datasets(&self, reload: bool) -> Result<InitDatasetsReport> {
        let _guard = self.gate.write().await;

        info!(
            datasets = self.datasets.len(),
            reload,
            "Resetting glossary graph"
        );
        self.repository.reset().await?;

        let mut saved = Vec::new();
        let mut failed = Vec::new();

        for source in &self.datasets {
            match self.ingest(source, reload).await {
                Ok(summary) => {
                    info!(
                        dataset = %source.name,
                        concept_schemes = summary.concept_schemes,
                        concepts = summary.concepts,
                        collections = summary.collections,
                        relations = summary.semantic_relations,
                        "Dataset loaded"
                    );
                    saved.push(source.clone());
                }
                Err(e) => {
                    warn!(
                        dataset = %source.name,
                        url = %source.url,
                        code = e.code(),
                        error = %e,
                        "Failed to load dataset"
                    );
                    failed.push(FailedDataset::new(source, &e));
                }
            }
        }

        info!(
            saved = saved.len(),
            failed = failed.len(),
            "Dataset initialization finished"
        );

        Ok(InitDatasetsReport {
            saved,
            failed,
            completed_at: Utc::now(),
        })
    }

    async fn ingest(&self, source: &DatasetSource, reload: bool) -> Result<SaveSummary> {
        let bytes = self.fetcher.fetch(source, &self.data_dir, reload).await?;
        debug!(dataset = %source.name, bytes = bytes.len(), "Dataset fetched");

        let dataset = parse_dataset_bytes(&bytes)?;
        self.repository.save_dataset(&dataset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::glossary::GraphStats;
    use crate::infrastructure::glossary::SqliteGlossaryRepository;
    use crate::storage::run_migrations;
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::HashMap;
    use std::path::Path;

    const SAMPLE: &str = include_str!("../../../tests/fixtures/cn2024_sample.rdf");

    struct MapFetcher(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl SourceFetcher for MapFetcher {
        async fn fetch(&self, source: &DatasetSource, _: &Path, _: bool) -> Result<Vec<u8>> {
            self.0
                .get(&source.url)
                .cloned()
                .ok_or_else(|| Error::SourceNotFound(source.url.clone()))
        }
    }

    async fn orchestrator(
        documents: &[(&str, &str)],
        datasets: Vec<DatasetSource>,
    ) -> (DatasetOrchestrator<SqliteGlossaryRepository>, Arc<SqliteGlossaryRepository>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        let repository = Arc::new(SqliteGlossaryRepository::new(pool));
        let fetcher = MapFetcher(
            documents
                .iter()
                .map(|(url, doc)| (url.to_string(), doc.as_bytes().to_vec()))
                .collect(),
        );
        let orchestrator = DatasetOrchestrator::new(
            repository.clone(),
            Arc::new(fetcher),
            datasets,
            GraphGate::new(),
            "unused",
        );
        (orchestrator, repository)
    }

    #[tokio::test]
    async fn test_init_datasets_saves_all() {
        let (orchestrator, repository) = orchestrator(
            &[("mem://cn", SAMPLE)],
            vec![DatasetSource::new("cn.rdf", "mem://cn")],
        )
        .await;

        let report = orchestrator.init_datasets(false).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.saved, vec![DatasetSource::new("cn.rdf", "mem://cn")]);

        let stats = repository.stats().await.unwrap();
        assert_eq!(
            stats,
            GraphStats {
                concept_schemes: 1,
                concepts: 2,
                collections: 2,
                semantic_relations: 1,
                in_scheme: 4,
                in_collection: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_failure_stages_are_recorded() {
        let (orchestrator, repository) = orchestrator(
            &[
                ("mem://cn", SAMPLE),
                ("mem://broken", "<rdf:RDF><unclosed>"),
            ],
            vec![
                DatasetSource::new("missing.rdf", "mem://missing"),
                DatasetSource::new("broken.rdf", "mem://broken"),
                DatasetSource::new("cn.rdf", "mem://cn"),
                // Same IRIs again: rejected as duplicates
                DatasetSource::new("again.rdf", "mem://cn"),
            ],
        )
        .await;

        let report = orchestrator.init_datasets(false).await.unwrap();
        assert_eq!(report.saved.len(), 1);
        assert_eq!(report.saved[0].name, "cn.rdf");

        let failed: Vec<&str> = report.failed.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, vec!["missing.rdf", "broken.rdf", "again.rdf"]);
        assert_eq!(report.failed[0].url, "mem://missing");
        assert!(report.failed[0].error.contains("mem://missing"));

        assert_eq!(repository.stats().await.unwrap().concepts, 2);
    }

    #[tokio::test]
    async fn test_every_run_starts_from_an_empty_graph() {
        let (orchestrator, repository) = orchestrator(
            &[("mem://cn", SAMPLE)],
            vec![DatasetSource::new("cn.rdf", "mem://cn")],
        )
        .await;

        orchestrator.init_datasets(false).await.unwrap();
        let report = orchestrator.init_datasets(true).await.unwrap();

        assert!(report.is_success());
        assert_eq!(repository.stats().await.unwrap().concepts, 2);
    }

    #[tokio::test]
    async fn test_no_datasets() {
        let (orchestrator, _) = orchestrator(&[], Vec::new()).await;
        let report = orchestrator.init_datasets(false).await.unwrap();
        assert!(report.saved.is_empty());
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_report_json_field_names() {
        let (orchestrator, _) = orchestrator(
            &[("mem://cn", SAMPLE)],
            vec![
                DatasetSource::new("cn.rdf", "mem://cn"),
                DatasetSource::new("missing.rdf", "mem://missing"),
            ],
        )
        .await;

        let report = orchestrator.init_datasets(false).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["saved_datasets"][0]["name"], "cn.rdf");
        assert_eq!(json["failed_datasets"][0]["name"], "missing.rdf");
        assert!(json["completed_at"].is_string());
        assert!(json.get("saved").is_none());
        assert!(json.get("failed").is_none());

        let parsed: InitDatasetsReport = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.saved.len(), 1);
        assert_eq!(parsed.failed.len(), 1);
    }
}
