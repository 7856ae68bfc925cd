//! Dataset ingestion
//!
//! Where datasets come from ([`DatasetSource`], [`SourceFetcher`]) and the
//! run that turns them into a fresh entity graph ([`DatasetOrchestrator`]).

pub mod orchestrator;
pub mod source;

pub use orchestrator::{DatasetOrchestrator, FailedDataset, InitDatasetsReport};
pub use source::{DatasetSource, SourceFetcher, default_datasets};
