//! Dataset source fetching

mod fetcher;

pub use fetcher::{DEFAULT_TIMEOUT_SECS, HttpSourceFetcher};
