//! HTTP and filesystem dataset fetcher

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::debug;

use crate::domain::ingestion::{DatasetSource, SourceFetcher};
use crate::error::{Error, Result};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where a dataset url points
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Remote(String),
    Local(PathBuf),
}

impl Location {
    fn parse(url: &str) -> Self {
        if url.starts_with("http://") || url.starts_with("https://") {
            Location::Remote(url.to_string())
        } else if let Some(path) = url.strip_prefix("file://") {
            Location::Local(PathBuf::from(path))
        } else {
            Location::Local(PathBuf::from(url))
        }
    }
}

/// Fetches `http(s)://` urls with reqwest and reads `file://` urls or plain
/// paths from disk
///
/// Downloads are written to `<cache_dir>/<dataset name>` and served from
/// there on later runs unless a reload is requested. Local files are always
/// read in place.
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
    http_client: HttpClient,
    timeout_secs: u64,
}

impl HttpSourceFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::NetworkError)?;

        Ok(Self {
            http_client,
            timeout_secs,
        })
    }

    fn cache_path(cache_dir: &Path, source: &DatasetSource) -> Result<PathBuf> {
        let file_name = Path::new(&source.name)
            .file_name()
            .filter(|name| *name == source.name.as_str())
            .ok_or_else(|| {
                Error::InvalidInput(format!("Invalid dataset name '{}'", source.name))
            })?;
        Ok(cache_dir.join(file_name))
    }

    fn map_request_error(&self, url: &str, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::FetchTimeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            Error::NetworkError(error)
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url = %url, "Downloading dataset");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_request_error(url, e))?;
        Ok(body.to_vec())
    }

    async fn read_local(path: &Path) -> Result<Vec<u8>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::SourceNotFound(path.display().to_string()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(
        &self,
        source: &DatasetSource,
        cache_dir: &Path,
        reload: bool,
    ) -> Result<Vec<u8>> {
        let url = match Location::parse(&source.url) {
            Location::Local(path) => return Self::read_local(&path).await,
            Location::Remote(url) => url,
        };

        let cache_path = Self::cache_path(cache_dir, source)?;
        if !reload && tokio::fs::try_exists(&cache_path).await? {
            debug!(dataset = %source.name, path = %cache_path.display(), "Using cached dataset");
            return Ok(tokio::fs::read(&cache_path).await?);
        }

        let bytes = self.download(&url).await?;

        tokio::fs::create_dir_all(cache_dir).await?;
        tokio::fs::write(&cache_path, &bytes).await?;
        debug!(dataset = %source.name, path = %cache_path.display(), "Dataset cached");

        Ok(bytes)
    }
}
