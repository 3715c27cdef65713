use crate::error::AutoconfigError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the HTML behind `url`.
    async fn fetch(&self, url: &str) -> Result<String, AutoconfigError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AutoconfigError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AutoconfigError> {
        debug!("Visit {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AutoconfigError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Serves pages from a directory, `file://` prefixes are ignored.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        FileFetcher { root: root.into() }
    }
}

#[async_trait::async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AutoconfigError> {
        let path = self.root.join(url.trim_start_matches("file://"));
        debug!("Read {}", path.display());
        Ok(tokio::fs::read_to_string(path).await?)
    }
}
