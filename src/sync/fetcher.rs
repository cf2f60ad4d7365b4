use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Thin client over the remote content endpoint. All asset URLs are
/// `{base}/{name}`.
pub struct RemoteSite {
    client: Client,
    base: String,
}

impl RemoteSite {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base, name)
    }

    /// Fetch `{base}/{name}` and parse it as JSON.
    pub async fn fetch_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let url = self.url_for(name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request {url}"))?
            .error_for_status()
            .with_context(|| format!("fetch {url}"))?;
        response
            .json::<T>()
            .await
            .with_context(|| format!("parse {url}"))
    }

    /// Probe `{base}/{name}` with a HEAD request and return its
    /// `Last-Modified` header verbatim, if the server sends one.
    pub async fn last_modified(&self, name: &str) -> Result<Option<String>> {
        let url = self.url_for(name);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .with_context(|| format!("probe {url}"))?
            .error_for_status()
            .with_context(|| format!("probe {url}"))?;

        let value = response
            .headers()
            .get(header::LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        Ok(value)
    }

    /// Fetch the full body of `{base}/{name}`.
    pub async fn download(&self, name: &str) -> Result<Vec<u8>> {
        let url = self.url_for(name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request {url}"))?
            .error_for_status()
            .with_context(|| format!("download {url}"))?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("read body of {url}"))?;
        debug!("downloaded {} ({} bytes)", name, bytes.len());
        Ok(bytes.to_vec())
    }
}
