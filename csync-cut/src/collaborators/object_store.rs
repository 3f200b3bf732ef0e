//! Object store adapters
//!
//! Storage paths are relative, slash-separated keys such as
//! `{user_id}/{project_id}/cuts/{song_id}.mp3`.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};

use super::ObjectStore;

/// Reject absolute paths and `..` so a key cannot escape the store root
fn validate_key(path: &str) -> anyhow::Result<&Path> {
    let key = Path::new(path);
    if path.is_empty()
        || key
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        bail!("Invalid storage path: {:?}", path);
    }
    Ok(key)
}

/// Filesystem-backed store rooted at a directory
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> anyhow::Result<PathBuf> {
        Ok(self.root.join(validate_key(path)?))
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalObjectStore {
    async fn download(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let full_path = self.resolve(path)?;
        tokio::fs::read(&full_path)
            .await
            .with_context(|| format!("Failed to read object {}", full_path.display()))
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<()> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        tracing::debug!(
            path = %full_path.display(),
            bytes = bytes.len(),
            content_type = content_type,
            "Writing object"
        );

        tokio::fs::write(&full_path, bytes)
            .await
            .with_context(|| format!("Failed to write object {}", full_path.display()))
    }
}

/// HTTP storage API client
///
/// `GET {base_url}/object/{bucket}/{path}` downloads and
/// `POST {base_url}/object/{bucket}/{path}` uploads (upsert), both with a
/// bearer API key.
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl HttpObjectStore {
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            api_key: api_key.into(),
        })
    }

    fn object_url(&self, path: &str) -> anyhow::Result<String> {
        validate_key(path)?;
        Ok(format!("{}/object/{}/{}", self.base_url, self.bucket, path))
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpObjectStore {
    async fn download(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let url = self.object_url(path)?;

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        if !response.status().is_success() {
            bail!("GET {} returned {}", url, response.status());
        }

        let bytes = response.bytes().await.context("Failed to read object body")?;
        Ok(bytes.to_vec())
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<()> {
        let url = self.object_url(path)?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("POST {} returned {}: {}", url, status, body);
        }

        Ok(())
    }
}
