use std::path::{Path, PathBuf};

use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::checksum::Checksum;
use crate::core::error::{BootError, BootResult};
use crate::core::http::repository_client;

/// Checksum-validating HTTP fetcher shared by remote repositories. Callers
/// that batch own the parallelism.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> BootResult<Self> {
        Ok(Self {
            client: repository_client()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    // ── Single resource fetch ───────────────────────────

    /// Fetch `url` into memory, validating the digest when one is given.
    pub async fn fetch(&self, url: &str, checksum: Option<&Checksum>) -> BootResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BootError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?.to_vec();

        if let Some(expected) = checksum {
            expected.verify(url, &bytes)?;
        }

        debug!("Fetched {} ({} bytes)", url, bytes.len());
        Ok(bytes)
    }

    /// Fetch a small text document. A 404 is reported as `None` so callers can
    /// treat optional sidecars (POMs, checksums) as absent.
    pub async fn fetch_text(&self, url: &str) -> BootResult<Option<String>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BootError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(Some(response.text().await?))
    }
}

// ── Atomic writes ───────────────────────────────────────

/// Sibling path used while writing `dest`.
fn staging_path(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.part", file_name, uuid::Uuid::new_v4()))
}

/// Write `bytes` to `dest` so that `dest` either does not exist or holds the
/// complete content. Parent directories are created as needed.
pub async fn write_atomic(dest: &Path, bytes: &[u8]) -> BootResult<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BootError::io(parent, e))?;
    }

    let staging = staging_path(dest);
    let result = write_then_rename(&staging, dest, bytes).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(&staging).await;
    }
    result
}

async fn write_then_rename(staging: &Path, dest: &Path, bytes: &[u8]) -> BootResult<()> {
    // Handle is dropped before the rename, required on Windows.
    {
        let mut file = tokio::fs::File::create(staging)
            .await
            .map_err(|e| BootError::io(staging, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| BootError::io(staging, e))?;
        file.sync_all()
            .await
            .map_err(|e| BootError::io(staging, e))?;
    }

    tokio::fs::rename(staging, dest)
        .await
        .map_err(|e| BootError::io(dest, e))
}
