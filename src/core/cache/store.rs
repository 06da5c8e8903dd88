use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::downloader::write_atomic;
use crate::core::error::{BootError, BootResult};
use crate::core::maven::{ArtifactDescriptor, ChildDescriptor};
use crate::core::resolver::PlatformRules;

/// Resolution record of one descriptor. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedArtifact {
    pub descriptor: ArtifactDescriptor,
    /// Local binary; `None` for metadata-only artifacts.
    pub resource: Option<PathBuf>,
    pub children: Vec<ChildDescriptor>,
    #[serde(default)]
    pub rules: PlatformRules,
    pub resolved_at: DateTime<Utc>,
}

/// Persists `CachedArtifact` records next to the cached binaries.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, descriptor: &ArtifactDescriptor) -> PathBuf {
        self.root
            .join(descriptor.local_dir())
            .join(format!("{}.meta.json", descriptor.filename()))
    }

    /// Load the record for `descriptor`. A record whose binary has gone
    /// missing, or that cannot be parsed, counts as a miss.
    pub async fn get(&self, descriptor: &ArtifactDescriptor) -> BootResult<Option<CachedArtifact>> {
        let path = self.record_path(descriptor);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BootError::io(path, e)),
        };

        let record: CachedArtifact = match serde_json::from_str(&raw) {
            Ok(r) => r,
            Err(e) => {
                warn!("Discarding unreadable cache record {:?}: {}", path, e);
                return Ok(None);
            }
        };

        if record.descriptor != *descriptor {
            warn!("Cache record {:?} belongs to {}", path, record.descriptor);
            return Ok(None);
        }

        if let Some(resource) = &record.resource {
            if !resource.is_file() {
                return Ok(None);
            }
        }

        Ok(Some(record))
    }

    pub async fn put(&self, record: &CachedArtifact) -> BootResult<()> {
        let json = serde_json::to_vec_pretty(record)?;
        write_atomic(&self.record_path(&record.descriptor), &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> ArtifactStore {
        ArtifactStore::new(
            std::env::temp_dir().join(format!("patchboot-store-{}-{}", tag, uuid::Uuid::new_v4())),
        )
    }

    fn record(resource: Option<PathBuf>) -> CachedArtifact {
        let descriptor = ArtifactDescriptor::parse("demo:app:1.0").unwrap();
        CachedArtifact {
            descriptor,
            resource,
            children: vec![ChildDescriptor::compile(
                ArtifactDescriptor::parse("demo:lib:2.0").unwrap(),
            )],
            rules: PlatformRules::default(),
            resolved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn round_trips_metadata_only_records() {
        let store = temp_store("meta");
        let r = record(None);

        store.put(&r).await.unwrap();
        let loaded = store.get(&r.descriptor).await.unwrap().unwrap();
        assert_eq!(loaded, r);

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn record_with_missing_binary_is_a_miss() {
        let store = temp_store("missing");
        let r = record(Some(store.root().join("gone.jar")));

        store.put(&r).await.unwrap();
        assert!(store.get(&r.descriptor).await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn corrupt_record_is_a_miss() {
        let store = temp_store("corrupt");
        let d = ArtifactDescriptor::parse("demo:app:1.0").unwrap();
        let path = store.record_path(&d);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        assert!(store.get(&d).await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(store.root());
    }
}
