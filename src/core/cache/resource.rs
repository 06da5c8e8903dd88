use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::downloader::write_atomic;
use crate::core::error::{BootError, BootResult};
use crate::core::maven::{ArtifactDescriptor, RemoteResource, Repository};

/// Materializes remote artifacts under a cache root, exactly once each.
///
/// Layout: `<root>/<group segments>/<artifact>/<version>/<artifact>-<version>[-<classifier>].<ext>`
#[derive(Debug, Clone)]
pub struct ResourceCache {
    root: PathBuf,
}

impl ResourceCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic local path of a descriptor's binary.
    pub fn path_of(&self, descriptor: &ArtifactDescriptor) -> PathBuf {
        self.root.join(descriptor.local_path())
    }

    pub fn contains(&self, descriptor: &ArtifactDescriptor) -> bool {
        self.path_of(descriptor).is_file()
    }

    /// Return the local path of `descriptor`, fetching it through `repository`
    /// first if it is not cached yet.
    pub async fn materialize(
        &self,
        descriptor: &ArtifactDescriptor,
        resource: &RemoteResource,
        repository: &dyn Repository,
    ) -> BootResult<PathBuf> {
        let dest = self.path_of(descriptor);
        if dest.is_file() {
            debug!("Cache hit for {} at {:?}", descriptor, dest);
            return Ok(dest);
        }

        let fetch_failed = |e: BootError| BootError::ResourceFetchFailed {
            descriptor: descriptor.clone(),
            source: Box::new(e),
        };

        let bytes = repository.fetch(resource).await.map_err(fetch_failed)?;
        write_atomic(&dest, &bytes).await.map_err(fetch_failed)?;

        info!(
            "Cached {} ({} bytes) from {}",
            descriptor,
            bytes.len(),
            resource.location
        );
        Ok(dest)
    }
}
