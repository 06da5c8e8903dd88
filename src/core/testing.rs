// ─── Test Doubles ───
// In-memory repository that counts every call made against it.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::error::{BootError, BootResult};
use crate::core::maven::{
    ArtifactDescriptor, ArtifactMetadata, ChildDescriptor, RemoteResource, Repository,
};
use crate::core::resolver::PlatformRules;

#[derive(Default)]
pub struct MemoryRepository {
    metadata: HashMap<ArtifactDescriptor, ArtifactMetadata>,
    binaries: HashMap<String, Vec<u8>>,
    pub metadata_calls: AtomicUsize,
    pub fetches: AtomicUsize,
    pub fetched: Mutex<Vec<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn location(descriptor: &ArtifactDescriptor) -> String {
        format!("mem://{}", descriptor)
    }

    /// Add an artifact whose binary is `binary` (or none for metadata-only).
    pub fn artifact(mut self, coord: &str, binary: Option<Vec<u8>>, children: &[&str]) -> Self {
        let descriptor = ArtifactDescriptor::parse(coord).expect("valid coordinate");
        let resource = binary.map(|bytes| {
            let location = Self::location(&descriptor);
            self.binaries.insert(location.clone(), bytes);
            RemoteResource {
                location,
                checksum: None,
            }
        });
        let children = children
            .iter()
            .map(|c| ChildDescriptor::compile(ArtifactDescriptor::parse(c).expect("valid child")))
            .collect();
        self.metadata.insert(
            descriptor,
            ArtifactMetadata {
                resource,
                children,
                rules: PlatformRules::default(),
            },
        );
        self
    }

    pub fn with_child(mut self, coord: &str, child: ChildDescriptor) -> Self {
        let descriptor = ArtifactDescriptor::parse(coord).expect("valid coordinate");
        self.metadata
            .get_mut(&descriptor)
            .expect("artifact registered")
            .children
            .push(child);
        self
    }

    pub fn with_rules(mut self, coord: &str, rules: PlatformRules) -> Self {
        let descriptor = ArtifactDescriptor::parse(coord).expect("valid coordinate");
        self.metadata
            .get_mut(&descriptor)
            .expect("artifact registered")
            .rules = rules;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn metadata_count(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn fetched_locations(&self) -> Vec<String> {
        self.fetched.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn name(&self) -> &str {
        "memory"
    }

    async fn metadata(&self, descriptor: &ArtifactDescriptor) -> BootResult<ArtifactMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata
            .get(descriptor)
            .cloned()
            .ok_or_else(|| BootError::Other(format!("{} not in repository", descriptor)))
    }

    async fn fetch(&self, resource: &RemoteResource) -> BootResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetched
            .lock()
            .expect("lock")
            .push(resource.location.clone());
        self.binaries
            .get(&resource.location)
            .cloned()
            .ok_or_else(|| BootError::DownloadFailed {
                url: resource.location.clone(),
                status: 404,
            })
    }
}

/// Zip bytes holding `files`.
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, body) in files {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .expect("start file");
        zip.write_all(body).expect("write entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Unique scratch directory under the system temp dir.
pub fn temp_dir(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("patchboot-{}-{}", tag, uuid::Uuid::new_v4()))
}
