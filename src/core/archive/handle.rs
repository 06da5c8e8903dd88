use std::sync::Arc;

use super::ArchiveReference;
use crate::core::loader::Loader;
use crate::core::maven::ArtifactDescriptor;

/// An opened, loadable archive together with the loader that owns it.
/// Shared through `Arc`; never cloned.
#[derive(Debug)]
pub struct ArchiveHandle {
    descriptor: Option<ArtifactDescriptor>,
    archive: Arc<ArchiveReference>,
    loader: Arc<Loader>,
    parents: Vec<Arc<ArchiveHandle>>,
}

impl ArchiveHandle {
    pub fn new(
        descriptor: Option<ArtifactDescriptor>,
        archive: Arc<ArchiveReference>,
        loader: Arc<Loader>,
        parents: Vec<Arc<ArchiveHandle>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            descriptor,
            archive,
            loader,
            parents,
        })
    }

    pub fn descriptor(&self) -> Option<&ArtifactDescriptor> {
        self.descriptor.as_ref()
    }

    /// Descriptor if known, otherwise the archive name.
    pub fn display_name(&self) -> String {
        match &self.descriptor {
            Some(d) => d.to_string(),
            None => self.archive.name().to_string(),
        }
    }

    pub fn archive(&self) -> &Arc<ArchiveReference> {
        &self.archive
    }

    pub fn loader(&self) -> &Arc<Loader> {
        &self.loader
    }

    pub fn parents(&self) -> &[Arc<ArchiveHandle>] {
        &self.parents
    }
}
