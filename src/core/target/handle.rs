// ─── Target Provider & Handle ───
// A provider knows how to obtain one family of target versions and how to
// load them; the handle is the loaded program.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::reference::TargetReference;
use crate::core::archive::ArchiveReference;
use crate::core::error::{BootError, BootResult};
use crate::core::loader::{ExecutionEnvironment, Loader};

#[async_trait]
pub trait TargetProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Obtain (downloading or reading from `cache`) the reference for `version`.
    async fn reference(&self, version: &str, cache: &Path) -> BootResult<TargetReference>;

    /// Compose a loader for `reference` under `parent`.
    fn load(
        &self,
        reference: &TargetReference,
        parent: &Arc<Loader>,
        environment: &ExecutionEnvironment,
    ) -> BootResult<Box<dyn TargetHandle>>;
}

/// A loaded target program.
pub trait TargetHandle: Send + Sync {
    fn archive(&self) -> &Arc<ArchiveReference>;

    fn loader(&self) -> &Arc<Loader>;

    fn start(&self, args: &[String]) -> BootResult<()>;

    fn shutdown(&self) -> BootResult<()>;
}

/// Called on start with the target's loader and the final arguments.
pub type EntryPoint = Arc<dyn Fn(&Loader, &[String]) -> BootResult<()> + Send + Sync>;

/// Default handle: one loader over `[libraries…, target archive]`.
pub struct ArchiveTargetHandle {
    archive: Arc<ArchiveReference>,
    loader: Arc<Loader>,
    entry: EntryPoint,
    running: AtomicBool,
}

impl ArchiveTargetHandle {
    pub fn new(
        reference: &TargetReference,
        parent: &Arc<Loader>,
        environment: &ExecutionEnvironment,
        entry: EntryPoint,
    ) -> Self {
        let mut sources: Vec<Arc<ArchiveReference>> = reference.libraries().to_vec();
        sources.push(reference.archive().clone());

        let loader = environment.compose(
            &format!("target-{}", reference.version()),
            sources,
            std::slice::from_ref(parent),
        );

        Self {
            archive: reference.archive().clone(),
            loader,
            entry,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ArchiveTargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveTargetHandle")
            .field("archive", &self.archive.name())
            .field("loader", &self.loader.name())
            .field("running", &self.is_running())
            .finish()
    }
}

impl TargetHandle for ArchiveTargetHandle {
    fn archive(&self) -> &Arc<ArchiveReference> {
        &self.archive
    }

    fn loader(&self) -> &Arc<Loader> {
        &self.loader
    }

    fn start(&self, args: &[String]) -> BootResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(BootError::invalid_state("target is already running"));
        }
        info!("Starting {} with {} argument(s)", self.archive.name(), args.len());
        (self.entry)(&self.loader, args).inspect_err(|_| {
            self.running.store(false, Ordering::SeqCst);
        })
    }

    fn shutdown(&self) -> BootResult<()> {
        self.running.store(false, Ordering::SeqCst);
        info!("Stopped {}", self.archive.name());
        Ok(())
    }
}
