// ─── Local Target Provider ───
// Serves versions already laid out under the cache directory:
//
//   <cache>/<version>/target-<version>.jar
//   <cache>/<version>/target-mappings-<version>.txt   (optional)
//   <cache>/<version>/lib/*.jar
//   <cache>/<version>/assets/
//   <cache>/<version>/game/

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::handle::{ArchiveTargetHandle, TargetHandle, TargetProvider};
use super::reference::{RuntimeInfo, SymbolMappings, TargetReference};
use crate::core::archive::ArchiveReference;
use crate::core::error::{BootError, BootResult};
use crate::core::loader::{ExecutionEnvironment, Loader};
use crate::core::provider::parse_properties;

const MANIFEST: &str = "META-INF/MANIFEST.MF";

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTargetProvider;

impl LocalTargetProvider {
    pub const NAME: &'static str = "patchboot.local";

    pub fn version_dir(cache: &Path, version: &str) -> PathBuf {
        cache.join(version)
    }

    async fn read_mappings(path: &Path) -> BootResult<SymbolMappings> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(SymbolMappings::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SymbolMappings::default()),
            Err(e) => Err(BootError::io(path, e)),
        }
    }

    async fn read_libraries(dir: &Path) -> BootResult<Vec<Arc<ArchiveReference>>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BootError::io(dir, e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| BootError::io(dir, e))? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jar") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut libraries = Vec::with_capacity(paths.len());
        for path in &paths {
            libraries.push(ArchiveReference::open(path).await?);
        }
        Ok(libraries)
    }
}

/// Loads the unit named by the archive manifest's `Main-Class`.
fn manifest_entry(loader: &Loader, args: &[String]) -> BootResult<()> {
    let manifest = loader
        .resource(MANIFEST)
        .ok_or_else(|| BootError::Other(format!("{} not found", MANIFEST)))?;
    let props = parse_properties(&String::from_utf8_lossy(&manifest));
    let main = props
        .get("Main-Class")
        .ok_or_else(|| BootError::Other(format!("{} declares no Main-Class", MANIFEST)))?;

    let unit = loader.load_unit(main)?;
    info!(
        "Entered {} ({} bytes) with args {:?}",
        unit.name(),
        unit.bytes().len(),
        args
    );
    Ok(())
}

#[async_trait]
impl TargetProvider for LocalTargetProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn reference(&self, version: &str, cache: &Path) -> BootResult<TargetReference> {
        let dir = Self::version_dir(cache, version);
        let archive = ArchiveReference::open(&dir.join(format!("target-{}.jar", version))).await?;
        let mappings =
            Self::read_mappings(&dir.join(format!("target-mappings-{}.txt", version))).await?;
        let libraries = Self::read_libraries(&dir.join("lib")).await?;

        debug!(
            "Target {}: {} mapped unit(s), {} librar(ies)",
            version,
            mappings.len(),
            libraries.len()
        );

        Ok(TargetReference::new(
            version,
            archive,
            mappings,
            libraries,
            RuntimeInfo {
                assets_dir: dir.join("assets"),
                assets_name: version.to_string(),
                game_dir: dir.join("game"),
            },
        ))
    }

    fn load(
        &self,
        reference: &TargetReference,
        parent: &Arc<Loader>,
        environment: &ExecutionEnvironment,
    ) -> BootResult<Box<dyn TargetHandle>> {
        Ok(Box::new(ArchiveTargetHandle::new(
            reference,
            parent,
            environment,
            Arc::new(manifest_entry),
        )))
    }
}
