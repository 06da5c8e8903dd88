// ─── Bootstrapper ───
// settings → repository → provider artifact → provider → target reference
// → session, with any configured mixin extensions installed.

use tracing::{info, warn};

use crate::core::archive::ArchiveHandle;
use crate::core::downloader::Downloader;
use crate::core::error::{BootError, BootResult};
use crate::core::loader::ExecutionEnvironment;
use crate::core::maven::{MavenRepository, Repository};
use crate::core::provider::{discover_extension, discover_provider, ProviderRegistry};
use crate::core::resolver::{ArchiveGraph, DependencyResolver, ResolveRequest};
use crate::core::state::BootstrapSettings;
use crate::core::target::BootSession;

pub struct Bootstrapper {
    settings: BootstrapSettings,
    registry: ProviderRegistry,
    environment: ExecutionEnvironment,
}

impl Bootstrapper {
    pub fn new(settings: BootstrapSettings, registry: ProviderRegistry) -> Self {
        Self {
            settings,
            registry,
            environment: ExecutionEnvironment::empty(),
        }
    }

    pub fn with_environment(mut self, environment: ExecutionEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn settings(&self) -> &BootstrapSettings {
        &self.settings
    }

    /// Repository described by the settings.
    pub fn repository(&self) -> BootResult<MavenRepository> {
        let downloader = Downloader::new()?;
        Ok(MavenRepository::new(self.settings.repository.clone(), downloader))
    }

    fn resolver(&self) -> DependencyResolver {
        DependencyResolver::new(&self.settings.cache_path).with_concurrency(self.settings.concurrency)
    }

    /// Bootstrap against the configured repository.
    pub async fn bootstrap(&self) -> BootResult<BootSession> {
        let repository = self.repository()?;
        self.bootstrap_with(&repository).await
    }

    pub async fn bootstrap_with(&self, repository: &dyn Repository) -> BootResult<BootSession> {
        let resolver = self.resolver();

        let request = self.settings.provider_request()?;
        let graph = resolver
            .resolve_archives(&request, repository, &self.environment)
            .await?;
        let provider = discover_provider(primary_handle(&graph, &request)?, &self.registry)?;

        info!(
            "Obtaining target {} from provider {}",
            self.settings.target_version,
            provider.name()
        );
        let reference = provider
            .reference(&self.settings.target_version, &self.settings.cache_path)
            .await?;

        let mut session = BootSession::new(
            provider,
            reference,
            self.settings.args.clone(),
            self.settings.apply_default_args,
        )
        .with_environment(self.environment.clone());

        for request in self.settings.extension_requests()? {
            let graph = resolver
                .resolve_archives(&request, repository, &self.environment)
                .await?;
            let extension = discover_extension(primary_handle(&graph, &request)?, &self.registry)?;
            let count = session.install_extension(extension.as_ref())?;
            info!("Installed extension {} ({} mixin(s))", extension.name(), count);
        }

        Ok(session)
    }

    /// Bootstrap, apply mixins before load, load under the system root and start.
    pub async fn launch(&self) -> BootResult<BootSession> {
        let mut session = self.bootstrap().await?;

        let report = session.flush_mixins();
        for failure in &report.failed {
            warn!("{}", failure);
        }
        report.into_result()?;

        session.load_under_system()?;
        session.start()?;
        Ok(session)
    }
}

/// The requested artifact's own handle, or the first one standing in for it.
fn primary_handle<'g>(graph: &'g ArchiveGraph, request: &ResolveRequest) -> BootResult<&'g ArchiveHandle> {
    graph
        .find(&request.descriptor)
        .or_else(|| graph.roots().first())
        .map(|h| h.as_ref())
        .ok_or_else(|| BootError::ProviderDiscoveryFailed {
            archive: request.descriptor.to_string(),
            reason: "artifact has no archive".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::core::archive::{unit_entry_name, ArchiveReference};
    use crate::core::downloader::HashType;
    use crate::core::loader::Loader;
    use crate::core::maven::RepositorySettings;
    use crate::core::mixin::{Mixin, MixinExtension, TransformConfig};
    use crate::core::provider::PROVIDER_METADATA;
    use crate::core::target::{
        ArchiveTargetHandle, RuntimeInfo, SymbolMappings, TargetHandle, TargetProvider, TargetReference,
    };
    use crate::core::testing::{temp_dir, zip_bytes, MemoryRepository};

    struct DemoProvider;

    #[async_trait]
    impl TargetProvider for DemoProvider {
        fn name(&self) -> &str {
            "demo"
        }

        async fn reference(&self, version: &str, cache: &Path) -> BootResult<TargetReference> {
            let archive = ArchiveReference::from_entries(
                "demo-target.jar",
                [(unit_entry_name("demo.Main"), b"main".to_vec())],
            );
            Ok(TargetReference::new(
                version,
                archive,
                SymbolMappings::default(),
                Vec::new(),
                RuntimeInfo {
                    assets_dir: cache.join("assets"),
                    assets_name: version.to_string(),
                    game_dir: cache.join("game"),
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
                Arc::new(|loader: &Loader, _args: &[String]| loader.load_unit("demo.Main").map(|_| ())),
            )))
        }
    }

    struct DemoExtension;

    impl MixinExtension for DemoExtension {
        fn name(&self) -> &str {
            "demo-ext"
        }

        fn mixins(&self) -> Vec<(String, Box<dyn Mixin>)> {
            let mixin: Box<dyn Mixin> = Box::new(TransformConfig::new().append(b"+patched"));
            vec![("demo.Main".to_string(), mixin)]
        }
    }

    fn metadata_jar(name: &str) -> Option<Vec<u8>> {
        let body = format!("provider-name={}\n", name);
        Some(zip_bytes(&[(PROVIDER_METADATA, body.as_bytes())]))
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry
            .register_provider("demo.Provider", || Box::new(DemoProvider))
            .register_extension("demo.Extension", || Box::new(DemoExtension));
        registry
    }

    fn settings(cache: &Path) -> BootstrapSettings {
        let mut settings = BootstrapSettings::new(
            "1.0",
            RepositorySettings::remote("https://repo.invalid/maven", HashType::Sha1),
        );
        settings.cache_path = cache.to_path_buf();
        settings.apply_default_args = false;
        settings.extensions = vec!["demo:ext:1.0".to_string()];
        settings
    }

    fn repository() -> MemoryRepository {
        MemoryRepository::new()
            .artifact(
                "net.patchboot.target:target-provider-1.0:1.0-SNAPSHOT",
                metadata_jar("demo.Provider"),
                &["demo:support:1.0"],
            )
            .artifact("demo:support:1.0", Some(zip_bytes(&[("demo/Support.class", &b"s"[..])])), &[])
            .artifact("demo:ext:1.0", metadata_jar("demo.Extension"), &[])
    }

    #[tokio::test]
    async fn bootstraps_session_with_extensions() {
        let cache = temp_dir("bootstrap");
        let repo = repository();
        let bootstrapper = Bootstrapper::new(settings(&cache), registry());

        let mut session = bootstrapper.bootstrap_with(&repo).await.unwrap();

        assert_eq!(session.version(), "1.0");
        assert_eq!(session.provider().name(), "demo");
        assert_eq!(session.engine().registered("demo.Main"), 1);
        assert_eq!(repo.fetch_count(), 3);

        assert!(session.flush_mixins().is_success());
        session.load_under_system().unwrap();
        session.start().unwrap();
        let unit = session.handle().unwrap().loader().load_unit("demo.Main").unwrap();
        assert_eq!(&*unit.bytes(), b"main+patched");

        // Everything is cached now.
        let again = bootstrapper.bootstrap_with(&repo).await.unwrap();
        assert_eq!(again.engine().registered("demo.Main"), 1);
        assert_eq!(repo.fetch_count(), 3);

        let _ = std::fs::remove_dir_all(&cache);
    }

    #[tokio::test]
    async fn unregistered_provider_fails_discovery() {
        let cache = temp_dir("bootstrap-unknown");
        let repo = repository();
        let bootstrapper = Bootstrapper::new(settings(&cache), ProviderRegistry::new());

        let err = bootstrapper.bootstrap_with(&repo).await.err().unwrap();

        assert!(matches!(err, BootError::ProviderDiscoveryFailed { .. }));
        let _ = std::fs::remove_dir_all(&cache);
    }
}
