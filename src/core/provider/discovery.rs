// ─── Provider Discovery ───
// Reads the metadata resource through an archive handle's own loader and
// instantiates the named registration. Failures are never retried.

use tracing::{debug, info};

use super::properties::parse_properties;
use super::registry::{ProviderRegistry, Registration};
use crate::core::archive::ArchiveHandle;
use crate::core::error::{BootError, BootResult};
use crate::core::mixin::MixinExtension;
use crate::core::target::TargetProvider;

/// Metadata resource every provider archive carries.
pub const PROVIDER_METADATA: &str = "META-INF/target-provider.properties";
/// Key naming the registration to instantiate.
pub const PROVIDER_NAME_KEY: &str = "provider-name";

fn failed(handle: &ArchiveHandle, reason: impl Into<String>) -> BootError {
    BootError::ProviderDiscoveryFailed {
        archive: handle.display_name(),
        reason: reason.into(),
    }
}

fn lookup<'r>(handle: &ArchiveHandle, registry: &'r ProviderRegistry) -> BootResult<(String, &'r Registration)> {
    let bytes = handle
        .loader()
        .resource(PROVIDER_METADATA)
        .ok_or_else(|| failed(handle, format!("missing resource '{}'", PROVIDER_METADATA)))?;

    let text = std::str::from_utf8(&bytes)
        .map_err(|e| failed(handle, format!("'{}' is not UTF-8: {}", PROVIDER_METADATA, e)))?;

    let name = parse_properties(text)
        .remove(PROVIDER_NAME_KEY)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            failed(
                handle,
                format!("'{}' has no '{}' entry", PROVIDER_METADATA, PROVIDER_NAME_KEY),
            )
        })?;

    debug!("{} names provider '{}'", handle.display_name(), name);

    let registration = registry
        .get(&name)
        .ok_or_else(|| failed(handle, format!("no registration named '{}'", name)))?;

    Ok((name, registration))
}

/// Instantiate the target provider an archive declares.
pub fn discover_provider(
    handle: &ArchiveHandle,
    registry: &ProviderRegistry,
) -> BootResult<Box<dyn TargetProvider>> {
    match lookup(handle, registry)? {
        (name, Registration::Provider(factory)) => {
            info!("Discovered target provider '{}' in {}", name, handle.display_name());
            Ok(factory())
        }
        (name, other) => Err(failed(
            handle,
            format!("'{}' is a {}, not a target provider", name, other.capability()),
        )),
    }
}

/// Instantiate the mixin extension an archive declares.
pub fn discover_extension(
    handle: &ArchiveHandle,
    registry: &ProviderRegistry,
) -> BootResult<Box<dyn MixinExtension>> {
    match lookup(handle, registry)? {
        (name, Registration::Extension(factory)) => {
            info!("Discovered mixin extension '{}' in {}", name, handle.display_name());
            Ok(factory())
        }
        (name, other) => Err(failed(
            handle,
            format!("'{}' is a {}, not a mixin extension", name, other.capability()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::core::archive::ArchiveReference;
    use crate::core::loader::{ExecutionEnvironment, Loader};
    use crate::core::mixin::Mixin;
    use crate::core::target::{TargetHandle, TargetReference};

    struct NullProvider;

    #[async_trait]
    impl TargetProvider for NullProvider {
        fn name(&self) -> &str {
            "null"
        }

        async fn reference(&self, version: &str, _cache: &Path) -> BootResult<TargetReference> {
            Err(BootError::Other(format!("no reference for {}", version)))
        }

        fn load(
            &self,
            _reference: &TargetReference,
            _parent: &Arc<Loader>,
            _environment: &ExecutionEnvironment,
        ) -> BootResult<Box<dyn TargetHandle>> {
            Err(BootError::Other("unsupported".into()))
        }
    }

    struct NullExtension;

    impl MixinExtension for NullExtension {
        fn name(&self) -> &str {
            "null-ext"
        }

        fn mixins(&self) -> Vec<(String, Box<dyn Mixin>)> {
            Vec::new()
        }
    }

    fn handle_with(metadata: Option<&str>) -> Arc<ArchiveHandle> {
        let entries: Vec<(String, Vec<u8>)> = metadata
            .map(|m| vec![(PROVIDER_METADATA.to_string(), m.as_bytes().to_vec())])
            .unwrap_or_default();
        let archive = ArchiveReference::from_entries("provider.jar", entries);
        let env = ExecutionEnvironment::empty();
        let loader = env.compose("provider", vec![archive.clone()], &[]);
        ArchiveHandle::new(None, archive, loader, Vec::new())
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry
            .register_provider("demo.Provider", || Box::new(NullProvider))
            .register_extension("demo.Extension", || Box::new(NullExtension));
        registry
    }

    #[test]
    fn instantiates_named_provider() {
        let handle = handle_with(Some("provider-name=demo.Provider\n"));
        let provider = discover_provider(&handle, &registry()).unwrap();
        assert_eq!(provider.name(), "null");
    }

    #[test]
    fn instantiates_named_extension() {
        let handle = handle_with(Some("provider-name: demo.Extension"));
        let extension = discover_extension(&handle, &registry()).unwrap();
        assert_eq!(extension.name(), "null-ext");
    }

    #[test]
    fn every_failure_is_a_discovery_error() {
        let registry = registry();
        let cases = [
            handle_with(None),
            handle_with(Some("other=1")),
            handle_with(Some("provider-name=demo.Unknown")),
            handle_with(Some("provider-name=demo.Extension")),
        ];

        for handle in &cases {
            let err = discover_provider(handle, &registry).err().unwrap();
            assert!(
                matches!(err, BootError::ProviderDiscoveryFailed { ref archive, .. } if archive == "provider.jar"),
                "unexpected {:?}",
                err
            );
        }
    }
}
