pub mod bootstrap;
pub mod core;

use tracing_subscriber::EnvFilter;

use crate::bootstrap::Bootstrapper;
use crate::core::error::BootResult;
use crate::core::provider::ProviderRegistry;
use crate::core::state::BootstrapSettings;
use crate::core::target::{BootSession, LocalTargetProvider};

/// Registry holding the providers built into this crate.
pub fn default_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register_provider(LocalTargetProvider::NAME, || Box::new(LocalTargetProvider));
    registry
}

/// Read settings (path from `args`), bootstrap and start the target.
pub async fn run(args: Vec<String>) -> BootResult<BootSession> {
    // Initialize structured logging
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,patchboot_lib=debug")),
        )
        .try_init();

    tracing::info!("patchboot starting...");

    let path = BootstrapSettings::locate(&args);
    let settings = BootstrapSettings::load(&path).await?;

    Bootstrapper::new(settings, default_registry()).launch().await
}
