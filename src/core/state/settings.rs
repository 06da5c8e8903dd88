use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{BootError, BootResult};
use crate::core::maven::{ArtifactDescriptor, RepositorySettings, DEFAULT_SCOPES};
use crate::core::resolver::ResolveRequest;

const APP_DIR_NAME: &str = "patchboot";
const SETTINGS_FILE: &str = "settings.json";

/// Environment variable naming the settings file.
pub const SETTINGS_ENV: &str = "PATCHBOOT_SETTINGS";

/// Everything one bootstrap run needs, read from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapSettings {
    pub target_version: String,
    pub repository: RepositorySettings,
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    #[serde(default = "default_provider_group")]
    pub provider_group: String,
    #[serde(default = "default_provider_version")]
    pub provider_version: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_true")]
    pub apply_default_args: bool,
    #[serde(default = "default_include_scopes")]
    pub include_scopes: Vec<String>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Coordinates of mixin extension artifacts to install.
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn default_cache_path() -> PathBuf {
    default_base_dir().join("cache")
}

fn default_provider_group() -> String {
    "net.patchboot.target".to_string()
}

fn default_provider_version() -> String {
    "1.0-SNAPSHOT".to_string()
}

fn default_true() -> bool {
    true
}

fn default_include_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

fn default_concurrency() -> usize {
    8
}

impl BootstrapSettings {
    pub fn new(target_version: &str, repository: RepositorySettings) -> Self {
        Self {
            target_version: target_version.to_string(),
            repository,
            cache_path: default_cache_path(),
            provider_group: default_provider_group(),
            provider_version: default_provider_version(),
            args: Vec::new(),
            apply_default_args: true,
            include_scopes: default_include_scopes(),
            concurrency: default_concurrency(),
            extensions: Vec::new(),
        }
    }

    pub fn from_json(raw: &str) -> BootResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub async fn load(path: &Path) -> BootResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BootError::io(path, e))?;
        let settings = Self::from_json(&raw)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub async fn save(&self, path: &Path) -> BootResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        crate::core::downloader::write_atomic(path, json.as_bytes()).await
    }

    /// Settings file for this run: the first argument, else `$PATCHBOOT_SETTINGS`,
    /// else `settings.json` in the data directory.
    pub fn locate(args: &[String]) -> PathBuf {
        args.first()
            .map(PathBuf::from)
            .or_else(|| std::env::var_os(SETTINGS_ENV).map(PathBuf::from))
            .unwrap_or_else(|| default_base_dir().join(SETTINGS_FILE))
    }

    /// `{provider_group}:target-provider-{target_version}:{provider_version}`.
    pub fn provider_descriptor(&self) -> BootResult<ArtifactDescriptor> {
        let descriptor = ArtifactDescriptor::new(
            &self.provider_group,
            &format!("target-provider-{}", self.target_version),
            &self.provider_version,
        );
        if descriptor.group.is_empty() || descriptor.version.is_empty() || self.target_version.is_empty() {
            return Err(BootError::InvalidDescriptor(descriptor.to_string()));
        }
        Ok(descriptor)
    }

    pub fn provider_request(&self) -> BootResult<ResolveRequest> {
        Ok(self.request(self.provider_descriptor()?))
    }

    pub fn extension_requests(&self) -> BootResult<Vec<ResolveRequest>> {
        self.extensions
            .iter()
            .map(|coord| Ok(self.request(ArtifactDescriptor::parse(coord)?)))
            .collect()
    }

    fn request(&self, descriptor: ArtifactDescriptor) -> ResolveRequest {
        let scopes: Vec<&str> = self.include_scopes.iter().map(String::as_str).collect();
        ResolveRequest::new(descriptor).with_scopes(&scopes)
    }
}
