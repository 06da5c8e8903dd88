use std::path::PathBuf;
use thiserror::Error;

use crate::core::maven::ArtifactDescriptor;

/// Central error type for the whole bootstrapper.
/// Every module returns `Result<T, BootError>`.
#[derive(Debug, Error)]
pub enum BootError {
    // ── Resolution ──────────────────────────────────────
    #[error("Failed to fetch resource for {descriptor}: {source}")]
    ResourceFetchFailed {
        descriptor: ArtifactDescriptor,
        #[source]
        source: Box<BootError>,
    },

    #[error("Failed to resolve dependency {descriptor}: {source}")]
    DependencyResolutionFailed {
        descriptor: ArtifactDescriptor,
        #[source]
        source: Box<BootError>,
    },

    // ── Patching ────────────────────────────────────────
    #[error("Target unit '{0}' does not exist in the target archive")]
    TargetUnitNotFound(String),

    #[error("Failed to apply transform to '{target}': {source}")]
    TransformApplicationFailed {
        target: String,
        #[source]
        source: Box<BootError>,
    },

    // ── Extensions ──────────────────────────────────────
    #[error("Provider discovery failed for '{archive}': {reason}")]
    ProviderDiscoveryFailed { archive: String, reason: String },

    // ── Lifecycle ───────────────────────────────────────
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ── Loading ─────────────────────────────────────────
    #[error("Unit '{unit}' not found from loader '{loader}'")]
    UnitNotFound { unit: String, loader: String },

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("{algorithm} mismatch for {location}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        location: String,
        algorithm: &'static str,
        expected: String,
        actual: String,
    },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid artifact descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("POM parse error: {0}")]
    PomParse(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type BootResult<T> = Result<T, BootError>;

impl BootError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BootError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        BootError::InvalidState(message.into())
    }
}

impl From<std::io::Error> for BootError {
    fn from(source: std::io::Error) -> Self {
        BootError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
