use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::artifact::ArtifactDescriptor;
use super::pom::PomDocument;
use crate::core::downloader::{Checksum, Downloader, HashType};
use crate::core::error::{BootError, BootResult};
use crate::core::resolver::PlatformRules;

/// Where a repository lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    /// HTTP(S) base URL.
    Remote,
    /// Directory laid out like a Maven repository.
    Local,
}

/// Endpoint plus preferred checksum algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    pub kind: RepositoryKind,
    pub location: String,
    #[serde(default)]
    pub preferred_hash: HashType,
}

impl RepositorySettings {
    pub fn remote(url: impl Into<String>, preferred_hash: HashType) -> Self {
        Self {
            kind: RepositoryKind::Remote,
            location: url.into(),
            preferred_hash,
        }
    }

    pub fn local(path: impl Into<String>, preferred_hash: HashType) -> Self {
        Self {
            kind: RepositoryKind::Local,
            location: path.into(),
            preferred_hash,
        }
    }
}

/// Declared location of an artifact's binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResource {
    pub location: String,
    pub checksum: Option<Checksum>,
}

/// Edge to a child artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildDescriptor {
    pub descriptor: ArtifactDescriptor,
    pub scope: String,
    #[serde(default)]
    pub optional: bool,
}

impl ChildDescriptor {
    pub fn compile(descriptor: ArtifactDescriptor) -> Self {
        Self {
            descriptor,
            scope: "compile".to_string(),
            optional: false,
        }
    }
}

/// What a repository knows about one descriptor.
#[derive(Debug, Clone, Default)]
pub struct ArtifactMetadata {
    /// `None` for metadata-only artifacts (pom packaging).
    pub resource: Option<RemoteResource>,
    pub children: Vec<ChildDescriptor>,
    pub rules: PlatformRules,
}

/// Repository protocol consumed by the resolver and the resource cache.
#[async_trait]
pub trait Repository: Send + Sync {
    fn name(&self) -> &str;

    async fn metadata(&self, descriptor: &ArtifactDescriptor) -> BootResult<ArtifactMetadata>;

    async fn fetch(&self, resource: &RemoteResource) -> BootResult<Vec<u8>>;
}

/// Maven-layout repository backed by HTTP or a local directory.
pub struct MavenRepository {
    settings: RepositorySettings,
    downloader: Downloader,
}

impl MavenRepository {
    pub fn new(settings: RepositorySettings, downloader: Downloader) -> Self {
        Self {
            settings,
            downloader,
        }
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    fn location_of(&self, descriptor: &ArtifactDescriptor) -> String {
        match self.settings.kind {
            RepositoryKind::Remote => descriptor.url(&self.settings.location),
            RepositoryKind::Local => PathBuf::from(&self.settings.location)
                .join(descriptor.local_path())
                .to_string_lossy()
                .to_string(),
        }
    }

    async fn read_text(&self, location: &str) -> BootResult<Option<String>> {
        match self.settings.kind {
            RepositoryKind::Remote => self.downloader.fetch_text(location).await,
            RepositoryKind::Local => match tokio::fs::read_to_string(location).await {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(BootError::io(location, e)),
            },
        }
    }

    async fn checksum_for(&self, location: &str) -> Option<Checksum> {
        let hash = self.settings.preferred_hash;
        let sidecar = format!("{}.{}", location, hash.extension());
        match self.read_text(&sidecar).await {
            Ok(Some(body)) => Checksum::from_sidecar(hash, &body),
            Ok(None) => None,
            Err(e) => {
                debug!("Checksum sidecar unavailable at {}: {}", sidecar, e);
                None
            }
        }
    }

    fn children_of(pom: &PomDocument) -> Vec<ChildDescriptor> {
        let mut children = Vec::new();
        let Some(deps) = &pom.dependencies else {
            return children;
        };

        for dep in &deps.items {
            let Some(version) = pom.resolve_version(dep) else {
                warn!(
                    "Cannot resolve version for {}:{} (skipping)",
                    dep.group_id, dep.artifact_id
                );
                continue;
            };

            let mut descriptor = ArtifactDescriptor::new(
                &pom.interpolate(&dep.group_id),
                &dep.artifact_id,
                &version,
            );
            if let Some(classifier) = &dep.classifier {
                descriptor = descriptor.with_classifier(classifier);
            }
            if let Some(ext) = dep.dep_type.as_deref() {
                descriptor = descriptor.with_extension(ext);
            }

            children.push(ChildDescriptor {
                descriptor,
                scope: dep.scope().to_string(),
                optional: dep.is_optional(),
            });
        }

        children
    }
}

#[async_trait]
impl Repository for MavenRepository {
    fn name(&self) -> &str {
        &self.settings.location
    }

    async fn metadata(&self, descriptor: &ArtifactDescriptor) -> BootResult<ArtifactMetadata> {
        let pom_location = self.location_of(&descriptor.with_extension("pom"));

        let pom = match self.read_text(&pom_location).await? {
            Some(xml) => Some(PomDocument::parse(&xml)?),
            None => {
                // Many repositories publish bare binaries without a POM.
                debug!("No POM for {} at {}", descriptor, pom_location);
                None
            }
        };

        let pom_only = descriptor.extension == "pom"
            || pom
                .as_ref()
                .and_then(|p| p.packaging.as_deref())
                .is_some_and(|p| p == "pom");

        let resource = if pom_only {
            None
        } else {
            let location = self.location_of(descriptor);
            let checksum = self.checksum_for(&location).await;
            Some(RemoteResource { location, checksum })
        };

        Ok(ArtifactMetadata {
            resource,
            children: pom.as_ref().map(Self::children_of).unwrap_or_default(),
            rules: PlatformRules::default(),
        })
    }

    async fn fetch(&self, resource: &RemoteResource) -> BootResult<Vec<u8>> {
        match self.settings.kind {
            RepositoryKind::Remote => {
                self.downloader
                    .fetch(&resource.location, resource.checksum.as_ref())
                    .await
            }
            RepositoryKind::Local => {
                let bytes = tokio::fs::read(&resource.location)
                    .await
                    .map_err(|e| BootError::io(&resource.location, e))?;
                if let Some(checksum) = &resource.checksum {
                    checksum.verify(&resource.location, &bytes)?;
                }
                Ok(bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_repo(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("patchboot-repo-{}-{}", tag, uuid::Uuid::new_v4()))
    }

    fn local_repository(root: &PathBuf) -> MavenRepository {
        MavenRepository::new(
            RepositorySettings::local(root.to_string_lossy(), HashType::Sha1),
            Downloader::with_client(reqwest::Client::new()),
        )
    }

    #[tokio::test]
    async fn local_repository_reads_pom_children_and_checksum() {
        let root = temp_repo("local");
        let app = ArtifactDescriptor::parse("demo:app:1.0").unwrap();
        let dir = root.join(app.local_dir());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("app-1.0.jar"), b"abc").unwrap();
        std::fs::write(
            dir.join("app-1.0.jar.sha1"),
            "a9993e364706816aba3e25717850c26c9cd0d89d",
        )
        .unwrap();
        std::fs::write(
            dir.join("app-1.0.pom"),
            r#"<project><dependencies><dependency>
                <groupId>demo</groupId><artifactId>lib</artifactId><version>2.0</version>
            </dependency></dependencies></project>"#,
        )
        .unwrap();

        let repo = local_repository(&root);
        let meta = repo.metadata(&app).await.unwrap();

        assert_eq!(meta.children.len(), 1);
        assert_eq!(meta.children[0].descriptor.to_string(), "demo:lib:2.0");
        assert_eq!(meta.children[0].scope, "compile");
        let resource = meta.resource.unwrap();
        assert!(resource.checksum.is_some());
        assert_eq!(repo.fetch(&resource).await.unwrap(), b"abc");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn pom_packaging_has_no_binary() {
        let root = temp_repo("bom");
        let bom = ArtifactDescriptor::parse("demo:bom:1.0").unwrap();
        let dir = root.join(bom.local_dir());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("bom-1.0.pom"),
            "<project><packaging>pom</packaging></project>",
        )
        .unwrap();

        let meta = local_repository(&root).metadata(&bom).await.unwrap();
        assert!(meta.resource.is_none());
        assert!(meta.children.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }
}
