use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::error::{BootError, BootResult};

/// Immutable identity of a versioned artifact; the cache key everywhere.
///
/// Supported formats:
///   `group:artifact:version`
///   `group:artifact:version:classifier`
///   `group:artifact:version[:classifier]@extension`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactDescriptor {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension of the binary. Defaults to `"jar"`.
    pub extension: String,
}

impl ArtifactDescriptor {
    pub fn new(group: &str, artifact: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
            classifier: None,
            extension: "jar".to_string(),
        }
    }

    /// Parse a descriptor string.
    ///
    /// # Examples
    /// ```
    /// use patchboot_lib::core::maven::ArtifactDescriptor;
    /// let d = ArtifactDescriptor::parse("demo:app:1.0").unwrap();
    /// assert_eq!(d.group, "demo");
    /// ```
    pub fn parse(coord: &str) -> BootResult<Self> {
        let (coord_part, extension) = match coord.rsplit_once('@') {
            Some((head, ext)) if !ext.is_empty() => (head, ext),
            Some(_) => return Err(BootError::InvalidDescriptor(coord.to_string())),
            None => (coord, "jar"),
        };

        let parts: Vec<&str> = coord_part.split(':').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(BootError::InvalidDescriptor(coord.to_string()));
        }

        let classifier = match parts.len() {
            3 => None,
            4 => Some(parts[3].to_string()),
            _ => return Err(BootError::InvalidDescriptor(coord.to_string())),
        };

        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier,
            extension: extension.to_string(),
        })
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }

    /// Return a copy with the extension changed (e.g. to `"pom"`).
    pub fn with_extension(&self, extension: &str) -> Self {
        let mut clone = self.clone();
        clone.extension = extension.to_string();
        clone
    }

    /// Group segments as a relative path (`net/example/tools`).
    pub fn group_path(&self) -> String {
        self.group.replace('.', "/")
    }

    /// `artifact-version[-classifier]`
    pub fn base_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{}", self.artifact, self.version, c),
            None => format!("{}-{}", self.artifact, self.version),
        }
    }

    /// `artifact-version[-classifier].extension`
    pub fn filename(&self) -> String {
        format!("{}.{}", self.base_name(), self.extension)
    }

    /// Full URL of this artifact under a repository base.
    pub fn url(&self, repo_base: &str) -> String {
        let base = repo_base.trim_end_matches('/');
        format!(
            "{}/{}/{}/{}/{}",
            base,
            self.group_path(),
            self.artifact,
            self.version,
            self.filename()
        )
    }

    /// Directory holding this artifact relative to a cache root.
    pub fn local_dir(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in self.group.split('.') {
            path.push(segment);
        }
        path.join(&self.artifact).join(&self.version)
    }

    /// Cache-relative path of the binary:
    /// `<group segments>/<artifact>/<version>/<filename>`
    pub fn local_path(&self) -> PathBuf {
        self.local_dir().join(self.filename())
    }
}

impl fmt::Display for ArtifactDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_descriptor() {
        let d = ArtifactDescriptor::parse("net.sf.jopt-simple:jopt-simple:5.0.4").unwrap();
        assert_eq!(d.group, "net.sf.jopt-simple");
        assert_eq!(d.artifact, "jopt-simple");
        assert_eq!(d.version, "5.0.4");
        assert_eq!(d.classifier, None);
        assert_eq!(d.extension, "jar");
    }

    #[test]
    fn parse_with_classifier_and_extension() {
        let d = ArtifactDescriptor::parse("org.lwjgl:lwjgl:3.3.3:natives-linux@zip").unwrap();
        assert_eq!(d.classifier.as_deref(), Some("natives-linux"));
        assert_eq!(d.extension, "zip");
        assert_eq!(d.to_string(), "org.lwjgl:lwjgl:3.3.3:natives-linux@zip");
    }

    #[test]
    fn rejects_malformed_descriptors() {
        assert!(ArtifactDescriptor::parse("only:two").is_err());
        assert!(ArtifactDescriptor::parse("a::1.0").is_err());
        assert!(ArtifactDescriptor::parse("a:b:1.0@").is_err());
    }

    #[test]
    fn url_construction() {
        let d = ArtifactDescriptor::parse("demo.group:app:1.0").unwrap();
        assert_eq!(
            d.url("https://repo.example.com/maven/"),
            "https://repo.example.com/maven/demo/group/app/1.0/app-1.0.jar"
        );
    }

    #[test]
    fn local_path_construction() {
        let d = ArtifactDescriptor::parse("org.lwjgl:lwjgl:3.3.3:natives-windows").unwrap();
        assert_eq!(
            d.local_path(),
            PathBuf::from("org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-windows.jar")
        );
    }
}
