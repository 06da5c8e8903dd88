use quick_xml::de::from_str;
use serde::Deserialize;

use crate::core::error::{BootError, BootResult};

/// Minimal POM model – only the fields needed to expand a dependency graph.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PomDocument {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub packaging: Option<String>,
    #[serde(default)]
    pub parent: Option<PomParent>,
    #[serde(default)]
    pub dependencies: Option<PomDependencies>,
    #[serde(default)]
    pub dependency_management: Option<PomDependencyManagement>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PomParent {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct PomDependencies {
    #[serde(default, rename = "dependency")]
    pub items: Vec<PomDependency>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PomDependencyManagement {
    #[serde(default)]
    pub dependencies: Option<PomDependencies>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub optional: Option<bool>,
    #[serde(rename = "type", default)]
    pub dep_type: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
}

impl PomDependency {
    pub fn scope(&self) -> &str {
        self.scope.as_deref().unwrap_or("compile")
    }

    pub fn is_optional(&self) -> bool {
        self.optional.unwrap_or(false)
    }
}

impl PomDocument {
    /// Parse a POM XML string into a `PomDocument`.
    pub fn parse(xml: &str) -> BootResult<Self> {
        from_str(xml).map_err(|e| BootError::PomParse(e.to_string()))
    }

    fn project_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.version.as_str()))
    }

    fn project_group(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Substitute the `${project.*}` placeholders Maven allows in coordinates.
    pub fn interpolate(&self, raw: &str) -> String {
        let mut out = raw.to_string();
        if let Some(v) = self.project_version() {
            out = out
                .replace("${project.version}", v)
                .replace("${version}", v);
        }
        if let Some(g) = self.project_group() {
            out = out.replace("${project.groupId}", g);
        }
        out
    }

    /// Resolve a dependency version, falling back to `dependencyManagement`.
    pub fn resolve_version(&self, dep: &PomDependency) -> Option<String> {
        if let Some(v) = &dep.version {
            return Some(self.interpolate(v));
        }

        self.dependency_management
            .as_ref()
            .and_then(|dm| dm.dependencies.as_ref())
            .and_then(|deps| {
                deps.items.iter().find(|managed| {
                    managed.group_id == dep.group_id && managed.artifact_id == dep.artifact_id
                })
            })
            .and_then(|managed| managed.version.as_deref())
            .map(|v| self.interpolate(v))
    }

    /// Dependencies whose scope is in `scopes`.
    pub fn dependencies_in_scopes<'a>(
        &'a self,
        scopes: &'a [String],
    ) -> impl Iterator<Item = &'a PomDependency> + 'a {
        self.dependencies
            .iter()
            .flat_map(|d| d.items.iter())
            .filter(move |d| scopes.iter().any(|s| s == d.scope()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"
        <project>
            <groupId>com.example</groupId>
            <artifactId>demo</artifactId>
            <version>1.0</version>
            <dependencies>
                <dependency>
                    <groupId>org.lwjgl</groupId>
                    <artifactId>lwjgl</artifactId>
                    <version>3.3.3</version>
                </dependency>
                <dependency>
                    <groupId>com.example</groupId>
                    <artifactId>sibling</artifactId>
                    <version>${project.version}</version>
                    <scope>runtime</scope>
                    <optional>true</optional>
                </dependency>
                <dependency>
                    <groupId>junit</groupId>
                    <artifactId>junit</artifactId>
                    <scope>test</scope>
                </dependency>
            </dependencies>
            <dependencyManagement>
                <dependencies>
                    <dependency>
                        <groupId>junit</groupId>
                        <artifactId>junit</artifactId>
                        <version>4.13</version>
                    </dependency>
                </dependencies>
            </dependencyManagement>
        </project>
    "#;

    #[test]
    fn filters_by_scope() {
        let pom = PomDocument::parse(POM).unwrap();
        let scopes = vec!["compile".to_string(), "runtime".to_string()];
        let names: Vec<_> = pom
            .dependencies_in_scopes(&scopes)
            .map(|d| d.artifact_id.as_str())
            .collect();
        assert_eq!(names, vec!["lwjgl", "sibling"]);
    }

    #[test]
    fn interpolates_and_uses_dependency_management() {
        let pom = PomDocument::parse(POM).unwrap();
        let deps = &pom.dependencies.as_ref().unwrap().items;
        assert_eq!(pom.resolve_version(&deps[1]).as_deref(), Some("1.0"));
        assert!(deps[1].is_optional());
        assert_eq!(pom.resolve_version(&deps[2]).as_deref(), Some("4.13"));
    }
}
