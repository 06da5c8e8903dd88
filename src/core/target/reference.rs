use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::archive::ArchiveReference;
use crate::core::mixin::SymbolContext;

/// Readable → archive unit names, parsed from ProGuard-style class lines
/// (`net.demo.Main -> a:`). Indented member lines are ignored.
#[derive(Debug, Clone, Default)]
pub struct SymbolMappings {
    units: HashMap<String, String>,
}

impl SymbolMappings {
    pub fn parse(text: &str) -> Self {
        let units = text
            .lines()
            .filter(|line| !line.starts_with(char::is_whitespace) && !line.starts_with('#'))
            .filter_map(|line| {
                let (readable, mapped) = line.split_once(" -> ")?;
                let mapped = mapped.trim().strip_suffix(':')?;
                Some((readable.trim().to_string(), mapped.trim().to_string()))
            })
            .collect();
        Self { units }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            units: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn map(&self, readable: &str) -> Option<&str> {
        self.units.get(readable).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Where the target keeps its assets and working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub assets_dir: PathBuf,
    pub assets_name: String,
    pub game_dir: PathBuf,
}

/// Everything needed to load one version of the target program.
#[derive(Debug)]
pub struct TargetReference {
    version: String,
    archive: Arc<ArchiveReference>,
    mappings: SymbolMappings,
    libraries: Vec<Arc<ArchiveReference>>,
    runtime_info: RuntimeInfo,
}

impl TargetReference {
    pub fn new(
        version: &str,
        archive: Arc<ArchiveReference>,
        mappings: SymbolMappings,
        libraries: Vec<Arc<ArchiveReference>>,
        runtime_info: RuntimeInfo,
    ) -> Self {
        Self {
            version: version.to_string(),
            archive,
            mappings,
            libraries,
            runtime_info,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn archive(&self) -> &Arc<ArchiveReference> {
        &self.archive
    }

    pub fn mappings(&self) -> &SymbolMappings {
        &self.mappings
    }

    pub fn libraries(&self) -> &[Arc<ArchiveReference>] {
        &self.libraries
    }

    pub fn runtime_info(&self) -> &RuntimeInfo {
        &self.runtime_info
    }

    /// Name of `unit` inside the archive, after mapping.
    pub fn archive_unit_name(&self, unit: &str) -> String {
        self.mappings.map(unit).unwrap_or(unit).to_string()
    }

    /// Libraries followed by the target archive.
    pub fn symbols(&self) -> SymbolContext<'_> {
        SymbolContext::new(
            self.libraries
                .iter()
                .chain(std::iter::once(&self.archive))
                .map(Arc::as_ref),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_class_lines_only() {
        let mappings = SymbolMappings::parse(
            "# compiler: R8\nnet.demo.Main -> a:\n    int count -> b\n    void run() -> c\nnet.demo.Util -> d:\n",
        );
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings.map("net.demo.Main"), Some("a"));
        assert_eq!(mappings.map("net.demo.Util"), Some("d"));
        assert_eq!(mappings.map("net.demo.Other"), None);
    }

    #[test]
    fn unmapped_names_pass_through() {
        let archive = ArchiveReference::from_entries("t", [("a.class", b"x".to_vec())]);
        let reference = TargetReference::new(
            "1.0",
            archive,
            SymbolMappings::from_pairs([("net.demo.Main", "a")]),
            Vec::new(),
            RuntimeInfo::default(),
        );
        assert_eq!(reference.archive_unit_name("net.demo.Main"), "a");
        assert_eq!(reference.archive_unit_name("net.demo.Plain"), "net.demo.Plain");
    }
}
