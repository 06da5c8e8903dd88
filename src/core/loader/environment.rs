// ─── Execution Environment ───
// Loaders are explicit ordered lists of named lookup scopes. A unit found in
// a loader's own archives is defined (and cached) by that loader; a unit found
// through a parent is the parent's definition, shared by every child.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use super::unit::LoadedUnit;
use crate::core::archive::ArchiveReference;
use crate::core::error::{BootError, BootResult};

/// One step of a loader's lookup order.
#[derive(Debug)]
pub enum LookupScope {
    /// The loader's own archives, searched in order. Definitions are private.
    Local {
        name: String,
        sources: Vec<Arc<ArchiveReference>>,
    },
    /// A parent environment.
    Delegate(Arc<Loader>),
    /// The fixed root every environment ends at.
    System(Arc<Loader>),
}

impl LookupScope {
    pub fn name(&self) -> &str {
        match self {
            LookupScope::Local { name, .. } => name,
            LookupScope::Delegate(loader) | LookupScope::System(loader) => loader.name(),
        }
    }
}

#[derive(Debug)]
pub struct Loader {
    name: String,
    scopes: Vec<LookupScope>,
    defined: Mutex<HashMap<String, Arc<LoadedUnit>>>,
}

impl Loader {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scopes(&self) -> &[LookupScope] {
        &self.scopes
    }

    /// Scope names in lookup order.
    pub fn scope_names(&self) -> Vec<String> {
        self.scopes.iter().map(|s| s.name().to_string()).collect()
    }

    /// Look up a unit. `None` means no scope has it, which callers may treat
    /// as a cue to try another source.
    pub fn find_unit(&self, unit: &str) -> Option<Arc<LoadedUnit>> {
        if let Some(found) = self.defined_unit(unit) {
            return Some(found);
        }

        for scope in &self.scopes {
            let found = match scope {
                LookupScope::Local { sources, .. } => sources
                    .iter()
                    .find_map(|archive| archive.reader().unit(unit))
                    .map(|bytes| self.define(unit, bytes)),
                LookupScope::Delegate(parent) | LookupScope::System(parent) => {
                    parent.find_unit(unit)
                }
            };

            if found.is_some() {
                trace!("{} resolved {} via scope {}", self.name, unit, scope.name());
                return found;
            }
        }

        None
    }

    pub fn load_unit(&self, unit: &str) -> BootResult<Arc<LoadedUnit>> {
        self.find_unit(unit).ok_or_else(|| BootError::UnitNotFound {
            unit: unit.to_string(),
            loader: self.name.clone(),
        })
    }

    /// Already-defined unit of this loader, without triggering a lookup.
    pub fn defined_unit(&self, unit: &str) -> Option<Arc<LoadedUnit>> {
        self.defined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(unit)
            .cloned()
    }

    /// Look up a plain resource entry in lookup order.
    pub fn resource(&self, entry: &str) -> Option<Arc<[u8]>> {
        self.scopes.iter().find_map(|scope| match scope {
            LookupScope::Local { sources, .. } => {
                sources.iter().find_map(|archive| archive.reader().get(entry))
            }
            LookupScope::Delegate(parent) | LookupScope::System(parent) => parent.resource(entry),
        })
    }

    fn define(&self, unit: &str, bytes: Arc<[u8]>) -> Arc<LoadedUnit> {
        let mut defined = self.defined.lock().unwrap_or_else(PoisonError::into_inner);
        defined
            .entry(unit.to_string())
            .or_insert_with(|| LoadedUnit::define(unit, &self.name, bytes))
            .clone()
    }
}

/// Builds loaders that all end at the same system root.
#[derive(Debug, Clone)]
pub struct ExecutionEnvironment {
    system: Arc<Loader>,
}

impl ExecutionEnvironment {
    pub const SYSTEM_NAME: &'static str = "system";

    /// Environment whose system root serves `sources`.
    pub fn new(sources: Vec<Arc<ArchiveReference>>) -> Self {
        Self {
            system: Arc::new(Loader {
                name: Self::SYSTEM_NAME.to_string(),
                scopes: vec![LookupScope::Local {
                    name: Self::SYSTEM_NAME.to_string(),
                    sources,
                }],
                defined: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn system(&self) -> &Arc<Loader> {
        &self.system
    }

    /// Compose a loader: `archives` in order, then each distinct parent in the
    /// given order, then the system root.
    pub fn compose(
        &self,
        name: &str,
        archives: Vec<Arc<ArchiveReference>>,
        parents: &[Arc<Loader>],
    ) -> Arc<Loader> {
        let mut scopes = vec![LookupScope::Local {
            name: name.to_string(),
            sources: archives,
        }];

        let mut seen: Vec<&Arc<Loader>> = Vec::new();
        for parent in parents {
            if Arc::ptr_eq(parent, &self.system) || seen.iter().any(|s| Arc::ptr_eq(s, parent)) {
                continue;
            }
            seen.push(parent);
            scopes.push(LookupScope::Delegate(parent.clone()));
        }

        scopes.push(LookupScope::System(self.system.clone()));

        Arc::new(Loader {
            name: name.to_string(),
            scopes,
            defined: Mutex::new(HashMap::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(name: &str, units: &[(&str, &str)]) -> Arc<ArchiveReference> {
        ArchiveReference::from_entries(
            name,
            units.iter().map(|(unit, body)| {
                (crate::core::archive::unit_entry_name(unit), body.as_bytes().to_vec())
            }),
        )
    }

    #[test]
    fn first_local_archive_wins() {
        let env = ExecutionEnvironment::empty();
        let loader = env.compose(
            "app",
            vec![archive("patch", &[("a.X", "patched")]), archive("base", &[("a.X", "base")])],
            &[],
        );
        assert_eq!(&*loader.load_unit("a.X").unwrap().bytes(), b"patched");
    }

    #[test]
    fn parent_definitions_are_shared_local_ones_are_private() {
        let env = ExecutionEnvironment::empty();
        let lib = env.compose("lib", vec![archive("lib", &[("lib.Shared", "s")])], &[]);
        let a = env.compose("a", vec![archive("a", &[("own.Unit", "a")])], &[lib.clone()]);
        let b = env.compose("b", vec![archive("b", &[("own.Unit", "b")])], &[lib.clone()]);

        let from_a = a.load_unit("lib.Shared").unwrap();
        let from_b = b.load_unit("lib.Shared").unwrap();
        assert!(Arc::ptr_eq(&from_a, &from_b));
        assert_eq!(from_a.defined_by(), "lib");

        let own_a = a.load_unit("own.Unit").unwrap();
        let own_b = b.load_unit("own.Unit").unwrap();
        assert!(!Arc::ptr_eq(&own_a, &own_b));
        assert_eq!(&*own_a.bytes(), b"a");
        assert!(lib.defined_unit("own.Unit").is_none());
    }

    #[test]
    fn child_shadows_parent() {
        let env = ExecutionEnvironment::empty();
        let lib = env.compose("lib", vec![archive("lib", &[("x.Y", "parent")])], &[]);
        let app = env.compose("app", vec![archive("app", &[("x.Y", "child")])], &[lib]);
        assert_eq!(&*app.load_unit("x.Y").unwrap().bytes(), b"child");
    }

    #[test]
    fn parents_are_searched_in_order_then_system() {
        let env = ExecutionEnvironment::new(vec![archive("jdk", &[("sys.Object", "root")])]);
        let first = env.compose("first", vec![archive("f", &[("dup.Unit", "first")])], &[]);
        let second = env.compose("second", vec![archive("s", &[("dup.Unit", "second")])], &[]);
        let app = env.compose(
            "app",
            vec![],
            &[first.clone(), second.clone(), first.clone(), env.system().clone()],
        );

        assert_eq!(app.scope_names(), vec!["app", "first", "second", "system"]);
        assert_eq!(&*app.load_unit("dup.Unit").unwrap().bytes(), b"first");
        assert_eq!(app.load_unit("sys.Object").unwrap().defined_by(), "system");
    }

    #[test]
    fn exhausted_lookup_is_recoverable() {
        let env = ExecutionEnvironment::empty();
        let app = env.compose("app", vec![], &[]);
        assert!(app.find_unit("missing.Unit").is_none());
        assert!(matches!(
            app.load_unit("missing.Unit"),
            Err(BootError::UnitNotFound { .. })
        ));
    }

    #[test]
    fn resources_follow_lookup_order() {
        let env = ExecutionEnvironment::empty();
        let lib = env.compose(
            "lib",
            vec![ArchiveReference::from_entries("lib", [("META-INF/x", b"lib".to_vec())])],
            &[],
        );
        let app = env.compose("app", vec![], &[lib]);
        assert_eq!(&*app.resource("META-INF/x").unwrap(), b"lib");
        assert!(app.resource("META-INF/y").is_none());
    }
}
