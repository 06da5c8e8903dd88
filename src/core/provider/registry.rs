// ─── Provider Registry ───
// Names that archive metadata may reference, mapped to zero-argument
// factories. Populated once at startup, before discovery runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::mixin::MixinExtension;
use crate::core::target::TargetProvider;

pub type ProviderFactory = Arc<dyn Fn() -> Box<dyn TargetProvider> + Send + Sync>;
pub type ExtensionFactory = Arc<dyn Fn() -> Box<dyn MixinExtension> + Send + Sync>;

/// What a registered name can produce.
#[derive(Clone)]
pub enum Registration {
    Provider(ProviderFactory),
    Extension(ExtensionFactory),
}

impl Registration {
    pub fn capability(&self) -> &'static str {
        match self {
            Registration::Provider(_) => "target provider",
            Registration::Extension(_) => "mixin extension",
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.capability())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: HashMap<String, Registration>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target provider factory under `name`, replacing any
    /// previous registration.
    pub fn register_provider<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn TargetProvider> + Send + Sync + 'static,
    {
        self.entries
            .insert(name.to_string(), Registration::Provider(Arc::new(factory)));
        self
    }

    /// Register a mixin extension factory under `name`.
    pub fn register_extension<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn MixinExtension> + Send + Sync + 'static,
    {
        self.entries
            .insert(name.to_string(), Registration::Extension(Arc::new(factory)));
        self
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.entries.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
