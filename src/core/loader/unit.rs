use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::core::error::BootResult;

/// A code unit defined by a loader. Identity is the `Arc` itself: every
/// lookup that ends at the same defining loader yields the same allocation.
#[derive(Debug)]
pub struct LoadedUnit {
    name: String,
    defined_by: String,
    implementation: RwLock<Arc<[u8]>>,
    redefinitions: AtomicU32,
}

impl LoadedUnit {
    pub(crate) fn define(name: &str, defined_by: &str, bytes: Arc<[u8]>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            defined_by: defined_by.to_string(),
            implementation: RwLock::new(bytes),
            redefinitions: AtomicU32::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the loader that defined this unit.
    pub fn defined_by(&self) -> &str {
        &self.defined_by
    }

    /// Current implementation.
    pub fn bytes(&self) -> Arc<[u8]> {
        self.implementation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times the implementation has been swapped.
    pub fn redefinitions(&self) -> u32 {
        self.redefinitions.load(Ordering::SeqCst)
    }

    /// Replace the implementation in place. Callers go through a [`Redefiner`].
    pub fn swap_implementation(&self, bytes: Vec<u8>) {
        let mut guard = self
            .implementation
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::from(bytes);
        self.redefinitions.fetch_add(1, Ordering::SeqCst);
    }
}

/// Performs live replacement of an already-defined unit. Implementations own
/// the responsibility of keeping the target out of the unit while swapping.
pub trait Redefiner: Send + Sync {
    fn redefine(&self, unit: &LoadedUnit, bytes: Vec<u8>) -> BootResult<()>;
}

/// Swaps the implementation under the unit's write lock; readers holding an
/// older `Arc` finish with the old bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveRedefiner;

impl Redefiner for LiveRedefiner {
    fn redefine(&self, unit: &LoadedUnit, bytes: Vec<u8>) -> BootResult<()> {
        debug!(
            "Redefining {} (defined by {}, {} bytes)",
            unit.name(),
            unit.defined_by(),
            bytes.len()
        );
        unit.swap_implementation(bytes);
        Ok(())
    }
}
