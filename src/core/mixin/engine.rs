// ─── Mixin Engine ───
// Per-target mixin lists, merged in registration order at flush time.
// Before load the patched bytes replace the archive entry; after load they
// go through a live redefinition.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::config::TransformConfig;
use super::metadata::Mixin;
use crate::core::error::{BootError, BootResult};
use crate::core::loader::{Loader, Redefiner};
use crate::core::target::TargetReference;

/// Lifecycle of one target unit inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Unregistered,
    /// Transient in this model: the first registration moves a target
    /// straight on to `Dirty`, so `state` never reports it.
    Registered,
    /// Has registrations not reflected in the archive or the live unit.
    Dirty,
    Written,
}

/// The loaded side of a flush.
pub struct LiveTarget<'a> {
    pub loader: &'a Arc<Loader>,
    pub redefiner: &'a dyn Redefiner,
}

/// Outcome of one flush. Failures never block other targets.
#[derive(Debug, Default)]
pub struct FlushReport {
    pub written: Vec<String>,
    pub failed: Vec<BootError>,
}

impl FlushReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// The first failure, if any, as an error.
    pub fn into_result(mut self) -> BootResult<Vec<String>> {
        if self.failed.is_empty() {
            Ok(self.written)
        } else {
            Err(self.failed.remove(0))
        }
    }
}

#[derive(Default)]
pub struct MixinEngine {
    mixins: BTreeMap<String, Vec<Box<dyn Mixin>>>,
    states: HashMap<String, TargetState>,
    // Pristine bytes, captured on first registration; every flush re-applies
    // the full list to these.
    originals: HashMap<String, Arc<[u8]>>,
}

impl MixinEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, target: &str) -> TargetState {
        self.states
            .get(target)
            .copied()
            .unwrap_or(TargetState::Unregistered)
    }

    /// Number of mixins registered against `target`.
    pub fn registered(&self, target: &str) -> usize {
        self.mixins.get(target).map_or(0, Vec::len)
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.mixins.keys().map(String::as_str)
    }

    pub fn dirty(&self) -> Vec<String> {
        self.mixins
            .keys()
            .filter(|t| self.state(t) == TargetState::Dirty)
            .cloned()
            .collect()
    }

    /// Check that `target` exists in the reference's archive and that
    /// `mixin`, if it names a unit, names that one.
    pub fn validate(&self, reference: &TargetReference, target: &str, mixin: &dyn Mixin) -> BootResult<()> {
        check_claim(target, mixin)?;
        let unit = reference.archive_unit_name(target);
        if reference.archive().reader().contains_unit(&unit) {
            Ok(())
        } else {
            Err(BootError::TargetUnitNotFound(target.to_string()))
        }
    }

    /// Append `mixin` to `target`'s list. The engine is left untouched when
    /// the unit does not exist.
    pub fn register(
        &mut self,
        reference: &TargetReference,
        target: &str,
        mixin: Box<dyn Mixin>,
    ) -> BootResult<()> {
        check_claim(target, mixin.as_ref())?;
        let unit = reference.archive_unit_name(target);
        let original = reference
            .archive()
            .reader()
            .unit(&unit)
            .ok_or_else(|| BootError::TargetUnitNotFound(target.to_string()))?;

        self.originals.entry(target.to_string()).or_insert(original);
        self.mixins.entry(target.to_string()).or_default().push(mixin);
        self.states.insert(target.to_string(), TargetState::Dirty);

        debug!(
            "Registered mixin #{} for {}",
            self.registered(target),
            target
        );
        Ok(())
    }

    /// Apply every dirty target, in name order.
    pub fn flush(&mut self, reference: &TargetReference, live: Option<LiveTarget<'_>>) -> FlushReport {
        let mut report = FlushReport::default();
        let dirty = self.dirty();
        if dirty.is_empty() {
            return report;
        }

        info!(
            "Flushing {} mixin target(s) ({})",
            dirty.len(),
            if live.is_some() { "hot-swap" } else { "pre-load" }
        );

        for target in dirty {
            match self.apply_target(reference, &target, live.as_ref()) {
                Ok(()) => {
                    self.states.insert(target.clone(), TargetState::Written);
                    report.written.push(target);
                }
                Err(e) => {
                    warn!("Mixins for {} failed: {}", target, e);
                    report.failed.push(BootError::TransformApplicationFailed {
                        target,
                        source: Box::new(e),
                    });
                }
            }
        }

        report
    }

    fn apply_target(
        &self,
        reference: &TargetReference,
        target: &str,
        live: Option<&LiveTarget<'_>>,
    ) -> BootResult<()> {
        let original = self
            .originals
            .get(target)
            .ok_or_else(|| BootError::TargetUnitNotFound(target.to_string()))?;

        let config = TransformConfig::merge_all(
            self.mixins
                .get(target)
                .into_iter()
                .flatten()
                .map(|m| m.transform()),
        );
        let patched = config.apply(original, &reference.symbols())?;
        let unit = reference.archive_unit_name(target);

        match live {
            None => {
                reference.archive().writer().put_unit(&unit, patched);
                debug!("Rewrote {} in {}", unit, reference.archive().name());
            }
            Some(live) => {
                let loaded = live.loader.load_unit(&unit)?;
                live.redefiner.redefine(&loaded, patched)?;
            }
        }

        Ok(())
    }
}

fn check_claim(target: &str, mixin: &dyn Mixin) -> BootResult<()> {
    match mixin.target() {
        Some(claimed) if claimed != target => Err(BootError::invalid_state(format!(
            "mixin written for {} registered against {}",
            claimed, target
        ))),
        _ => Ok(()),
    }
}
