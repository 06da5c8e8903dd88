// ─── Boot Session ───
// Owns the target reference for one run, the loaded handle once there is
// one, and the mixin engine. Lifecycle transitions are guarded:
//   load:     !is_loaded
//   start:    is_loaded && !has_started
//   shutdown: has_started

use std::sync::Arc;

use tracing::{debug, info};

use super::handle::{TargetHandle, TargetProvider};
use super::reference::TargetReference;
use crate::core::error::{BootError, BootResult};
use crate::core::loader::{ExecutionEnvironment, LiveRedefiner, Loader, Redefiner};
use crate::core::mixin::{FlushReport, LiveTarget, Mixin, MixinEngine, MixinExtension, MixinMetadata};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadState {
    pub is_loaded: bool,
    pub has_started: bool,
}

pub struct BootSession {
    provider: Box<dyn TargetProvider>,
    reference: TargetReference,
    environment: ExecutionEnvironment,
    redefiner: Box<dyn Redefiner>,
    handle: Option<Box<dyn TargetHandle>>,
    engine: MixinEngine,
    state: LoadState,
    args: Vec<String>,
    apply_default_args: bool,
}

impl BootSession {
    pub fn new(
        provider: Box<dyn TargetProvider>,
        reference: TargetReference,
        args: Vec<String>,
        apply_default_args: bool,
    ) -> Self {
        Self {
            provider,
            reference,
            environment: ExecutionEnvironment::empty(),
            redefiner: Box::new(LiveRedefiner),
            handle: None,
            engine: MixinEngine::new(),
            state: LoadState::default(),
            args,
            apply_default_args,
        }
    }

    pub fn with_environment(mut self, environment: ExecutionEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_redefiner(mut self, redefiner: impl Redefiner + 'static) -> Self {
        self.redefiner = Box::new(redefiner);
        self
    }

    pub fn reference(&self) -> &TargetReference {
        &self.reference
    }

    pub fn version(&self) -> &str {
        self.reference.version()
    }

    pub fn provider(&self) -> &dyn TargetProvider {
        self.provider.as_ref()
    }

    pub fn environment(&self) -> &ExecutionEnvironment {
        &self.environment
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn engine(&self) -> &MixinEngine {
        &self.engine
    }

    pub fn handle(&self) -> Option<&dyn TargetHandle> {
        self.handle.as_deref()
    }

    // ── Lifecycle ───────────────────────────────────────

    /// Load the target under `parent`.
    pub fn load(&mut self, parent: &Arc<Loader>) -> BootResult<()> {
        if self.state.is_loaded {
            return Err(BootError::invalid_state("target is already loaded"));
        }

        let handle = self
            .provider
            .load(&self.reference, parent, &self.environment)?;
        info!(
            "Loaded target {} via {} (loader {})",
            self.reference.version(),
            self.provider.name(),
            handle.loader().name()
        );
        self.handle = Some(handle);
        self.state.is_loaded = true;
        Ok(())
    }

    /// Load the target directly under the environment's system root.
    pub fn load_under_system(&mut self) -> BootResult<()> {
        let system = self.environment.system().clone();
        self.load(&system)
    }

    pub fn start(&mut self) -> BootResult<()> {
        if self.state.has_started {
            return Err(BootError::invalid_state("target has already started"));
        }
        let handle = match (&self.handle, self.state.is_loaded) {
            (Some(handle), true) => handle,
            _ => return Err(BootError::invalid_state("target is not loaded")),
        };

        let args = self.launch_arguments();
        self.state.has_started = true;
        if let Err(e) = handle.start(&args) {
            self.state.has_started = false;
            return Err(e);
        }
        Ok(())
    }

    pub fn shutdown(&mut self) -> BootResult<()> {
        if !self.state.has_started {
            return Err(BootError::invalid_state("target is not running"));
        }
        if let Some(handle) = &self.handle {
            handle.shutdown()?;
        }
        self.state.has_started = false;
        Ok(())
    }

    /// Base arguments, followed by the runtime pairs when injection is on.
    pub fn launch_arguments(&self) -> Vec<String> {
        let mut args = self.args.clone();
        if self.apply_default_args {
            let info = self.reference.runtime_info();
            args.extend([
                "--assetsDir".to_string(),
                info.assets_dir.display().to_string(),
                "--assetIndex".to_string(),
                info.assets_name.clone(),
                "--gameDir".to_string(),
                info.game_dir.display().to_string(),
                "--version".to_string(),
                self.reference.version().to_string(),
            ]);
        }
        args
    }

    // ── Mixins ──────────────────────────────────────────

    pub fn register_mixin(&mut self, target: &str, mixin: impl Mixin + 'static) -> BootResult<()> {
        self.engine.register(&self.reference, target, Box::new(mixin))
    }

    /// Register against the unit the metadata names.
    pub fn register<T: Send + Sync + 'static>(&mut self, metadata: MixinMetadata<T>) -> BootResult<()> {
        let target = metadata.target.clone();
        self.register_mixin(&target, metadata)
    }

    /// Register every mixin an extension contributes. Nothing is registered
    /// unless every pair is valid.
    pub fn install_extension(&mut self, extension: &dyn MixinExtension) -> BootResult<usize> {
        let mixins = extension.mixins();
        for (target, mixin) in &mixins {
            self.engine.validate(&self.reference, target, mixin.as_ref())?;
        }

        let count = mixins.len();
        for (target, mixin) in mixins {
            self.engine.register(&self.reference, &target, mixin)?;
        }
        debug!("Extension {} registered {} mixin(s)", extension.name(), count);
        Ok(count)
    }

    /// Apply pending mixins: rewrite the archive before load, hot-swap after.
    pub fn flush_mixins(&mut self) -> FlushReport {
        let live = match (&self.handle, self.state.is_loaded) {
            (Some(handle), true) => Some(LiveTarget {
                loader: handle.loader(),
                redefiner: self.redefiner.as_ref(),
            }),
            _ => None,
        };
        self.engine.flush(&self.reference, live)
    }
}
