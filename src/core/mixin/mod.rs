mod config;
mod engine;
mod metadata;

pub use config::{CustomEdit, SymbolContext, TransformConfig, UnitEdit};
pub use engine::{FlushReport, LiveTarget, MixinEngine, TargetState};
pub use metadata::{Mixin, MixinExtension, MixinInjection, MixinMetadata};
