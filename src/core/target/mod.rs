mod handle;
mod local;
mod reference;
mod session;

pub use handle::{ArchiveTargetHandle, EntryPoint, TargetHandle, TargetProvider};
pub use local::LocalTargetProvider;
pub use reference::{RuntimeInfo, SymbolMappings, TargetReference};
pub use session::{BootSession, LoadState};
