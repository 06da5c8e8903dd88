mod environment;
mod unit;

pub use environment::{ExecutionEnvironment, Loader, LookupScope};
pub use unit::{LiveRedefiner, LoadedUnit, Redefiner};
