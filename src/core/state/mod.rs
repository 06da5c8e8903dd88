mod settings;

pub use settings::{BootstrapSettings, SETTINGS_ENV};
