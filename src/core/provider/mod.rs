mod discovery;
mod properties;
mod registry;

pub use discovery::{discover_extension, discover_provider, PROVIDER_METADATA, PROVIDER_NAME_KEY};
pub use properties::parse_properties;
pub use registry::{ExtensionFactory, ProviderFactory, ProviderRegistry, Registration};
