mod resource;
mod store;

pub use resource::ResourceCache;
pub use store::{ArtifactStore, CachedArtifact};
