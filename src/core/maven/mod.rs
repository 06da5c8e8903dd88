mod artifact;
mod pom;
mod repository;

pub use artifact::ArtifactDescriptor;
pub use pom::{PomDependency, PomDocument};
pub use repository::{
    ArtifactMetadata, ChildDescriptor, MavenRepository, RemoteResource, Repository,
    RepositoryKind, RepositorySettings,
};

/// Default scopes followed when expanding a dependency graph.
pub const DEFAULT_SCOPES: [&str; 3] = ["compile", "runtime", "import"];
