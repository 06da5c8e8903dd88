// ─── patchboot Core ───
// Resolves, caches, loads and patches a third-party target program.
//
// Architecture:
//   core/
//     maven/       Descriptors, POM metadata, repository protocol
//     downloader/  HTTP fetches with checksum validation, atomic writes
//     cache/       Resource cache + cached-artifact store
//     resolver/    Breadth-first dependency graph, platform rules
//     archive/     In-memory archive reader/writer, archive handles
//     loader/      Lookup scopes, loaders, loaded units, redefinition
//     provider/    Provider metadata discovery + registry
//     mixin/       Transform configs and the mixin engine
//     target/      Target reference, handles, boot session
//     state/       Bootstrap settings

pub mod archive;
pub mod cache;
pub mod downloader;
pub mod error;
pub mod http;
pub mod loader;
pub mod maven;
pub mod mixin;
pub mod provider;
pub mod resolver;
pub mod state;
pub mod target;

#[cfg(test)]
pub(crate) mod testing;
