// ─── Dependency Graph ───
// Breadth-first expansion of a root descriptor into its transitive,
// deduplicated artifact set, then children-first opening of archive handles.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::rules::Platform;
use crate::core::archive::{ArchiveHandle, ArchiveReference};
use crate::core::cache::{ArtifactStore, CachedArtifact, ResourceCache};
use crate::core::error::{BootError, BootResult};
use crate::core::loader::ExecutionEnvironment;
use crate::core::maven::{ArtifactDescriptor, Repository, DEFAULT_SCOPES};

/// Root descriptor plus the child scopes to follow.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub descriptor: ArtifactDescriptor,
    pub include_scopes: Vec<String>,
}

impl ResolveRequest {
    pub fn new(descriptor: ArtifactDescriptor) -> Self {
        Self {
            descriptor,
            include_scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.include_scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }

    fn follows(&self, scope: &str) -> bool {
        self.include_scopes.iter().any(|s| s == scope)
    }
}

/// Result of a resolution run.
#[derive(Debug)]
pub struct ResolvedGraph {
    root: ArtifactDescriptor,
    /// Breadth-first order.
    order: Vec<ArtifactDescriptor>,
    artifacts: HashMap<ArtifactDescriptor, CachedArtifact>,
    edges: HashMap<ArtifactDescriptor, Vec<ArtifactDescriptor>>,
}

impl ResolvedGraph {
    pub fn root(&self) -> &ArtifactDescriptor {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, descriptor: &ArtifactDescriptor) -> bool {
        self.artifacts.contains_key(descriptor)
    }

    pub fn get(&self, descriptor: &ArtifactDescriptor) -> Option<&CachedArtifact> {
        self.artifacts.get(descriptor)
    }

    /// Artifacts in breadth-first order.
    pub fn artifacts(&self) -> impl Iterator<Item = &CachedArtifact> {
        self.order.iter().filter_map(|d| self.artifacts.get(d))
    }

    /// Resolved children of `descriptor`, in declaration order.
    pub fn children(&self, descriptor: &ArtifactDescriptor) -> &[ArtifactDescriptor] {
        self.edges.get(descriptor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Post-order (children before parents) from the root. Back edges of
    /// cycles are reported and dropped.
    fn post_order(&self) -> (Vec<ArtifactDescriptor>, HashSet<(ArtifactDescriptor, ArtifactDescriptor)>) {
        let mut order = Vec::with_capacity(self.order.len());
        let mut done: HashSet<&ArtifactDescriptor> = HashSet::new();
        let mut on_stack: HashSet<&ArtifactDescriptor> = HashSet::new();
        let mut back_edges = HashSet::new();
        let mut stack: Vec<(&ArtifactDescriptor, usize)> = vec![(&self.root, 0)];
        on_stack.insert(&self.root);

        while let Some((node, idx)) = stack.pop() {
            let children = self.children(node);
            if let Some(child) = children.get(idx) {
                stack.push((node, idx + 1));
                if on_stack.contains(child) {
                    warn!("Dependency cycle {} -> {}; edge ignored", node, child);
                    back_edges.insert((node.clone(), child.clone()));
                } else if !done.contains(child) {
                    on_stack.insert(child);
                    stack.push((child, 0));
                }
                continue;
            }

            on_stack.remove(node);
            done.insert(node);
            order.push(node.clone());
        }

        (order, back_edges)
    }
}

/// Opened handles of a resolved graph.
#[derive(Debug)]
pub struct ArchiveGraph {
    handles: Vec<Arc<ArchiveHandle>>,
    roots: Vec<Arc<ArchiveHandle>>,
}

impl ArchiveGraph {
    /// Every handle, children before parents, each exactly once.
    pub fn handles(&self) -> &[Arc<ArchiveHandle>] {
        &self.handles
    }

    /// Handles standing for the root: its own, or its children's when the
    /// root has no binary.
    pub fn roots(&self) -> &[Arc<ArchiveHandle>] {
        &self.roots
    }

    pub fn find(&self, descriptor: &ArtifactDescriptor) -> Option<&Arc<ArchiveHandle>> {
        self.handles
            .iter()
            .find(|h| h.descriptor() == Some(descriptor))
    }
}

/// Bookkeeping for one `resolve` run.
#[derive(Default)]
struct Walk {
    visited: HashSet<ArtifactDescriptor>,
    /// Reached through at least one path with no optional edge on it.
    demanded: HashSet<ArtifactDescriptor>,
    /// Optional descriptors that failed to resolve.
    skipped: HashMap<ArtifactDescriptor, BootError>,
    order: Vec<ArtifactDescriptor>,
    artifacts: HashMap<ArtifactDescriptor, CachedArtifact>,
}

impl Walk {
    /// Mark `descriptor` required, together with whatever already resolved
    /// beneath it through required edges. Fails if any of them was skipped.
    fn demand(&mut self, descriptor: &ArtifactDescriptor, request: &ResolveRequest) -> BootResult<()> {
        let mut work = vec![descriptor.clone()];
        while let Some(current) = work.pop() {
            if !self.demanded.insert(current.clone()) {
                continue;
            }
            if let Some(e) = self.skipped.remove(&current) {
                return Err(BootError::DependencyResolutionFailed {
                    descriptor: current,
                    source: Box::new(e),
                });
            }
            if let Some(record) = self.artifacts.get(&current) {
                work.extend(
                    record
                        .children
                        .iter()
                        .filter(|c| !c.optional && request.follows(&c.scope))
                        .map(|c| c.descriptor.clone()),
                );
            }
        }
        Ok(())
    }
}

pub struct DependencyResolver {
    cache: ResourceCache,
    store: ArtifactStore,
    platform: Platform,
    concurrency: usize,
}

impl DependencyResolver {
    /// Resolver whose binaries and records live under `cache_root`.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        let root = cache_root.into();
        Self {
            cache: ResourceCache::new(root.clone()),
            store: ArtifactStore::new(root),
            platform: Platform::current(),
            concurrency: 8,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Expand `request` breadth-first. Each descriptor is resolved at most
    /// once; within a level fetches run concurrently but results are
    /// recorded in frontier order.
    pub async fn resolve(
        &self,
        request: &ResolveRequest,
        repository: &dyn Repository,
    ) -> BootResult<ResolvedGraph> {
        info!("Resolving {} from {}", request.descriptor, repository.name());

        let mut walk = Walk::default();
        walk.visited.insert(request.descriptor.clone());
        walk.demand(&request.descriptor, request)?;
        let mut frontier = vec![request.descriptor.clone()];

        while !frontier.is_empty() {
            let outcomes: Vec<BootResult<Option<CachedArtifact>>> = stream::iter(frontier.iter())
                .map(|descriptor| self.resolve_one(descriptor, repository))
                .buffered(self.concurrency)
                .collect()
                .await;

            let mut next: Vec<ArtifactDescriptor> = Vec::new();
            for (descriptor, outcome) in frontier.iter().zip(outcomes) {
                // Checked at use: a sibling earlier in this level may have demanded it.
                let required = walk.demanded.contains(descriptor);
                let record = match outcome {
                    Ok(Some(record)) => record,
                    Ok(None) => {
                        debug!("{} excluded on {}", descriptor, self.platform);
                        continue;
                    }
                    Err(e) if required => {
                        return Err(BootError::DependencyResolutionFailed {
                            descriptor: descriptor.clone(),
                            source: Box::new(e),
                        });
                    }
                    Err(e) => {
                        warn!("Skipping optional dependency {}: {}", descriptor, e);
                        walk.skipped.insert(descriptor.clone(), e);
                        continue;
                    }
                };

                for child in record.children.iter().filter(|c| request.follows(&c.scope)) {
                    if required && !child.optional {
                        walk.demand(&child.descriptor, request)?;
                    }
                    if walk.visited.insert(child.descriptor.clone()) {
                        next.push(child.descriptor.clone());
                    }
                }

                walk.order.push(record.descriptor.clone());
                walk.artifacts.insert(record.descriptor.clone(), record);
            }

            frontier = next;
        }

        let Walk { order, artifacts, .. } = walk;
        let edges = order
            .iter()
            .map(|d: &ArtifactDescriptor| {
                let record: &CachedArtifact = &artifacts[d];
                let children = record
                    .children
                    .iter()
                    .filter(|c| request.follows(&c.scope) && artifacts.contains_key(&c.descriptor))
                    .map(|c| c.descriptor.clone())
                    .collect();
                (d.clone(), children)
            })
            .collect();

        info!("Resolved {} artifact(s) for {}", order.len(), request.descriptor);
        Ok(ResolvedGraph {
            root: request.descriptor.clone(),
            order,
            artifacts,
            edges,
        })
    }

    async fn resolve_one(
        &self,
        descriptor: &ArtifactDescriptor,
        repository: &dyn Repository,
    ) -> BootResult<Option<CachedArtifact>> {
        if let Some(record) = self.store.get(descriptor).await? {
            debug!("Cached record for {}", descriptor);
            return Ok(record.rules.admits(self.platform).then_some(record));
        }

        let metadata = repository.metadata(descriptor).await?;
        if !metadata.rules.admits(self.platform) {
            return Ok(None);
        }

        let resource = match &metadata.resource {
            Some(remote) => Some(self.cache.materialize(descriptor, remote, repository).await?),
            None => None,
        };

        let record = CachedArtifact {
            descriptor: descriptor.clone(),
            resource,
            children: metadata.children,
            rules: metadata.rules,
            resolved_at: Utc::now(),
        };
        self.store.put(&record).await?;
        Ok(Some(record))
    }

    /// Open every resolved binary as an archive handle. A handle's loader
    /// delegates to the handles of its children; artifacts without a binary
    /// pass their children's handles through to their dependents.
    pub async fn open(
        &self,
        graph: &ResolvedGraph,
        environment: &ExecutionEnvironment,
    ) -> BootResult<ArchiveGraph> {
        let (post_order, back_edges) = graph.post_order();
        let mut contributions: HashMap<ArtifactDescriptor, Vec<Arc<ArchiveHandle>>> = HashMap::new();
        let mut handles = Vec::new();

        for descriptor in &post_order {
            let mut parents: Vec<Arc<ArchiveHandle>> = Vec::new();
            for child in graph.children(descriptor) {
                if back_edges.contains(&(descriptor.clone(), child.clone())) {
                    continue;
                }
                for handle in contributions.get(child).into_iter().flatten() {
                    if !parents.iter().any(|p| Arc::ptr_eq(p, handle)) {
                        parents.push(handle.clone());
                    }
                }
            }

            let Some(record) = graph.get(descriptor) else {
                continue;
            };

            let contributed = match &record.resource {
                Some(path) => {
                    let archive = ArchiveReference::open(path).await.map_err(|e| {
                        BootError::DependencyResolutionFailed {
                            descriptor: descriptor.clone(),
                            source: Box::new(e),
                        }
                    })?;
                    let parent_loaders: Vec<_> = parents.iter().map(|p| p.loader().clone()).collect();
                    let loader =
                        environment.compose(&descriptor.to_string(), vec![archive.clone()], &parent_loaders);
                    let handle = ArchiveHandle::new(Some(descriptor.clone()), archive, loader, parents);
                    handles.push(handle.clone());
                    vec![handle]
                }
                None => parents,
            };

            contributions.insert(descriptor.clone(), contributed);
        }

        let roots = contributions.remove(graph.root()).unwrap_or_default();
        Ok(ArchiveGraph { handles, roots })
    }

    /// `resolve` followed by `open`.
    pub async fn resolve_archives(
        &self,
        request: &ResolveRequest,
        repository: &dyn Repository,
        environment: &ExecutionEnvironment,
    ) -> BootResult<ArchiveGraph> {
        let graph = self.resolve(request, repository).await?;
        self.open(&graph, environment).await
    }
}
