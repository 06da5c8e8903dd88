mod graph;
mod rules;

pub use graph::{ArchiveGraph, DependencyResolver, ResolveRequest, ResolvedGraph};
pub use rules::{Platform, PlatformRule, PlatformRules, RuleAction};
