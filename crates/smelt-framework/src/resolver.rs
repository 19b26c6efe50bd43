//! Dependency graph resolution.
//!
//! [`DependencyResolver::expand`] turns a seed plugin list into the canonical
//! processing order:
//!
//! 1. Seed with the base plugin, then the requested plugins (duplicates collapsed).
//! 2. Chain every group: each seeded plugin depends on the previous seeded
//!    member of its group, in request order.
//! 3. Expand dependencies transitively. Every plugin depends on the base
//!    plugin. Missing mandatory dependencies are errors; missing optional
//!    ones are dropped and remembered so later references are dropped too.
//! 4. Make the class callback depend on every other node.
//! 5. Sort topologically (a cycle is a hard error). Independent nodes keep
//!    the order they were first seen in: base, requests, then discoveries.
//! 6. Drop nodes whose module cannot be located, except the callback.
//!
//! The returned list is **dependency-first**: index 0 is the base plugin and
//! the last entry is the callback.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use smelt_core::{
    CapabilityLookup, DependencyGraph, PluginModule, ResolveError, ResolveResult,
    topological_sort_by,
};
use tracing::{debug, trace};

/// Name of the base plugin used when none is configured.
pub const DEFAULT_BASE_PLUGIN: &str = "base";

/// Rejects names that cannot identify a plugin.
///
/// A valid name is non-empty, has no whitespace or control characters, and
/// does not start with the optional marker `?`.
pub fn validate_plugin_name(name: &str) -> ResolveResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('?')
        && !name.chars().any(|c| c.is_whitespace() || c.is_control());
    if valid {
        Ok(())
    } else {
        Err(ResolveError::invalid_plugin_name(name))
    }
}

/// Builds the ordered plugin list for one service.
pub struct DependencyResolver<'a> {
    lookup: &'a dyn CapabilityLookup,
    base_plugin: &'a str,
}

impl<'a> DependencyResolver<'a> {
    /// Creates a resolver backed by `lookup`.
    pub fn new(lookup: &'a dyn CapabilityLookup, base_plugin: &'a str) -> Self {
        Self {
            lookup,
            base_plugin,
        }
    }

    /// Expands `seed` into the full, dependency-first plugin order for a
    /// service whose class callback is `callback`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::PackageClassInvalid`] if `callback` cannot be located.
    /// - [`ResolveError::PluginUnknown`] for an unlocatable request or mandatory dependency.
    /// - [`ResolveError::InvalidPluginName`] for a malformed name.
    /// - [`ResolveError::Cycle`] if the expanded graph is not a DAG.
    pub fn expand(&self, callback: &str, seed: &[String]) -> ResolveResult<Vec<String>> {
        let callback_module = self
            .lookup
            .find_callback_module(callback)
            .ok_or_else(|| ResolveError::PackageClassInvalid(callback.to_string()))?;
        let modules = ModuleCache {
            lookup: self.lookup,
            callback,
            callback_module,
        };

        let queue = self.chain_groups(&modules, seed)?;
        let (mut graph, first_seen) = self.expand_dependencies(&modules, queue)?;

        // The callback is the sink: it comes after everything else.
        let others: BTreeSet<String> = graph
            .keys()
            .filter(|name| name.as_str() != callback)
            .cloned()
            .collect();
        graph.entry(callback.to_string()).or_default().extend(others);

        let sorted = topological_sort_by(&graph, &first_seen)?;
        let expanded: Vec<String> = sorted
            .into_iter()
            .filter(|name| name == callback || modules.get(name).is_some())
            .collect();

        debug!(callback, plugins = ?expanded, "Plugin graph resolved");
        Ok(expanded)
    }

    /// Seeds the queue in request order and adds the group chain edges.
    fn chain_groups(
        &self,
        modules: &ModuleCache<'_>,
        seed: &[String],
    ) -> ResolveResult<VecDeque<(String, BTreeSet<String>)>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut last_in_group: HashMap<String, String> = HashMap::new();
        let mut queue = VecDeque::new();

        for name in std::iter::once(self.base_plugin).chain(seed.iter().map(String::as_str)) {
            validate_plugin_name(name)?;
            if !seen.insert(name) {
                continue;
            }
            let module = modules
                .get(name)
                .ok_or_else(|| ResolveError::plugin_unknown(name))?;

            let mut extra = BTreeSet::new();
            if let Some(group) = module.group() {
                if let Some(previous) = last_in_group.insert(group.to_string(), name.to_string()) {
                    trace!(plugin = name, group, after = %previous, "Chaining group member");
                    extra.insert(previous);
                }
            }
            queue.push_back((name.to_string(), extra));
        }

        Ok(queue)
    }

    /// Resolves the queue transitively into a dependency graph, returning it
    /// with the nodes in the order they were first expanded.
    fn expand_dependencies(
        &self,
        modules: &ModuleCache<'_>,
        mut queue: VecDeque<(String, BTreeSet<String>)>,
    ) -> ResolveResult<(DependencyGraph, Vec<String>)> {
        let mut graph = DependencyGraph::new();
        let mut first_seen: Vec<String> = Vec::new();
        let mut known_optional: HashSet<String> = HashSet::new();

        while let Some((name, extra)) = queue.pop_front() {
            validate_plugin_name(&name)?;

            if let Some(deps) = graph.get_mut(&name) {
                deps.extend(extra);
                continue;
            }

            let module = modules
                .get(&name)
                .ok_or_else(|| ResolveError::plugin_unknown(&name))?;

            let mut deps = extra;
            if name != self.base_plugin {
                deps.insert(self.base_plugin.to_string());
            }

            for dep in module.dependencies() {
                validate_plugin_name(&dep.name)?;
                if dep.name == name || known_optional.contains(&dep.name) {
                    continue;
                }
                if graph.contains_key(&dep.name) || modules.get(&dep.name).is_some() {
                    if !graph.contains_key(&dep.name) {
                        queue.push_back((dep.name.clone(), BTreeSet::new()));
                    }
                    deps.insert(dep.name);
                } else if dep.optional {
                    debug!(plugin = %name, dependency = %dep.name, "Optional dependency not found, dropped");
                    known_optional.insert(dep.name);
                } else {
                    return Err(ResolveError::PluginUnknown(dep.name));
                }
            }

            trace!(plugin = %name, deps = ?deps, "Plugin expanded");
            first_seen.push(name.clone());
            graph.insert(name, deps);
        }

        Ok((graph, first_seen))
    }
}

/// Locates modules, answering for the callback with its callback module.
struct ModuleCache<'a> {
    lookup: &'a dyn CapabilityLookup,
    callback: &'a str,
    callback_module: Arc<dyn PluginModule>,
}

impl ModuleCache<'_> {
    fn get(&self, name: &str) -> Option<Arc<dyn PluginModule>> {
        if name == self.callback {
            Some(Arc::clone(&self.callback_module))
        } else {
            self.lookup.find_plugin_module(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smelt_core::Dependency;

    use crate::registry::PluginRegistry;

    struct Fake {
        name: &'static str,
        group: Option<&'static str>,
        deps: Vec<Dependency>,
    }

    impl PluginModule for Fake {
        fn name(&self) -> &str {
            self.name
        }
        fn group(&self) -> Option<&str> {
            self.group
        }
        fn dependencies(&self) -> Vec<Dependency> {
            self.deps.clone()
        }
    }

    fn fake(name: &'static str, deps: &[&str]) -> Fake {
        Fake {
            name,
            group: None,
            deps: deps.iter().map(|d| d.parse().unwrap()).collect(),
        }
    }

    fn grouped(name: &'static str, group: &'static str) -> Fake {
        Fake {
            name,
            group: Some(group),
            deps: Vec::new(),
        }
    }

    fn registry(modules: Vec<Fake>) -> PluginRegistry {
        let registry = PluginRegistry::with_builtins();
        for module in modules {
            registry.register(module);
        }
        registry
    }

    fn seed(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn pos(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_expand_simple() {
        let reg = registry(vec![fake("http", &[]), fake("auth", &[])]);
        let order = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "auth"]))
            .unwrap();
        assert_eq!(order, vec!["base", "auth", "http"]);
    }

    #[test]
    fn test_transitive_dependencies_precede_dependents() {
        let reg = registry(vec![
            fake("http", &[]),
            fake("auth", &["db"]),
            fake("db", &["pool"]),
            fake("pool", &[]),
        ]);
        let order = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "auth"]))
            .unwrap();
        assert_eq!(order.first().unwrap(), "base");
        assert_eq!(order.last().unwrap(), "http");
        assert!(pos(&order, "pool") < pos(&order, "db"));
        assert!(pos(&order, "db") < pos(&order, "auth"));
    }

    #[test]
    fn test_group_chaining_follows_request_order() {
        let reg = registry(vec![
            fake("http", &[]),
            grouped("zeta", "g"),
            grouped("alpha", "g"),
            grouped("mid", "g"),
        ]);
        let order = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "zeta", "alpha", "mid"]))
            .unwrap();
        assert!(pos(&order, "zeta") < pos(&order, "alpha"));
        assert!(pos(&order, "alpha") < pos(&order, "mid"));
    }

    #[test]
    fn test_request_order_breaks_ties() {
        let reg = registry(vec![fake("http", &[]), fake("zeta", &[]), fake("alpha", &[])]);
        let resolver = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN);
        assert_eq!(
            resolver.expand("http", &seed(&["http", "zeta", "alpha"])).unwrap(),
            vec!["base", "zeta", "alpha", "http"]
        );
        assert_eq!(
            resolver.expand("http", &seed(&["http", "alpha", "zeta"])).unwrap(),
            vec!["base", "alpha", "zeta", "http"]
        );
    }

    #[test]
    fn test_discovered_dependencies_follow_requests() {
        let reg = registry(vec![
            fake("http", &[]),
            fake("web", &["zlib"]),
            fake("auth", &[]),
            fake("zlib", &[]),
        ]);
        let order = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "web", "auth"]))
            .unwrap();
        assert_eq!(order, vec!["base", "auth", "zlib", "web", "http"]);
    }

    #[test]
    fn test_missing_optional_dependency_is_dropped() {
        let reg = registry(vec![fake("http", &[]), fake("auth", &["?metrics"])]);
        let order = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "auth"]))
            .unwrap();
        assert_eq!(order, vec!["base", "auth", "http"]);
    }

    #[test]
    fn test_present_optional_dependency_is_ordered() {
        let reg = registry(vec![
            fake("http", &[]),
            fake("auth", &["?metrics"]),
            fake("metrics", &[]),
        ]);
        let order = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "auth"]))
            .unwrap();
        assert!(pos(&order, "metrics") < pos(&order, "auth"));
    }

    #[test]
    fn test_known_optional_tolerated_later() {
        let reg = registry(vec![
            fake("http", &[]),
            fake("a", &["?metrics"]),
            fake("b", &["metrics"]),
        ]);
        let order = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "a", "b"]))
            .unwrap();
        assert!(!order.contains(&"metrics".to_string()));
    }

    #[test]
    fn test_missing_mandatory_dependency() {
        let reg = registry(vec![fake("http", &[]), fake("auth", &["db"])]);
        let err = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "auth"]))
            .unwrap_err();
        assert_eq!(err, ResolveError::PluginUnknown("db".into()));
    }

    #[test]
    fn test_unknown_requested_plugin() {
        let reg = registry(vec![fake("http", &[])]);
        let err = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "ghost"]))
            .unwrap_err();
        assert_eq!(err, ResolveError::PluginUnknown("ghost".into()));
    }

    #[test]
    fn test_unknown_class() {
        let reg = registry(vec![]);
        let err = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http"]))
            .unwrap_err();
        assert_eq!(err, ResolveError::PackageClassInvalid("http".into()));
    }

    #[test]
    fn test_cycle() {
        let reg = registry(vec![fake("http", &[]), fake("a", &["b"]), fake("b", &["a"])]);
        let err = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "a"]))
            .unwrap_err();
        assert!(matches!(err, ResolveError::Cycle(ref c) if c.nodes.contains(&"a".to_string())));
    }

    #[test]
    fn test_invalid_names() {
        let reg = registry(vec![fake("http", &[])]);
        let resolver = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN);
        for bad in ["", "has space", "?opt"] {
            let err = resolver.expand("http", &seed(&["http", bad])).unwrap_err();
            assert_eq!(err, ResolveError::InvalidPluginName(bad.into()));
        }
    }

    #[test]
    fn test_duplicates_collapsed() {
        let reg = registry(vec![fake("http", &[]), fake("auth", &[])]);
        let order = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http", "auth", "auth", "base"]))
            .unwrap();
        assert_eq!(order, vec!["base", "auth", "http"]);
    }

    #[test]
    fn test_callback_dependencies_expanded() {
        let reg = registry(vec![fake("http", &["tls"]), fake("tls", &[])]);
        let order = DependencyResolver::new(&reg, DEFAULT_BASE_PLUGIN)
            .expand("http", &seed(&["http"]))
            .unwrap();
        assert_eq!(order, vec!["base", "tls", "http"]);
    }
}
