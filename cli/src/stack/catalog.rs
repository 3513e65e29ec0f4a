//! # Module Catalog
//!
//! File: cli/src/stack/catalog.rs
//!
//! ## Overview
//!
//! The fixed registry of modules stackctl knows how to deploy, together with
//! the dependency graph between them. A `Catalog` is plain immutable data:
//! `Catalog::builtin()` builds the shipped table once at startup and it is
//! passed by reference to every component that needs it, so tests can hand
//! in a smaller catalog of their own.
//!
//! The dependency graph is assumed acyclic but closure is computed to a
//! fixpoint, so a cycle only means the members pull each other in.
//!
use crate::core::error::StackError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Grouping used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Infrastructure,
    Observability,
    Utilities,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Infrastructure => "Infrastructure",
            Category::Observability => "Observability",
            Category::Utilities => "Utilities",
        };
        f.write_str(label)
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub description: String,
    /// Listen addresses, in display order. May be empty.
    pub ports: Vec<String>,
    pub category: Category,
}

impl Module {
    pub fn new(name: &str, description: &str, ports: &[&str], category: Category) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            ports: ports.iter().map(|p| p.to_string()).collect(),
            category,
        }
    }

    /// Ports joined with commas, or `-` when the module listens nowhere.
    pub fn ports_label(&self) -> String {
        if self.ports.is_empty() {
            "-".to_string()
        } else {
            self.ports.join(",")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    modules: BTreeMap<String, Module>,
    dependencies: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    /// The modules shipped in the template tree.
    pub fn builtin() -> Self {
        use Category::*;
        Self::default()
            .with_module(Module::new(
                "socket-proxy",
                "Docker socket proxy for safer container API access",
                &["127.0.0.1:2375"],
                Infrastructure,
            ))
            .with_module(Module::new(
                "dozzle",
                "Container log viewer",
                &["127.0.0.1:9999"],
                Observability,
            ))
            .with_module(Module::new(
                "node-exporter",
                "Host metrics exporter",
                &["127.0.0.1:9100"],
                Observability,
            ))
            .with_module(Module::new(
                "prometheus",
                "Metrics scraping and storage",
                &["127.0.0.1:9090"],
                Observability,
            ))
            .with_module(Module::new(
                "alertmanager",
                "Alert routing",
                &["127.0.0.1:9093"],
                Observability,
            ))
            .with_module(Module::new(
                "grafana",
                "Dashboards",
                &["127.0.0.1:3000"],
                Observability,
            ))
            .with_module(Module::new(
                "loki",
                "Log aggregation",
                &["127.0.0.1:3100"],
                Observability,
            ))
            .with_module(Module::new(
                "jaeger",
                "Distributed tracing",
                &["127.0.0.1:16686", "127.0.0.1:4317", "127.0.0.1:4318"],
                Observability,
            ))
            .with_module(Module::new(
                "kuma",
                "Uptime Kuma monitoring",
                &["127.0.0.1:3001"],
                Infrastructure,
            ))
            .with_module(Module::new(
                "certbot",
                "Optional certificate management helper",
                &[],
                Infrastructure,
            ))
            .with_module(Module::new(
                "backup",
                "Backup sidecar tools and hooks",
                &[],
                Utilities,
            ))
            .with_dependency("dozzle", &["socket-proxy"])
    }

    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.insert(module.name.clone(), module);
        self
    }

    pub fn with_dependency(mut self, module: &str, requires: &[&str]) -> Self {
        self.dependencies
            .entry(module.to_string())
            .or_default()
            .extend(requires.iter().map(|r| r.to_string()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Looks a module up, failing validation for unknown names.
    pub fn require(&self, name: &str) -> Result<&Module, StackError> {
        self.get(name).ok_or_else(|| StackError::UnknownModule {
            name: name.to_string(),
        })
    }

    /// Modules sorted by name.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Declared direct dependencies of `name`.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.dependencies
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Modules grouped by category, each group sorted by name.
    pub fn by_category(&self) -> BTreeMap<Category, Vec<&Module>> {
        let mut groups: BTreeMap<Category, Vec<&Module>> = BTreeMap::new();
        for module in self.modules.values() {
            groups.entry(module.category).or_default().push(module);
        }
        groups
    }

    /// Filters `names` to catalog members and adds their dependencies until
    /// nothing new is pulled in.
    pub fn close_over_dependencies<'a, I>(&self, names: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut closed: BTreeSet<String> = names
            .into_iter()
            .filter(|n| self.contains(n))
            .map(str::to_string)
            .collect();
        let mut frontier: Vec<String> = closed.iter().cloned().collect();
        while let Some(current) = frontier.pop() {
            for dep in self.dependencies_of(&current) {
                if self.contains(dep) && closed.insert(dep.clone()) {
                    frontier.push(dep.clone());
                }
            }
        }
        closed
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_contents() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 11);
        assert_eq!(catalog.dependencies_of("dozzle"), ["socket-proxy"]);
        assert!(catalog.dependencies_of("grafana").is_empty());
        assert_eq!(catalog.get("jaeger").unwrap().ports.len(), 3);
        assert_eq!(catalog.get("backup").unwrap().ports_label(), "-");
        assert_eq!(
            catalog.get("jaeger").unwrap().ports_label(),
            "127.0.0.1:16686,127.0.0.1:4317,127.0.0.1:4318"
        );
    }

    #[test]
    fn test_modules_iterate_sorted() {
        let catalog = Catalog::builtin();
        let names: Vec<&str> = catalog.modules().map(|m| m.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_require_unknown_module() {
        let err = Catalog::builtin().require("grafanna").unwrap_err();
        assert!(matches!(err, StackError::UnknownModule { ref name } if name == "grafanna"));
    }

    #[test]
    fn test_closure_is_transitive_and_filters_unknown() {
        let catalog = Catalog::default()
            .with_module(Module::new("a", "", &[], Category::Utilities))
            .with_module(Module::new("b", "", &[], Category::Utilities))
            .with_module(Module::new("c", "", &[], Category::Utilities))
            .with_dependency("a", &["b"])
            .with_dependency("b", &["c", "ghost"]);

        let closed = catalog.close_over_dependencies(["a", "typo"]);
        assert_eq!(
            closed.into_iter().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_closure_tolerates_cycles() {
        let catalog = Catalog::default()
            .with_module(Module::new("x", "", &[], Category::Utilities))
            .with_module(Module::new("y", "", &[], Category::Utilities))
            .with_dependency("x", &["y"])
            .with_dependency("y", &["x"]);
        assert_eq!(catalog.close_over_dependencies(["x"]).len(), 2);
    }

    #[test]
    fn test_by_category_groups() {
        let catalog = Catalog::builtin();
        let groups = catalog.by_category();
        assert_eq!(groups[&Category::Utilities].len(), 1);
        assert_eq!(groups[&Category::Infrastructure].len(), 3);
        assert_eq!(groups[&Category::Observability].len(), 7);
    }
}
