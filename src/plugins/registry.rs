//! Compile-time plugin registry with lazy instantiation

use super::TechnologyPlugin;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Constructor for a plugin instance
pub type PluginFactory = fn() -> Box<dyn TechnologyPlugin>;

/// Maps technology names to plugin factories.
///
/// A plugin is only constructed the first time its technology is requested
/// and is then reused for the life of the registry.
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
    instances: DashMap<String, Arc<dyn TechnologyPlugin>>,
}

impl PluginRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            instances: DashMap::new(),
        }
    }

    /// Registry with every built-in plugin
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("python", || Box::new(super::python::PythonPlugin));
        registry.register("django", || Box::new(super::django::DjangoPlugin));
        registry.register("flask", || Box::new(super::flask::FlaskPlugin));
        registry.register("fastapi", || Box::new(super::fastapi::FastApiPlugin));
        registry.register("pytest", || Box::new(super::pytest::PytestPlugin));
        registry.register("sqlalchemy", || Box::new(super::sqlalchemy::SqlAlchemyPlugin));
        registry.register("docker", || Box::new(super::docker::DockerPlugin));
        registry.register("javascript", || Box::new(super::javascript::JavaScriptPlugin));
        registry
    }

    /// Register or replace the factory for a technology
    pub fn register(&mut self, technology: impl Into<String>, factory: PluginFactory) {
        let technology = technology.into();
        self.instances.remove(&technology);
        self.factories.insert(technology, factory);
    }

    pub fn has_plugin(&self, technology: &str) -> bool {
        self.factories.contains_key(technology)
    }

    /// Registered technology names, sorted
    pub fn technologies(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// The plugin for a technology, constructing it on first use
    pub fn get(&self, technology: &str) -> Option<Arc<dyn TechnologyPlugin>> {
        if let Some(plugin) = self.instances.get(technology) {
            return Some(Arc::clone(plugin.value()));
        }
        let factory = self.factories.get(technology)?;
        let entry = self
            .instances
            .entry(technology.to_string())
            .or_insert_with(|| {
                debug!(technology, "instantiating plugin");
                Arc::from(factory())
            });
        Some(Arc::clone(entry.value()))
    }

    pub fn is_instantiated(&self, technology: &str) -> bool {
        self.instances.contains_key(technology)
    }

    pub fn instantiated_count(&self) -> usize {
        self.instances.len()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registers_all_plugins() {
        let registry = PluginRegistry::builtin();
        assert_eq!(
            registry.technologies(),
            vec![
                "django",
                "docker",
                "fastapi",
                "flask",
                "javascript",
                "pytest",
                "python",
                "sqlalchemy"
            ]
        );
        assert_eq!(registry.instantiated_count(), 0);
    }

    #[test]
    fn test_plugins_are_instantiated_lazily_and_cached() {
        let registry = PluginRegistry::builtin();
        let first = registry.get("django").unwrap();
        let second = registry.get("django").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.technology(), "django");
        assert!(registry.is_instantiated("django"));
        assert!(!registry.is_instantiated("flask"));
        assert_eq!(registry.instantiated_count(), 1);
    }

    #[test]
    fn test_unknown_technology() {
        let registry = PluginRegistry::builtin();
        assert!(registry.get("cobol").is_none());
        assert!(!registry.has_plugin("cobol"));
        assert_eq!(registry.instantiated_count(), 0);
    }
}
