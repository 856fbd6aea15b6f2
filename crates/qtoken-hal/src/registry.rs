//! Backend registry.
//!
//! The [`BackendRegistry`] maps backend names (and their aliases) to
//! factories so front-ends can create a backend from a name and a
//! [`BackendConfig`] without depending on every adapter crate.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::backend::{BackendConfig, BackendFactory, MeasurementBackend};
use crate::error::{HalError, HalResult};

type Factory = Box<dyn Fn(BackendConfig) -> HalResult<Box<dyn MeasurementBackend>> + Send + Sync>;

struct Entry {
    description: String,
    factory: Factory,
}

/// Registry of constructible measurement backends.
pub struct BackendRegistry {
    entries: FxHashMap<String, Entry>,
    aliases: FxHashMap<String, String>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            aliases: FxHashMap::default(),
        }
    }

    /// Register a backend type under `name`.
    pub fn register<B>(&mut self, name: impl Into<String>, description: impl Into<String>)
    where
        B: BackendFactory + 'static,
    {
        self.register_factory(name, description, |config| {
            let backend = B::from_config(config)?;
            Ok(Box::new(backend) as Box<dyn MeasurementBackend>)
        });
    }

    /// Register a backend with a custom constructor.
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: impl Fn(BackendConfig) -> HalResult<Box<dyn MeasurementBackend>>
            + Send
            + Sync
            + 'static,
    ) {
        let name = name.into();
        debug!("Registering backend: {}", name);
        self.entries.insert(
            name,
            Entry {
                description: description.into(),
                factory: Box::new(factory),
            },
        );
    }

    /// Make `alias` resolve to the registered backend `target`.
    pub fn alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    /// Create a backend by name or alias.
    pub fn create(
        &self,
        name: &str,
        config: BackendConfig,
    ) -> HalResult<Box<dyn MeasurementBackend>> {
        let canonical = self.resolve(name);
        match self.entries.get(canonical) {
            Some(entry) => (entry.factory)(config),
            None => Err(HalError::BackendUnavailable(format!(
                "No backend registered with name '{name}'. Available: {}",
                self.available_backends().join(", ")
            ))),
        }
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// `(name, description, aliases)` for every backend, sorted by name.
    pub fn describe(&self) -> Vec<(String, String, Vec<String>)> {
        self.available_backends()
            .into_iter()
            .map(|name| {
                let mut aliases: Vec<_> = self
                    .aliases
                    .iter()
                    .filter(|(_, target)| **target == name)
                    .map(|(alias, _)| alias.clone())
                    .collect();
                aliases.sort();
                let description = self.entries[&name].description.clone();
                (name, description, aliases)
            })
            .collect()
    }

    /// Check if a backend is available by name or alias.
    pub fn has_backend(&self, name: &str) -> bool {
        self.entries.contains_key(self.resolve(name))
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable(_config: BackendConfig) -> HalResult<Box<dyn MeasurementBackend>> {
        Err(HalError::BackendUnavailable("test only".into()))
    }

    #[test]
    fn test_empty_registry() {
        let registry = BackendRegistry::new();
        assert!(registry.available_backends().is_empty());
        assert!(!registry.has_backend("simulator"));
    }

    #[test]
    fn test_register_and_alias() {
        let mut registry = BackendRegistry::new();
        registry.register_factory("simulator", "local statevector", unavailable);
        registry.alias("sim", "simulator");

        assert!(registry.has_backend("simulator"));
        assert!(registry.has_backend("sim"));
        assert!(!registry.has_backend("qpu"));

        let described = registry.describe();
        assert_eq!(described.len(), 1);
        assert_eq!(described[0].0, "simulator");
        assert_eq!(described[0].1, "local statevector");
        assert_eq!(described[0].2, vec!["sim".to_string()]);
    }

    #[test]
    fn test_create_unknown_backend_lists_available() {
        let mut registry = BackendRegistry::new();
        registry.register_factory("simulator", "", unavailable);

        let err = registry
            .create("nonexistent", BackendConfig::new("nonexistent"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("simulator"));
    }

    #[test]
    fn test_available_backends_sorted() {
        let mut registry = BackendRegistry::new();
        registry.register_factory("zebra", "", unavailable);
        registry.register_factory("alpha", "", unavailable);

        assert_eq!(registry.available_backends(), vec!["alpha", "zebra"]);
    }
}
