//! Plugin system for the shell
//!
//! Plugins are optional feature units identified by name. The registry owns
//! every loaded plugin exclusively; callers only ever hold a [`PluginHandle`],
//! which stops resolving once the plugin it named is unloaded.

use crate::error::{ExtensionError, ExtensionResult};
use crate::facade::NodeFacade;
use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Plugin trait that all shell plugins implement
pub trait Plugin: Send {
    /// Called once after construction. On error the plugin is dropped unregistered.
    fn initialize(&mut self, context: &PluginContext) -> ExtensionResult<()>;

    /// Called once before the plugin is dropped.
    fn finalize(&mut self) -> ExtensionResult<()> {
        Ok(())
    }

    /// Called after every completed refresh tick.
    fn poll(&mut self, _context: &PluginContext) -> ExtensionResult<()> {
        Ok(())
    }
}

/// Host context handed to a plugin factory and its hooks
#[derive(Clone)]
pub struct PluginContext {
    /// Name the plugin is registered under
    pub name: String,

    /// The shell's facade binding
    pub facade: Arc<dyn NodeFacade>,

    /// Plugin-private data directory
    pub data_dir: PathBuf,
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("name", &self.name)
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

/// Non-owning reference to a loaded plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginHandle {
    name: Arc<str>,
    generation: u64,
}

impl PluginHandle {
    /// The name the plugin was loaded under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct LoadedPlugin {
    plugin: Box<dyn Plugin>,
    context: PluginContext,
    generation: u64,
}

/// Owns the loaded plugins, keyed by unique name.
pub struct PluginRegistry {
    plugins: HashMap<String, LoadedPlugin>,
    load_order: Vec<String>,
    facade: Arc<dyn NodeFacade>,
    data_dir: PathBuf,
    next_generation: u64,
}

impl PluginRegistry {
    /// Create a registry whose plugins see `facade` and keep data under `data_dir/<name>`.
    pub fn new(facade: Arc<dyn NodeFacade>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugins: HashMap::new(),
            load_order: Vec::new(),
            facade,
            data_dir: data_dir.into(),
            next_generation: 0,
        }
    }

    /// Constructs, initializes and registers a plugin.
    ///
    /// The factory is not invoked when `name` is already loaded.
    pub fn load<F>(&mut self, name: &str, factory: F) -> ExtensionResult<PluginHandle>
    where
        F: FnOnce(&PluginContext) -> Box<dyn Plugin>,
    {
        if self.plugins.contains_key(name) {
            return Err(ExtensionError::DuplicatePlugin(name.to_string()));
        }

        let context = PluginContext {
            name: name.to_string(),
            facade: self.facade.clone(),
            data_dir: self.data_dir.join(name),
        };

        let mut plugin = factory(&context);
        let initialized = catch_unwind(AssertUnwindSafe(|| plugin.initialize(&context)));
        let reason = match initialized {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some("initialize panicked".to_string()),
        };
        if let Some(reason) = reason {
            error!("Failed to initialize plugin {}: {}", name, reason);
            return Err(ExtensionError::InitializationFailed {
                plugin: name.to_string(),
                reason,
            });
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        self.plugins.insert(
            name.to_string(),
            LoadedPlugin {
                plugin,
                context,
                generation,
            },
        );
        self.load_order.push(name.to_string());
        info!("Loaded plugin: {}", name);

        Ok(PluginHandle {
            name: Arc::from(name),
            generation,
        })
    }

    /// Loads the catalog entry registered under `name`.
    pub fn load_from_catalog(
        &mut self,
        catalog: &PluginCatalog,
        name: &str,
    ) -> ExtensionResult<PluginHandle> {
        let factory = catalog
            .factory(name)
            .ok_or_else(|| ExtensionError::UnknownPlugin(name.to_string()))?;
        self.load(name, |context| factory(context))
    }

    /// Removes, finalizes and drops the plugin.
    ///
    /// Finalize failures are logged, never returned.
    pub fn unload(&mut self, name: &str) -> ExtensionResult<()> {
        let loaded = self
            .plugins
            .remove(name)
            .ok_or_else(|| ExtensionError::PluginNotFound(name.to_string()))?;
        self.load_order.retain(|loaded_name| loaded_name != name);
        finalize(name, loaded);
        Ok(())
    }

    /// Finalizes every plugin in reverse load order.
    pub fn unload_all(&mut self) {
        if self.load_order.is_empty() {
            return;
        }
        info!("Unloading {} plugins", self.load_order.len());

        while let Some(name) = self.load_order.pop() {
            if let Some(loaded) = self.plugins.remove(&name) {
                finalize(&name, loaded);
            }
        }
    }

    /// Runs every plugin's poll hook in load order.
    pub fn poll_all(&mut self) {
        for name in &self.load_order {
            let Some(loaded) = self.plugins.get_mut(name) else {
                continue;
            };
            let LoadedPlugin {
                plugin, context, ..
            } = loaded;
            match catch_unwind(AssertUnwindSafe(|| plugin.poll(context))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Plugin {} failed to poll: {}", name, e),
                Err(_) => warn!("Plugin {} panicked while polling", name),
            }
        }
    }

    /// Resolves a handle. Stale handles resolve to `None`.
    pub fn get(&self, handle: &PluginHandle) -> Option<&dyn Plugin> {
        self.plugins
            .get(handle.name())
            .filter(|loaded| loaded.generation == handle.generation)
            .map(|loaded| loaded.plugin.as_ref())
    }

    /// Mutable access to a loaded plugin, if `handle` is still live.
    pub fn get_mut(&mut self, handle: &PluginHandle) -> Option<&mut (dyn Plugin + 'static)> {
        self.plugins
            .get_mut(handle.name())
            .filter(|loaded| loaded.generation == handle.generation)
            .map(|loaded| loaded.plugin.as_mut())
    }

    /// Whether `handle` still refers to a loaded plugin.
    pub fn is_live(&self, handle: &PluginHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Loaded plugin names in load order.
    pub fn names(&self) -> Vec<String> {
        self.load_order.clone()
    }

    /// Whether a plugin is loaded under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Number of loaded plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is loaded.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        self.unload_all();
    }
}

fn finalize(name: &str, mut loaded: LoadedPlugin) {
    match catch_unwind(AssertUnwindSafe(|| loaded.plugin.finalize())) {
        Ok(Ok(())) => debug!("Plugin {} finalized", name),
        Ok(Err(e)) => warn!("Error finalizing plugin {}: {}", name, e),
        Err(_) => error!("Plugin {} panicked while finalizing", name),
    }
    drop(loaded);
    info!("Unloaded plugin: {}", name);
}

/// Constructs a plugin against its host context.
pub type PluginFactory = Arc<dyn Fn(&PluginContext) -> Box<dyn Plugin> + Send + Sync>;

/// Plugins available for loading, by name.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&PluginContext) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// The factory registered under `name`.
    pub fn factory(&self, name: &str) -> Option<PluginFactory> {
        self.factories.get(name).cloned()
    }

    /// Whether a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::Unbound;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct TestPlugin {
        polls: Arc<AtomicUsize>,
        fail_init: bool,
    }

    impl Plugin for TestPlugin {
        fn initialize(&mut self, _context: &PluginContext) -> ExtensionResult<()> {
            if self.fail_init {
                return Err(ExtensionError::operation_failed("no"));
            }
            Ok(())
        }

        fn poll(&mut self, _context: &PluginContext) -> ExtensionResult<()> {
            self.polls.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn registry() -> PluginRegistry {
        let temp_dir = tempdir().unwrap();
        PluginRegistry::new(Arc::new(Unbound), temp_dir.path())
    }

    fn plugin(polls: &Arc<AtomicUsize>) -> Box<dyn Plugin> {
        Box::new(TestPlugin {
            polls: polls.clone(),
            fail_init: false,
        })
    }

    #[test]
    fn test_load_and_poll() {
        let polls = Arc::new(AtomicUsize::new(0));
        let mut registry = registry();

        let handle = registry.load("counter", |_| plugin(&polls)).unwrap();
        assert_eq!(handle.name(), "counter");
        assert!(registry.is_live(&handle));

        registry.poll_all();
        registry.poll_all();
        assert_eq!(polls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_context_data_dir_is_per_plugin() {
        let temp_dir = tempdir().unwrap();
        let mut registry = PluginRegistry::new(Arc::new(Unbound), temp_dir.path());
        let mut seen = None;
        registry
            .load("named", |context| {
                seen = Some(context.data_dir.clone());
                plugin(&Arc::new(AtomicUsize::new(0)))
            })
            .unwrap();
        assert_eq!(seen, Some(temp_dir.path().join("named")));
    }

    #[test]
    fn test_failed_initialize_registers_nothing() {
        let mut registry = registry();
        let err = registry
            .load("broken", |_| {
                Box::new(TestPlugin {
                    polls: Arc::new(AtomicUsize::new(0)),
                    fail_init: true,
                })
            })
            .unwrap_err();

        assert!(matches!(err, ExtensionError::InitializationFailed { .. }));
        assert!(!registry.contains("broken"));
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_catalog_unknown_name() {
        let mut registry = registry();
        let catalog = PluginCatalog::new();
        assert_eq!(
            registry.load_from_catalog(&catalog, "missing").unwrap_err(),
            ExtensionError::UnknownPlugin("missing".to_string())
        );
    }
}
