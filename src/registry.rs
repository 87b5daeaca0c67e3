use crate::exports::ExportRef;
use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;

// -----------------------------------------------------------------------------
// Module registry
// -----------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RegistryError {
    /// No real module is known under this key.
    #[error("module `{0}` is not present in the registry")]
    UnknownModule(String),
}

/// Deferred interceptor, run by the registry the next time its module key is
/// loaded. The factory receives the registry back so it can load the real,
/// unmocked module to patch.
pub type MockFactory = Box<dyn FnOnce(&mut dyn ModuleRegistry) -> Result<ExportRef, RegistryError>>;

/// The host runner's module table, as far as this crate is concerned.
pub trait ModuleRegistry {
    /// Real, unmocked exports for `key`.
    fn require_actual(&mut self, key: &str) -> Result<ExportRef, RegistryError>;

    /// Queue `factory` to replace `key`'s exports on its next load.
    /// Re-registering the same key discards the earlier factory.
    fn register_mock(&mut self, key: &str, factory: MockFactory) -> Result<(), RegistryError>;
}

/// In-memory registry with the same observable behavior as the host runner's
/// table: a pending-factory queue consumed on load, a loaded-module cache,
/// and a reset between independent runs. Hosts with a real loader implement
/// [`ModuleRegistry`] directly; tests run against this one.
#[derive(Default)]
pub struct InMemoryRegistry {
    modules: HashMap<String, ExportRef>,
    pending: IndexMap<String, MockFactory>,
    loaded: HashMap<String, ExportRef>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the real exports for a module key.
    pub fn insert_module(&mut self, key: impl Into<String>, exports: ExportRef) {
        self.modules.insert(key.into(), exports);
    }

    /// Load a module, consuming any pending mock factory for it. A factory
    /// that fails is reported and dropped; the real module loads instead, so
    /// the run continues unmocked rather than aborting.
    pub fn load(&mut self, key: &str) -> Result<ExportRef, RegistryError> {
        if let Some(cached) = self.loaded.get(key) {
            return Ok(cached.clone());
        }
        if let Some(factory) = self.pending.shift_remove(key) {
            match factory(self) {
                Ok(mocked) => {
                    self.loaded.insert(key.to_string(), mocked.clone());
                    return Ok(mocked);
                }
                Err(err) => {
                    tracing::warn!(module = key, error = %err, "mock factory failed, loading real module");
                }
            }
        }
        self.require_actual(key)
    }

    /// Drop every pending factory and mocked load. Seeded real modules stay.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.loaded.clear();
    }
}

impl ModuleRegistry for InMemoryRegistry {
    fn require_actual(&mut self, key: &str) -> Result<ExportRef, RegistryError> {
        self.modules
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownModule(key.to_string()))
    }

    fn register_mock(&mut self, key: &str, factory: MockFactory) -> Result<(), RegistryError> {
        // Last registration wins, and runs at the position of the newest call.
        self.pending.shift_remove(key);
        self.pending.insert(key.to_string(), factory);
        Ok(())
    }
}
