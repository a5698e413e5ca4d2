//! Registry of named stores.
//!
//! The [`Registry`] is an explicit object owned by the application root. It
//! tracks every store it connects (one per qualified name, in connection
//! order), offers lookups and bulk operations over them, and owns the
//! teardown flush.
//!
//! # Lifecycle
//!
//! The host calls [`Registry::shutdown`] once when the process is about to
//! terminate. It saves every enabled store and isolates failures, so one
//! failing save never blocks the rest. If the host never calls it, the
//! registry flushes from `Drop` (see `RegistryConfig::flush_on_drop`).
//! [`Registry::flush`] runs the same loop without the once-guard.
//!
//! # Example
//!
//! ```ignore
//! use mirrorstore::{ClearFilter, MemoryBackend, Registry, RegistryConfig, StoreOptions};
//!
//! let registry = Registry::new(MemoryBackend::new(), RegistryConfig::default());
//! let prefs = registry.connect("prefs", StoreOptions::new())?;
//! prefs.set("theme", "dark", false);
//!
//! registry.clear_all(&ClearFilter::new().only("cache"));
//! registry.shutdown();
//! ```

mod pattern;

#[cfg(test)]
mod tests;

pub use pattern::{ClearFilter, NamePattern};

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::backend::{Backend, MemoryBackend};
use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::store::{Store, StoreOptions, qualified_name};

/// Outcome of a flush over all registered stores.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Stores saved successfully.
    pub saved: Vec<String>,
    /// Disabled stores, not saved.
    pub skipped: Vec<String>,
    /// Stores whose save failed.
    pub failed: Vec<(String, Error)>,
}

impl FlushReport {
    /// Returns true if no save failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of [`Registry::clear_all`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub cleared: Vec<String>,
    pub skipped: Vec<String>,
}

/// Registry of named stores sharing one default backend.
pub struct Registry {
    backend: Arc<dyn Backend>,
    config: RegistryConfig,
    instances: RwLock<Vec<Store>>,
    shut_down: AtomicBool,
}

impl Registry {
    /// Creates a registry whose stores persist into `backend` by default.
    pub fn new<B: Backend>(backend: B, config: RegistryConfig) -> Self {
        Self::with_backend(Arc::new(backend), config)
    }

    /// Creates a registry from a shared backend.
    pub fn with_backend(backend: Arc<dyn Backend>, config: RegistryConfig) -> Self {
        Self {
            backend,
            config,
            instances: RwLock::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Creates a registry over a fresh in-memory backend.
    pub fn memory() -> Self {
        Self::new(MemoryBackend::new(), RegistryConfig::default())
    }

    /// Creates a registry with the backend selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened.
    pub fn open(config: RegistryConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let backend = config.open_backend()?;
        Ok(Self::with_backend(backend, config))
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Default backend handed to stores that do not bring their own.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Returns the store for `name`, creating and registering it if needed.
    ///
    /// Connecting an existing qualified name re-initializes that store with
    /// `options` and returns the same instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyName`] if `name` is empty.
    pub fn connect(&self, name: &str, mut options: StoreOptions) -> Result<Store> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        let public_path = options
            .public_path
            .take()
            .unwrap_or_else(|| self.config.public_path.clone());
        let qualified = qualified_name(name, Some(public_path.as_str()));
        options.max_age = options.max_age.or(Some(self.config.max_age));

        let mut instances = self.instances.write();

        if let Some(store) = instances.iter().find(|s| s.name() == qualified) {
            debug!(store = %qualified, "Re-initializing existing store");
            store.init(options, &self.backend);
            return Ok(store.clone());
        }

        debug!(store = %qualified, "Creating store");
        let store = Store::new(qualified, options, &self.backend, self.config.logging);
        instances.push(store.clone());
        Ok(store)
    }

    /// Gets a store by its exact qualified name.
    pub fn get(&self, qualified_name: &str) -> Option<Store> {
        self.instances
            .read()
            .iter()
            .find(|s| s.name() == qualified_name)
            .cloned()
    }

    /// Returns the first store whose qualified name matches `pattern`.
    pub fn find(&self, pattern: impl Into<NamePattern>) -> Option<Store> {
        let pattern = pattern.into();
        self.instances
            .read()
            .iter()
            .find(|s| pattern.matches(s.name()))
            .cloned()
    }

    /// Returns every store whose qualified name matches `pattern`.
    pub fn filter(&self, pattern: impl Into<NamePattern>) -> Vec<Store> {
        let pattern = pattern.into();
        self.instances
            .read()
            .iter()
            .filter(|s| pattern.matches(s.name()))
            .cloned()
            .collect()
    }

    /// Snapshot of all stores keyed by qualified name.
    pub fn get_all(&self) -> BTreeMap<String, Store> {
        self.instances
            .read()
            .iter()
            .map(|s| (s.name().to_string(), s.clone()))
            .collect()
    }

    /// Snapshot of all stores in connection order.
    pub fn instances(&self) -> Vec<Store> {
        self.instances.read().clone()
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    /// Clears every store selected by `filter`.
    pub fn clear_all(&self, filter: &ClearFilter) -> ClearReport {
        let mut report = ClearReport::default();

        for store in self.instances() {
            if filter.selects(store.name()) {
                store.clear();
                report.cleared.push(store.name().to_string());
            } else {
                report.skipped.push(store.name().to_string());
            }
        }

        if self.config.logging {
            info!(cleared = ?report.cleared, skipped = ?report.skipped, "Cleared stores");
        }
        report
    }

    /// Approximate total size of all stores. See [`Store::size`].
    pub fn size(&self) -> usize {
        self.instances.read().iter().map(Store::size).sum()
    }

    /// Saves every enabled store, in connection order.
    ///
    /// A failing save is logged and recorded; the remaining stores are
    /// still saved.
    pub fn flush(&self) -> FlushReport {
        let mut report = FlushReport::default();

        for store in self.instances() {
            if !store.is_enabled() {
                report.skipped.push(store.name().to_string());
                continue;
            }
            match store.try_save() {
                Ok(()) => report.saved.push(store.name().to_string()),
                Err(err) => {
                    warn!(store = %store.name(), error = %err, "Failed saving store");
                    report.failed.push((store.name().to_string(), err));
                },
            }
        }

        debug!(
            saved = report.saved.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Flushed stores"
        );
        report
    }

    /// Runs the teardown flush. Only the first call flushes; later calls
    /// return an empty report.
    pub fn shutdown(&self) -> FlushReport {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            debug!("Registry already shut down");
            return FlushReport::default();
        }
        self.flush()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if self.config.flush_on_drop && !self.is_shut_down() {
            self.shutdown();
        }
    }
}
