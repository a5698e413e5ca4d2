//! Options recognized by [`Store`](super::Store) initialization.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::backend::Backend;

/// Scope used when no public path is given.
pub const DEFAULT_PUBLIC_PATH: &str = "/";

/// Options for connecting or re-initializing a store.
///
/// Every field is optional; unset fields fall back to the registry's
/// configuration (backend, public path, logging, max age) or to the
/// store's current setting (logging).
///
/// # Example
///
/// ```ignore
/// let options = StoreOptions::new()
///     .max_age(3600)
///     .data(json!({ "theme": "light" }))
///     .public_path("/admin");
/// let prefs = registry.connect("prefs", options)?;
/// ```
#[derive(Clone)]
pub struct StoreOptions {
    /// Backend to persist into. Defaults to the registry's backend.
    pub backend: Option<Arc<dyn Backend>>,
    /// Load persisted data and enable on init. Defaults to true.
    pub auto_enable: bool,
    /// Maximum data age in seconds; 0 means never expires.
    pub max_age: Option<u64>,
    /// Default values merged into the data map.
    pub data: Map<String, Value>,
    /// Verbose per-operation logging.
    pub logging: Option<bool>,
    /// Scope prefix of the qualified name.
    pub public_path: Option<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            backend: None,
            auto_enable: true,
            max_age: None,
            data: Map::new(),
            logging: None,
            public_path: None,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn backend<B: Backend>(mut self, backend: B) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    #[must_use]
    pub fn shared_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn auto_enable(mut self, auto_enable: bool) -> Self {
        self.auto_enable = auto_enable;
        self
    }

    #[must_use]
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Sets default data from a JSON object. Non-object values are ignored.
    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        if let Value::Object(map) = data {
            self.data = map;
        }
        self
    }

    #[must_use]
    pub fn logging(mut self, logging: bool) -> Self {
        self.logging = Some(logging);
        self
    }

    #[must_use]
    pub fn public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = Some(public_path.into());
        self
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("backend", &self.backend.as_ref().map(|_| "<dyn Backend>"))
            .field("auto_enable", &self.auto_enable)
            .field("max_age", &self.max_age)
            .field("data", &self.data)
            .field("logging", &self.logging)
            .field("public_path", &self.public_path)
            .finish()
    }
}

/// Builds the `[<scope>]<name>` qualified name.
///
/// An empty scope falls back to [`DEFAULT_PUBLIC_PATH`].
pub fn qualified_name(name: &str, public_path: Option<&str>) -> String {
    let scope = public_path
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PUBLIC_PATH);
    format!("[{scope}]{name}")
}
