//! In-memory storage backend.
//!
//! Holds persisted text in a `DashMap`. Nothing survives the process, which
//! makes it the session-storage counterpart and the backend used in tests.

use super::Backend;
use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory backend using `DashMap`.
///
/// `MemoryBackend` is `Clone`; clones share the same underlying map, so a
/// test can keep a handle to inspect what a store persisted.
///
/// # Example
///
/// ```ignore
/// use mirrorstore::MemoryBackend;
///
/// let backend = MemoryBackend::new();
/// backend.set_item("[/]prefs", r#"{"theme":"dark"}"#)?;
/// ```
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Arc<DashMap<String, String>>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if `key` is stored.
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }
}

impl Backend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }
}
