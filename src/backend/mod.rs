//! Storage backends for persisted store data.
//!
//! A backend is the external, synchronous key/value collaborator a
//! [`Store`](crate::Store) writes its serialized data into. Two backends
//! ship with the crate:
//!
//! - **RedbBackend**: Durable file-backed storage (default for the CLI)
//! - **MemoryBackend**: Process-local storage, lost on exit (session-like, tests)
//!
//! # Custom Backends
//!
//! Implement the `Backend` trait to persist somewhere else:
//!
//! ```ignore
//! use mirrorstore::{Backend, Registry, RegistryConfig};
//!
//! struct WebStorage { /* ... */ }
//! impl Backend for WebStorage { /* ... */ }
//!
//! let registry = Registry::new(WebStorage::new(), RegistryConfig::default());
//! ```

mod memory;
mod redb;

pub use self::memory::MemoryBackend;
pub use self::redb::RedbBackend;

use anyhow::Result;

/// Backend trait for persisted key/value text.
///
/// The contract mirrors web storage: values are opaque strings, there is no
/// iteration and no transactions. Backends are shared between stores and
/// outlive them, so they must be thread-safe (`Send + Sync`).
pub trait Backend: Send + Sync + 'static {
    /// Retrieves the text stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails
    /// (quota exceeded, disk full, etc.).
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn remove_item(&self, key: &str) -> Result<()>;
}
