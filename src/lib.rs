//! Lazily persisted key/value stores over synchronous storage backends.
//!
//! Each [`Store`] mirrors its persisted state in a plain in-memory JSON map.
//! Reads and writes only touch that map; serialization to the [`Backend`]
//! happens at checkpoints: load on connect, explicit `save()`, and the
//! teardown flush run by the [`Registry`].
//!
//! ```ignore
//! use mirrorstore::{Registry, RegistryConfig, StoreOptions};
//! use serde_json::json;
//!
//! let registry = Registry::open(RegistryConfig::default())?;
//! let prefs = registry.connect("prefs", StoreOptions::new().data(json!({"theme": "light"})))?;
//!
//! prefs.set("theme", "dark", false);
//! assert_eq!(prefs.get("theme"), Some(json!("dark")));
//!
//! registry.shutdown();
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod paths;
pub mod registry;
pub mod store;

pub use backend::{Backend, MemoryBackend, RedbBackend};
pub use config::{BackendKind, RegistryConfig};
pub use error::{Error, Result};
pub use registry::{ClearFilter, ClearReport, FlushReport, NamePattern, Registry};
pub use store::{Store, StoreOptions, coerce};
