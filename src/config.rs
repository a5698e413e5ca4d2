//! Registry configuration.
//!
//! [`RegistryConfig`] carries the defaults a [`Registry`](crate::Registry)
//! applies to the stores it connects, plus the backend selection used by
//! the CLI. Every field has a default, so an empty TOML file is valid:
//!
//! ```toml
//! public_path = "/"
//! logging = false
//! flush_on_drop = true
//! max_age = 0
//! backend = "file"
//! path = "/var/lib/app/store.redb"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{Backend, MemoryBackend, RedbBackend};
use crate::error::Error;
use crate::paths;
use crate::store::DEFAULT_PUBLIC_PATH;

/// Which backend the registry persists into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local, lost on exit.
    Memory,
    /// Durable redb file.
    #[default]
    File,
}

/// Registry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Scope for stores that do not set a public path.
    pub public_path: String,
    /// Verbose registry logging, also the default for new stores.
    pub logging: bool,
    /// Flush enabled stores when the registry is dropped without `shutdown()`.
    pub flush_on_drop: bool,
    /// Max age in seconds for stores that do not set one; 0 never expires.
    pub max_age: u64,
    pub backend: BackendKind,
    /// File backend location. Defaults to [`paths::get_store_path`].
    pub path: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            public_path: DEFAULT_PUBLIC_PATH.to_string(),
            logging: false,
            flush_on_drop: true,
            max_age: 0,
            backend: BackendKind::default(),
            path: None,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields have invalid types or values
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `public_path` is empty.
    pub fn validate(&self) -> crate::Result<()> {
        if self.public_path.is_empty() {
            return Err(Error::Config("public_path cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Opens the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the file backend location cannot be resolved or
    /// the database cannot be opened.
    pub fn open_backend(&self) -> Result<Arc<dyn Backend>> {
        match self.backend {
            BackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
            BackendKind::File => {
                let path = match &self.path {
                    Some(path) => path.clone(),
                    None => paths::get_store_path()?,
                };
                Ok(Arc::new(RedbBackend::open(path)?))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RegistryConfig::parse("").unwrap();
        assert_eq!(config.public_path, "/");
        assert!(!config.logging);
        assert!(config.flush_on_drop);
        assert_eq!(config.max_age, 0);
        assert_eq!(config.backend, BackendKind::File);
        assert!(config.path.is_none());
    }

    #[test]
    fn test_parse_all_fields() {
        let config = RegistryConfig::parse(
            r#"
            public_path = "/admin"
            logging = true
            flush_on_drop = false
            max_age = 3600
            backend = "memory"
            path = "/tmp/store.redb"
            "#,
        )
        .unwrap();

        assert_eq!(config.public_path, "/admin");
        assert!(config.logging);
        assert!(!config.flush_on_drop);
        assert_eq!(config.max_age, 3600);
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.path, Some(PathBuf::from("/tmp/store.redb")));
    }

    #[test]
    fn test_empty_public_path_rejected() {
        assert!(RegistryConfig::parse(r#"public_path = """#).is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(RegistryConfig::parse(r#"backend = "cloud""#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "max_age = 60\n").unwrap();

        let config = RegistryConfig::load_from(&path).unwrap();
        assert_eq!(config.max_age, 60);
    }

    #[test]
    fn test_open_file_backend() {
        let tmp = TempDir::new().unwrap();
        let config = RegistryConfig {
            path: Some(tmp.path().join("store.redb")),
            ..RegistryConfig::default()
        };

        let backend = config.open_backend().unwrap();
        backend.set_item("k", "v").unwrap();
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("v"));
    }
}
