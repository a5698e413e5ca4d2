//! Path utilities for mirrorstore data.
//!
//! - [`get_home_dir`] - base directory for all mirrorstore data
//! - [`get_store_path`] - `<home>/store.redb` (default file backend)
//! - [`get_config_path`] - `<home>/config.toml` (registry settings)

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the mirrorstore base directory.
///
/// Resolution order:
/// 1. `MIRRORSTORE_HOME` environment variable (if set)
/// 2. `<platform data dir>/mirrorstore/` (default)
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("MIRRORSTORE_HOME")
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }

    let data = dirs::data_dir().context("Failed to get data directory")?;
    Ok(data.join("mirrorstore"))
}

/// Get the default file backend path: `<home>/store.redb`
pub fn get_store_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("store.redb"))
}

/// Get the default config path: `<home>/config.toml`
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("config.toml"))
}
