//! Redb-backed storage backend.
//!
//! Durable counterpart of browser local storage: every `set_item` is one
//! committed write transaction, so persisted text survives restarts.

use super::Backend;
use anyhow::{Context, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Table holding persisted text keyed by backend key.
pub(crate) const ITEMS_TABLE: TableDefinition<'static, &'static str, &'static str> =
    TableDefinition::new("items");

/// Redb-backed storage backend.
///
/// `RedbBackend` is `Clone` and can be shared across stores. The underlying
/// database handles concurrent access safely.
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Opens or creates a redb database at the given path.
    ///
    /// Creates parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created (permissions, disk full, etc.)
    /// - Initialization transaction fails to begin or commit
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create storage directory: {}", parent.display())
            })?;
        }

        let db = Database::create(path)
            .with_context(|| format!("Failed to open storage database: {}", path.display()))?;

        // Create the table up front so reads never hit a missing table
        let write_txn = db
            .begin_write()
            .context("Failed to begin initialization transaction")?;
        {
            let _table = write_txn
                .open_table(ITEMS_TABLE)
                .context("Failed to initialize items table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initialization transaction")?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl Backend for RedbBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(ITEMS_TABLE)
            .context("Failed to open items table")?;

        let result = table
            .get(key)
            .with_context(|| format!("Failed to read key '{key}'"))?;

        Ok(result.map(|guard| guard.value().to_string()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        {
            let mut table = write_txn
                .open_table(ITEMS_TABLE)
                .context("Failed to open items table")?;

            table
                .insert(key, value)
                .with_context(|| format!("Failed to insert key '{key}'"))?;
        }

        write_txn
            .commit()
            .context("Failed to commit set transaction")?;

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        {
            let mut table = write_txn
                .open_table(ITEMS_TABLE)
                .context("Failed to open items table")?;

            table
                .remove(key)
                .with_context(|| format!("Failed to remove key '{key}'"))?;
        }

        write_txn
            .commit()
            .context("Failed to commit remove transaction")?;

        Ok(())
    }
}
