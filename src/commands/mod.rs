//! CLI command implementations.
//!
//! Each action connects the named store through the registry, applies the
//! change, and leaves persisting to the registry shutdown in `main`. Writes
//! are also saved immediately so a failed shutdown flush loses nothing.

use anyhow::Result;
use serde_json::Value;

use mirrorstore::{Registry, Store, StoreOptions};

use crate::StoreAction;

/// Execute a store command.
pub fn execute(registry: &Registry, name: &str, action: StoreAction) -> Result<()> {
    let store = registry.connect(name, StoreOptions::new())?;

    match action {
        StoreAction::Get { key } => match key {
            Some(key) => print_value(store.get(&key).as_ref())?,
            None => print_value(Some(&Value::Object(store.get_all())))?,
        },
        StoreAction::Set { key, value } => {
            ensure_enabled(&store)?;
            store.set(key, parse_value(value), false);
            store.try_save()?;
        },
        StoreAction::Remove { key } => {
            ensure_enabled(&store)?;
            if store.remove(&key, false).is_none() {
                println!("Key not found: {key}");
            }
            store.try_save()?;
        },
        StoreAction::Clear => {
            ensure_enabled(&store)?;
            store.clear();
            println!("Cleared {}", store.name());
        },
        StoreAction::Size => println!("{}", store.size()),
        StoreAction::Enable => {
            store.enable();
            // Disabled stores skip loading on connect; load now that the marker is gone
            registry.connect(name, StoreOptions::new())?;
            println!("Enabled {}", store.name());
        },
        StoreAction::Disable { keep_data } => {
            store.disable(!keep_data);
            println!("Disabled {}", store.name());
        },
        StoreAction::Status => print_status(&store),
    }

    Ok(())
}

/// Refuse writes to a disabled store.
///
/// Disabled stores are not loaded on connect, so saving one would replace
/// its persisted data with the defaults.
fn ensure_enabled(store: &Store) -> Result<()> {
    if !store.is_enabled() {
        anyhow::bail!("{} is disabled; run `enable` first", store.name());
    }
    Ok(())
}

/// Parse a command-line value as JSON, falling back to a plain string.
fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn print_value(value: Option<&Value>) -> Result<()> {
    match value {
        Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
        None => println!("undefined"),
    }
    Ok(())
}

fn print_status(store: &Store) {
    println!("Name:     {}", store.name());
    println!("Enabled:  {}", store.is_enabled());
    println!("Keys:     {}", store.with_data(|data| data.len()));
    println!("Size:     {}", store.size());
    match store.max_age() {
        0 => println!("Max age:  unlimited"),
        secs => println!("Max age:  {secs}s"),
    }
    println!("Expired:  {}", store.is_expired());
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorstore::{Backend, MemoryBackend, RegistryConfig};
    use serde_json::json;

    fn registry() -> (MemoryBackend, Registry) {
        let backend = MemoryBackend::new();
        let config = RegistryConfig {
            flush_on_drop: false,
            ..RegistryConfig::default()
        };
        (backend.clone(), Registry::new(backend, config))
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42".to_string()), json!(42));
        assert_eq!(parse_value("[1,2]".to_string()), json!([1, 2]));
        assert_eq!(parse_value("hello world".to_string()), json!("hello world"));
    }

    #[test]
    fn test_set_persists_immediately() {
        let (backend, registry) = registry();

        execute(
            &registry,
            "prefs",
            StoreAction::Set {
                key: "theme".to_string(),
                value: "dark".to_string(),
            },
        )
        .unwrap();

        assert_eq!(
            backend.get_item("[/]prefs").unwrap().as_deref(),
            Some(r#"{"theme":"dark"}"#)
        );
    }

    #[test]
    fn test_enable_loads_persisted_data() {
        let (backend, registry) = registry();
        backend.set_item("[/]prefs", r#"{"theme":"dark"}"#).unwrap();
        backend.set_item("[/]prefs:disabled", "true").unwrap();

        execute(&registry, "prefs", StoreAction::Enable).unwrap();

        let store = registry.get("[/]prefs").unwrap();
        assert!(store.is_enabled());
        assert_eq!(store.get("theme"), Some(json!("dark")));
        assert!(!backend.contains("[/]prefs:disabled"));
    }

    #[test]
    fn test_disable_keep_data() {
        let (backend, registry) = registry();
        backend.set_item("[/]prefs", r#"{"theme":"dark"}"#).unwrap();

        execute(&registry, "prefs", StoreAction::Disable { keep_data: true }).unwrap();

        let store = registry.get("[/]prefs").unwrap();
        assert!(!store.is_enabled());
        assert_eq!(store.get("theme"), Some(json!("dark")));
        assert!(backend.contains("[/]prefs:disabled"));
    }

    #[test]
    fn test_writes_to_disabled_store_are_refused() {
        let (backend, registry) = registry();
        let saved = r#"{"lang":"en","theme":"dark"}"#;
        backend.set_item("[/]prefs", saved).unwrap();
        backend.set_item("[/]prefs:disabled", "true").unwrap();

        let set = execute(
            &registry,
            "prefs",
            StoreAction::Set {
                key: "volume".to_string(),
                value: "7".to_string(),
            },
        );
        assert!(set.is_err());

        let remove = execute(
            &registry,
            "prefs",
            StoreAction::Remove {
                key: "theme".to_string(),
            },
        );
        assert!(remove.is_err());
        assert!(execute(&registry, "prefs", StoreAction::Clear).is_err());

        assert_eq!(backend.get_item("[/]prefs").unwrap().as_deref(), Some(saved));
    }
}
