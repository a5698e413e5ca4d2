//! Tests for the store registry.

use super::*;
use crate::backend::MemoryBackend;
use anyhow::bail;
use serde_json::{Value, json};

fn registry() -> (MemoryBackend, Registry) {
    let backend = MemoryBackend::new();
    let config = RegistryConfig {
        flush_on_drop: false,
        ..RegistryConfig::default()
    };
    (backend.clone(), Registry::new(backend, config))
}

/// Backend rejecting writes to one key.
struct RejectingBackend {
    inner: MemoryBackend,
    reject: String,
}

impl Backend for RejectingBackend {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        if key == self.reject {
            bail!("quota exceeded");
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        self.inner.remove_item(key)
    }
}

// =============================================================================
// Connect and lookup
// =============================================================================

#[test]
fn test_connect_returns_same_instance() {
    let (_, registry) = registry();

    let first = registry.connect("prefs", StoreOptions::new()).unwrap();
    let second = registry.connect("prefs", StoreOptions::new()).unwrap();

    assert!(Store::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_connect_reinitializes_existing_instance() {
    let (_, registry) = registry();

    let first = registry
        .connect("prefs", StoreOptions::new().data(json!({"theme": "light"})))
        .unwrap();
    first.set("volume", 3, false);

    let second = registry
        .connect("prefs", StoreOptions::new().data(json!({"lang": "en"})).max_age(60))
        .unwrap();

    assert_eq!(
        Value::Object(second.get_all()),
        json!({"theme": "light", "volume": 3, "lang": "en"})
    );
    assert_eq!(first.max_age(), 60);
}

#[test]
fn test_public_path_scopes_names() {
    let (_, registry) = registry();

    let root = registry.connect("prefs", StoreOptions::new()).unwrap();
    let admin = registry
        .connect("prefs", StoreOptions::new().public_path("/admin"))
        .unwrap();

    assert_eq!(root.name(), "[/]prefs");
    assert_eq!(admin.name(), "[/admin]prefs");
    assert!(!Store::ptr_eq(&root, &admin));
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_config_public_path_is_default_scope() {
    let config = RegistryConfig {
        public_path: "/app".to_string(),
        flush_on_drop: false,
        ..RegistryConfig::default()
    };
    let registry = Registry::new(MemoryBackend::new(), config);

    let store = registry.connect("prefs", StoreOptions::new()).unwrap();
    assert_eq!(store.name(), "[/app]prefs");
}

#[test]
fn test_connect_rejects_empty_name() {
    let (_, registry) = registry();
    assert!(matches!(
        registry.connect("", StoreOptions::new()),
        Err(Error::EmptyName)
    ));
}

#[test]
fn test_get_find_filter() {
    let (_, registry) = registry();
    registry.connect("prefs", StoreOptions::new()).unwrap();
    registry.connect("image-cache", StoreOptions::new()).unwrap();
    registry.connect("api-cache", StoreOptions::new()).unwrap();

    assert!(registry.get("[/]prefs").is_some());
    assert!(registry.get("prefs").is_none());

    assert_eq!(registry.find("cache").unwrap().name(), "[/]image-cache");
    assert!(registry.find("missing").is_none());

    let names: Vec<String> = registry
        .filter("cache")
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert_eq!(names, vec!["[/]image-cache", "[/]api-cache"]);

    let anchored = NamePattern::regex(r"^\[/\]api").unwrap();
    assert_eq!(registry.filter(anchored).len(), 1);
}

#[test]
fn test_get_all_and_instances_order() {
    let (_, registry) = registry();
    registry.connect("b", StoreOptions::new()).unwrap();
    registry.connect("a", StoreOptions::new()).unwrap();

    let all = registry.get_all();
    assert_eq!(all.keys().cloned().collect::<Vec<_>>(), vec!["[/]a", "[/]b"]);

    let ordered: Vec<String> = registry
        .instances()
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert_eq!(ordered, vec!["[/]b", "[/]a"]);
}

#[test]
fn test_config_max_age_applies_when_unset() {
    let config = RegistryConfig {
        max_age: 90,
        flush_on_drop: false,
        ..RegistryConfig::default()
    };
    let registry = Registry::new(MemoryBackend::new(), config);

    let inherited = registry.connect("a", StoreOptions::new()).unwrap();
    let own = registry.connect("b", StoreOptions::new().max_age(5)).unwrap();

    assert_eq!(inherited.max_age(), 90);
    assert_eq!(own.max_age(), 5);
}

// =============================================================================
// Bulk operations
// =============================================================================

#[test]
fn test_clear_all_only() {
    let (_, registry) = registry();
    let cache = registry.connect("cache", StoreOptions::new()).unwrap();
    let image_cache = registry.connect("image-cache", StoreOptions::new()).unwrap();
    let prefs = registry.connect("prefs", StoreOptions::new()).unwrap();
    for store in [&cache, &image_cache, &prefs] {
        store.set("k", "v", false);
    }

    let report = registry.clear_all(&ClearFilter::new().only("cache"));

    assert_eq!(report.cleared, vec!["[/]cache", "[/]image-cache"]);
    assert_eq!(report.skipped, vec!["[/]prefs"]);
    assert!(!cache.has("k"));
    assert!(!image_cache.has("k"));
    assert_eq!(prefs.get("k"), Some(json!("v")));
}

#[test]
fn test_clear_all_not() {
    let (_, registry) = registry();
    let cache = registry.connect("cache", StoreOptions::new()).unwrap();
    let prefs = registry.connect("prefs", StoreOptions::new()).unwrap();
    cache.set("k", 1, false);
    prefs.set("k", 1, false);

    registry.clear_all(&ClearFilter::new().not("prefs"));

    assert!(!cache.has("k"));
    assert!(prefs.has("k"));
}

#[test]
fn test_clear_all_without_filter_clears_everything() {
    let (backend, registry) = registry();
    let a = registry.connect("a", StoreOptions::new().data(json!({"x": 0}))).unwrap();
    a.set("x", 5, false);

    let report = registry.clear_all(&ClearFilter::default());

    assert_eq!(report.cleared, vec!["[/]a"]);
    assert_eq!(a.get("x"), Some(json!(0)));
    assert_eq!(backend.get_item("[/]a").unwrap().as_deref(), Some(r#"{"x":0}"#));
}

#[test]
fn test_size_sums_instances() {
    let (_, registry) = registry();
    registry
        .connect("a", StoreOptions::new().data(json!({"a": 1})))
        .unwrap();
    registry
        .connect("b", StoreOptions::new().data(json!({"bb": "x"})))
        .unwrap();

    // 1 + 1, then 2 + 3
    assert_eq!(registry.size(), 7);
}

// =============================================================================
// Flush and shutdown
// =============================================================================

#[test]
fn test_flush_saves_only_enabled_stores() {
    let (backend, registry) = registry();
    let enabled = registry.connect("enabled", StoreOptions::new()).unwrap();
    let disabled = registry
        .connect("disabled", StoreOptions::new().auto_enable(false))
        .unwrap();
    enabled.set("k", 1, false);
    disabled.set("k", 1, false);

    let report = registry.flush();

    assert_eq!(report.saved, vec!["[/]enabled"]);
    assert_eq!(report.skipped, vec!["[/]disabled"]);
    assert!(report.is_success());
    assert_eq!(backend.get_item("[/]enabled").unwrap().as_deref(), Some(r#"{"k":1}"#));
    assert!(!backend.contains("[/]disabled"));
}

#[test]
fn test_flush_continues_after_failure() {
    let inner = MemoryBackend::new();
    let backend = RejectingBackend {
        inner: inner.clone(),
        reject: "[/]first".to_string(),
    };
    let config = RegistryConfig {
        flush_on_drop: false,
        ..RegistryConfig::default()
    };
    let registry = Registry::new(backend, config);
    registry.connect("first", StoreOptions::new()).unwrap();
    registry.connect("second", StoreOptions::new()).unwrap();

    let report = registry.flush();

    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "[/]first");
    assert_eq!(report.saved, vec!["[/]second"]);
    assert!(inner.contains("[/]second"));
}

#[test]
fn test_shutdown_flushes_once() {
    let (backend, registry) = registry();
    let store = registry.connect("prefs", StoreOptions::new()).unwrap();
    store.set("k", 1, false);

    let first = registry.shutdown();
    assert_eq!(first.saved, vec!["[/]prefs"]);
    assert!(registry.is_shut_down());

    store.set("k", 2, false);
    let second = registry.shutdown();
    assert!(second.saved.is_empty());
    assert_eq!(backend.get_item("[/]prefs").unwrap().as_deref(), Some(r#"{"k":1}"#));
}

#[test]
fn test_drop_flushes_when_enabled() {
    let backend = MemoryBackend::new();
    {
        let registry = Registry::new(backend.clone(), RegistryConfig::default());
        let store = registry.connect("prefs", StoreOptions::new()).unwrap();
        store.set("k", "v", false);
    }
    assert_eq!(backend.get_item("[/]prefs").unwrap().as_deref(), Some(r#"{"k":"v"}"#));
}

#[test]
fn test_drop_does_not_flush_when_disabled_in_config() {
    let (backend, registry) = registry();
    let store = registry.connect("prefs", StoreOptions::new()).unwrap();
    store.set("k", "v", false);

    drop(registry);
    assert!(!backend.contains("[/]prefs"));
}
