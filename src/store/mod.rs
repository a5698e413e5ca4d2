//! Named stores mirroring persisted data in memory.
//!
//! A [`Store`] holds a plain JSON map that every read and write works on.
//! Serialization to the backend only happens at checkpoints: on init (load),
//! on `save()` (explicitly or via `auto_save`), on `clear()`/`disable()`,
//! and when the owning [`Registry`](crate::Registry) flushes at shutdown.
//!
//! # Persisted layout
//!
//! For a store with qualified name `N`:
//!
//! - `N` holds the JSON text of the whole data map
//! - `N:disabled` marks the store administratively disabled; the marker
//!   survives restarts and blocks auto-loading until `enable()` is called

mod coercion;
mod options;


pub use coercion::{coerce, parse_number};
pub use options::{DEFAULT_PUBLIC_PATH, StoreOptions, qualified_name};

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::error::{Error, Result};

/// Data key holding the last write time (epoch millis).
pub const LAST_WRITE_KEY: &str = "lastWrite";
/// Data key holding the last read time (epoch millis).
pub const LAST_READ_KEY: &str = "lastRead";

const DISABLED_SUFFIX: &str = ":disabled";

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Handle to a named, lazily persisted store.
///
/// `Store` is a cheap `Clone` handle; clones refer to the same instance.
/// Use [`Store::ptr_eq`] to compare identity.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    name: String,
    default_data: Map<String, Value>,
    state: Mutex<StoreState>,
}

struct StoreState {
    backend: Arc<dyn Backend>,
    data: Map<String, Value>,
    logging: bool,
    max_age: u64,
    enabled: bool,
    last_touched: Option<i64>,
}

impl Store {
    /// Creates a store and runs the first initialization.
    ///
    /// Defaults are captured from `options.data` here and never change.
    pub(crate) fn new(
        name: String,
        options: StoreOptions,
        fallback_backend: &Arc<dyn Backend>,
        logging: bool,
    ) -> Self {
        let backend = options
            .backend
            .clone()
            .unwrap_or_else(|| Arc::clone(fallback_backend));

        let store = Self {
            inner: Arc::new(StoreInner {
                name,
                default_data: options.data.clone(),
                state: Mutex::new(StoreState {
                    backend,
                    data: Map::new(),
                    logging,
                    max_age: 0,
                    enabled: false,
                    last_touched: None,
                }),
            }),
        };
        store.init(options, fallback_backend);
        store
    }

    /// Re-initializes the store with new options.
    ///
    /// Resets backend, logging and max age, then rebuilds `data` as defaults,
    /// overlaid by the previous data, overlaid by `options.data`. Unless the
    /// backend holds the disabled marker or `auto_enable` is false, persisted
    /// data is merged on top and the store is enabled.
    pub(crate) fn init(&self, options: StoreOptions, fallback_backend: &Arc<dyn Backend>) {
        let mut state = self.inner.state.lock();

        state.backend = options
            .backend
            .unwrap_or_else(|| Arc::clone(fallback_backend));
        state.logging = options.logging.unwrap_or(state.logging);
        state.max_age = options.max_age.unwrap_or(0);

        let mut data = self.inner.default_data.clone();
        data.extend(std::mem::take(&mut state.data));
        data.extend(options.data);
        state.data = data;

        if !options.auto_enable || self.disabled_marker(&state) {
            return;
        }

        self.load(&mut state);
        self.enable_locked(&mut state);
    }

    /// Returns true if the backend holds the disabled marker.
    ///
    /// A marker that cannot be read counts as present, so a failing backend
    /// never triggers a load or an enable.
    fn disabled_marker(&self, state: &StoreState) -> bool {
        let key = self.disabled_key();
        match state.backend.get_item(&key) {
            Ok(marker) => marker.is_some_and(|m| !m.is_empty()),
            Err(err) => {
                warn!(store = %self.name(), error = %format!("{err:#}"), "Failed reading disabled marker");
                true
            },
        }
    }

    /// Merges persisted JSON over the current data.
    fn load(&self, state: &mut StoreState) {
        let saved = match state.backend.get_item(self.name()) {
            Ok(Some(saved)) if !saved.is_empty() => saved,
            Ok(_) => return,
            Err(err) => {
                warn!(store = %self.name(), error = %format!("{err:#}"), "Failed reading saved data");
                return;
            },
        };

        match serde_json::from_str::<Value>(&saved) {
            Ok(Value::Object(saved)) => state.data.extend(saved),
            Ok(_) => {
                warn!(store = %self.name(), saved = %saved, "Saved data is not an object, ignoring");
            },
            Err(err) => {
                warn!(store = %self.name(), error = %err, saved = %saved, "Failed parsing saved data");
            },
        }
    }

    /// Qualified name, `[<scope>]<name>`.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Defaults captured at construction.
    pub fn default_data(&self) -> &Map<String, Value> {
        &self.inner.default_data
    }

    /// Returns true if both handles refer to the same store.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Maximum data age in seconds; 0 means never expires.
    pub fn max_age(&self) -> u64 {
        self.inner.state.lock().max_age
    }

    /// Reads a value and coerces it into its typed form.
    ///
    /// Returns `None` when the key is absent or holds `"undefined"`.
    /// See [`coerce`] for the coercion rules.
    pub fn get(&self, key: &str) -> Option<Value> {
        let state = self.inner.state.lock();
        let result = state.data.get(key).and_then(coerce);
        if state.logging {
            debug!(store = %self.name(), key, result = ?result, "get");
        }
        result
    }

    /// Returns a copy of the whole data map.
    pub fn get_all(&self) -> Map<String, Value> {
        let state = self.inner.state.lock();
        if state.logging {
            debug!(store = %self.name(), result = ?state.data, "get");
        }
        state.data.clone()
    }

    /// Runs `f` against the data map without copying it.
    pub fn with_data<R>(&self, f: impl FnOnce(&Map<String, Value>) -> R) -> R {
        f(&self.inner.state.lock().data)
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.state.lock().data.contains_key(key)
    }

    /// Writes a value to the data map.
    ///
    /// Writes are never gated by the enabled state. The backend is only
    /// touched when `auto_save` is true.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>, auto_save: bool) {
        let mut state = self.inner.state.lock();
        self.set_locked(&mut state, key.into(), value.into());
        if auto_save {
            self.save_locked(&state);
        }
    }

    /// Writes every entry of `values`, saving once at the end if requested.
    pub fn set_state<I, K>(&self, values: I, auto_save: bool)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut state = self.inner.state.lock();
        for (key, value) in values {
            self.set_locked(&mut state, key.into(), value);
        }
        if auto_save {
            self.save_locked(&state);
        }
    }

    fn set_locked(&self, state: &mut StoreState, key: String, value: Value) {
        if state.logging {
            debug!(store = %self.name(), key = %key, value = %value, "set");
        }
        state.data.insert(key, value);
    }

    /// Removes a key from the data map, returning the stored value.
    pub fn remove(&self, key: &str, auto_save: bool) -> Option<Value> {
        let mut state = self.inner.state.lock();
        let removed = state.data.remove(key);
        if state.logging {
            debug!(store = %self.name(), key, "remove");
        }
        if auto_save {
            self.save_locked(&state);
        }
        removed
    }

    /// Resets data to the defaults and persists it.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        self.clear_locked(&mut state);
    }

    fn clear_locked(&self, state: &mut StoreState) {
        if state.logging {
            debug!(store = %self.name(), data = ?state.data, "clear");
        }
        state.data = self.inner.default_data.clone();
        self.save_locked(state);
    }

    /// Writes the data map to the backend.
    ///
    /// Failures are logged and swallowed; use [`Store::try_save`] to observe them.
    pub fn save(&self) {
        let state = self.inner.state.lock();
        self.save_locked(&state);
    }

    /// Writes the data map to the backend, returning any failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be serialized or the backend
    /// rejects the write.
    pub fn try_save(&self) -> Result<()> {
        let state = self.inner.state.lock();
        self.try_save_locked(&state)
    }

    fn save_locked(&self, state: &StoreState) {
        if let Err(err) = self.try_save_locked(state) {
            warn!(store = %self.name(), error = %err, "Failed saving store");
        }
    }

    fn try_save_locked(&self, state: &StoreState) -> Result<()> {
        let json = serde_json::to_string(&state.data).map_err(|source| Error::Serialize {
            name: self.name().to_string(),
            source,
        })?;
        if state.logging {
            debug!(store = %self.name(), data = %json, "save");
        }
        state
            .backend
            .set_item(self.name(), &json)
            .map_err(|err| Error::backend(self.name(), &err))
    }

    /// Persistently enables the store.
    ///
    /// Removes the disabled marker; if the data has expired it is cleared.
    pub fn enable(&self) {
        let mut state = self.inner.state.lock();
        self.enable_locked(&mut state);
    }

    fn enable_locked(&self, state: &mut StoreState) {
        state.enabled = true;
        let key = self.disabled_key();
        if let Err(err) = state.backend.remove_item(&key) {
            warn!(store = %self.name(), error = %format!("{err:#}"), "Failed removing disabled marker");
        }
        if self.is_expired_locked(state) {
            debug!(store = %self.name(), "Data expired, clearing");
            self.clear_locked(state);
        }
    }

    /// Persistently disables the store.
    ///
    /// With `auto_clear`, data is reset to defaults and persisted first.
    /// The disabled marker survives restarts: the store stays inactive
    /// until [`Store::enable`] is called.
    pub fn disable(&self, auto_clear: bool) {
        let mut state = self.inner.state.lock();
        if auto_clear {
            self.clear_locked(&mut state);
        }
        state.enabled = false;
        let key = self.disabled_key();
        if let Err(err) = state.backend.set_item(&key, "true") {
            warn!(store = %self.name(), error = %format!("{err:#}"), "Failed writing disabled marker");
        }
    }

    /// Returns true if `max_age` is set and the newest of `lastWrite` /
    /// `lastRead` in the data map is older than `max_age` seconds.
    ///
    /// A store without activity timestamps never expires.
    pub fn is_expired(&self) -> bool {
        let state = self.inner.state.lock();
        self.is_expired_locked(&state)
    }

    fn is_expired_locked(&self, state: &StoreState) -> bool {
        if state.max_age == 0 {
            return false;
        }

        let newest = [LAST_WRITE_KEY, LAST_READ_KEY]
            .iter()
            .filter_map(|key| state.data.get(*key).and_then(coercion::as_millis))
            .reduce(f64::max);

        match newest {
            Some(newest) => {
                let age_ms = now_millis() as f64 - newest;
                age_ms > state.max_age as f64 * 1000.0
            },
            None => false,
        }
    }

    /// Records a read time on the instance.
    ///
    /// This does not write into the data map, so it never affects
    /// [`Store::is_expired`]. Use [`Store::touch_data`] for that.
    pub fn touch(&self) {
        self.inner.state.lock().last_touched = Some(now_millis());
    }

    /// Time of the last [`Store::touch`], in epoch millis.
    pub fn last_touched(&self) -> Option<i64> {
        self.inner.state.lock().last_touched
    }

    /// Writes the current time into the data map's `lastRead`.
    pub fn touch_data(&self) {
        let mut state = self.inner.state.lock();
        state
            .data
            .insert(LAST_READ_KEY.to_string(), Value::from(now_millis()));
    }

    /// Approximate size of the data: per entry, the key length plus the
    /// length of the value's JSON text, counted in UTF-16 units.
    ///
    /// The JSON text is serde_json's, which differs from JavaScript's
    /// `JSON.stringify` for some floats: `1.0` counts as 3 (`1.0`, not `1`)
    /// and `1e21` is written `1e21` rather than `1e+21`.
    pub fn size(&self) -> usize {
        let state = self.inner.state.lock();
        state
            .data
            .iter()
            .map(|(key, value)| {
                key.encode_utf16().count() + value.to_string().encode_utf16().count()
            })
            .sum()
    }

    fn disabled_key(&self) -> String {
        format!("{}{DISABLED_SUFFIX}", self.name())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("enabled", &state.enabled)
            .field("max_age", &state.max_age)
            .field("keys", &state.data.len())
            .finish()
    }
}
