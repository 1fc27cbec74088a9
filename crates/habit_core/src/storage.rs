//! Snapshot persistence.
//!
//! The whole [`HabitState`] is written as one JSON document under a fixed
//! key. Reading goes through [`migrate`], which repairs documents written by
//! older builds before they are decoded.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::settings::NotificationKind;
use crate::state::HabitState;

pub const STORAGE_KEY: &str = "habit-storage";
pub const SNAPSHOT_VERSION: u32 = 1;

const EPOCH_RFC3339: &str = "1970-01-01T00:00:00Z";

/// Opaque key-value blob storage for snapshot documents.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, contents: &str) -> Result<(), StorageError>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Arc<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        (**self).save(key, contents)
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::io(path, err)),
        }
    }

    fn save(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|err| StorageError::io(&self.dir, err))?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, contents).map_err(|err| StorageError::io(&staging, err))?;
        fs::rename(&staging, &path).map_err(|err| StorageError::io(&path, err))?;
        Ok(())
    }
}

/// Process-local store, handy for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, contents: impl Into<String>) -> Self {
        let store = Self::new();
        store.entries.lock().insert(key.to_string(), contents.into());
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }
}

#[derive(Serialize)]
struct SnapshotDocument<'a> {
    state: &'a HabitState,
    version: u32,
}

#[derive(Deserialize)]
struct StoredSnapshot {
    state: HabitState,
}

pub fn encode(state: &HabitState) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&SnapshotDocument {
        state,
        version: SNAPSHOT_VERSION,
    })?)
}

/// Parses, migrates and decodes a stored document.
pub fn decode(raw: &str) -> Result<HabitState, StorageError> {
    let value: Value = serde_json::from_str(raw)?;
    let migrated = migrate(value)?;
    let stored: StoredSnapshot = serde_json::from_value(migrated)?;
    let mut state = stored.state;
    state.drop_dangling_completions();
    Ok(state)
}

/// Normalizes a raw document into the current layout.
///
/// Accepts both the versioned envelope and a bare state object. Settings
/// flags are coerced to booleans and missing notification preferences are
/// backfilled; habits with blank names or repeated ids and log entries with
/// unreadable dates are dropped. Loosely written dates such as `2024-1-2` are
/// accepted and come back zero-padded on the next save.
pub fn migrate(value: Value) -> Result<Value, StorageError> {
    let Value::Object(mut root) = value else {
        return Err(StorageError::Layout("document is not an object".into()));
    };

    let version = root.get("version").and_then(Value::as_u64).unwrap_or(0);
    let mut state = match root.remove("state") {
        Some(Value::Object(state)) => state,
        Some(_) => return Err(StorageError::Layout("`state` is not an object".into())),
        None => root,
    };
    if version > u64::from(SNAPSHOT_VERSION) {
        tracing::warn!(version, "snapshot written by a newer build; reading best effort");
    }

    let settings = migrate_settings(state.remove("settings"));
    let habits = migrate_habits(state.remove("habits"));
    let logs = migrate_logs(state.remove("logs"));

    let mut migrated = Map::new();
    migrated.insert("habits".into(), habits);
    migrated.insert("logs".into(), logs);
    migrated.insert("settings".into(), settings);

    let mut envelope = Map::new();
    envelope.insert("state".into(), Value::Object(migrated));
    envelope.insert("version".into(), Value::from(SNAPSHOT_VERSION));
    Ok(Value::Object(envelope))
}

fn coerce_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(flag) => Some(*flag),
        Value::Number(n) => Some(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn migrate_settings(raw: Option<Value>) -> Value {
    let raw = match raw {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let dark_mode = coerce_bool(raw.get("darkMode")).unwrap_or(false);

    let legacy_flag = coerce_bool(raw.get("notifications"));
    let notifications = match raw.get("notifications") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    let mut prefs = Map::new();
    for kind in NotificationKind::ALL {
        // A lone boolean `notifications` switch from older builds applies to
        // every preference it did not already spell out.
        let enabled = coerce_bool(notifications.get(kind.key()))
            .or(legacy_flag.map(|on| on && kind.default_enabled()))
            .unwrap_or_else(|| kind.default_enabled());
        prefs.insert(kind.key().into(), Value::Bool(enabled));
    }

    let mut settings = Map::new();
    settings.insert("darkMode".into(), Value::Bool(dark_mode));
    settings.insert("notifications".into(), Value::Object(prefs));
    Value::Object(settings)
}

fn migrate_created_at(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(s)) if DateTime::parse_from_rfc3339(s).is_ok() => s.clone(),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| EPOCH_RFC3339.to_string()),
        _ => EPOCH_RFC3339.to_string(),
    }
}

fn migrate_habits(raw: Option<Value>) -> Value {
    let Some(Value::Array(entries)) = raw else {
        return Value::Array(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut habits = Vec::new();
    for entry in entries {
        let Value::Object(map) = entry else { continue };
        let Some(id) = map.get("id").and_then(Value::as_str).map(str::to_string) else {
            continue;
        };
        let Some(name) = map
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
        else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        let mut habit = Map::new();
        habit.insert("id".into(), Value::String(id));
        habit.insert("name".into(), Value::String(name.to_string()));
        habit.insert(
            "createdAt".into(),
            Value::String(migrate_created_at(map.get("createdAt"))),
        );
        habits.push(Value::Object(habit));
    }
    Value::Array(habits)
}

fn migrate_logs(raw: Option<Value>) -> Value {
    let Some(Value::Array(entries)) = raw else {
        return Value::Array(Vec::new());
    };

    let logs = entries
        .into_iter()
        .filter_map(|entry| {
            let Value::Object(map) = entry else { return None };
            let date = map.get("date").and_then(Value::as_str)?;
            NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            let completed: Vec<Value> = match map.get("completedHabits") {
                Some(Value::Array(ids)) => ids.iter().filter(|id| id.is_string()).cloned().collect(),
                _ => Vec::new(),
            };
            let mut log = Map::new();
            log.insert("date".into(), Value::String(date.to_string()));
            log.insert("completedHabits".into(), Value::Array(completed));
            Some(Value::Object(log))
        })
        .collect();
    Value::Array(logs)
}

/// Loads the state stored under `key`, falling back to an empty state when
/// nothing is stored or the stored document cannot be read.
pub fn load_state(store: &dyn SnapshotStore, key: &str) -> HabitState {
    match store.load(key) {
        Ok(None) => {
            tracing::debug!(key, "no stored snapshot; starting empty");
            HabitState::default()
        }
        Ok(Some(raw)) => match decode(&raw) {
            Ok(state) => {
                tracing::debug!(key, habits = state.habits().len(), "snapshot loaded");
                state
            }
            Err(err) => {
                tracing::warn!(key, %err, "discarding unreadable snapshot");
                HabitState::default()
            }
        },
        Err(err) => {
            tracing::warn!(key, %err, "failed to read snapshot; starting empty");
            HabitState::default()
        }
    }
}

pub fn save_state(
    store: &dyn SnapshotStore,
    key: &str,
    state: &HabitState,
) -> Result<(), StorageError> {
    let encoded = encode(state)?;
    store.save(key, &encoded)?;
    tracing::debug!(key, bytes = encoded.len(), "snapshot saved");
    Ok(())
}
