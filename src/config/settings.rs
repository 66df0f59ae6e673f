use crate::error::Error;
use log::warn;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Flat key-value store persisted as a single JSON object.
///
/// Backs the map source configuration, including the legacy flat keys
/// written by older releases (`tripwire_url`, `Tripwire/url`, ...).
#[derive(Debug, Default)]
pub struct Settings {
    path: Option<PathBuf>,
    values: Map<String, Value>,
}

impl Settings {
    /// Load from `path`. A missing or unreadable file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!("Settings file {} is not a JSON object, starting empty", path.display());
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self {
            path: Some(path),
            values,
        }
    }

    /// A store with no backing file. `save` is a no-op.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn value_str(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn save(&self) -> Result<(), Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&Value::Object(self.values.clone()))?;
        fs::write(path, raw)?;
        Ok(())
    }
}
