/// Persistent user settings and analysis configuration.
///
/// [`SettingsStore`] is a flat key-value store in the style of editor
/// preferences: integers and strings under string keys. Ignore patterns
/// are persisted through it (see [`crate::rules::IgnoreRules`]).
pub mod config;

pub use config::AnalysisConfig;

use crate::error::{HuntError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key-value settings persistence.
///
/// Methods take `&self`; implementations use interior mutability so one
/// store can be shared by several readers.
pub trait SettingsStore {
    /// Integer under `key`, or `default` when absent or not an integer.
    fn get_int(&self, key: &str, default: i64) -> i64;

    fn set_int(&self, key: &str, value: i64) -> Result<()>;

    /// String under `key`, or an empty string when absent.
    fn get_string(&self, key: &str) -> String;

    fn set_string(&self, key: &str, value: &str) -> Result<()>;
}

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Int(i64),
    Text(String),
}

type ValueMap = BTreeMap<String, SettingValue>;

fn read_int(map: &ValueMap, key: &str, default: i64) -> i64 {
    match map.get(key) {
        Some(SettingValue::Int(v)) => *v,
        _ => default,
    }
}

fn read_string(map: &ValueMap, key: &str) -> String {
    match map.get(key) {
        Some(SettingValue::Text(v)) => v.clone(),
        _ => String::new(),
    }
}

/// Settings kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<ValueMap>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        read_int(&self.values.read(), key, default)
    }

    fn set_int(&self, key: &str, value: i64) -> Result<()> {
        self.values
            .write()
            .insert(key.to_string(), SettingValue::Int(value));
        Ok(())
    }

    fn get_string(&self, key: &str) -> String {
        read_string(&self.values.read(), key)
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .insert(key.to_string(), SettingValue::Text(value.to_string()));
        Ok(())
    }
}

/// Settings persisted as a flat JSON object. Every `set_*` rewrites the file.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    values: RwLock<ValueMap>,
}

impl JsonSettingsStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let values = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            if content.trim().is_empty() {
                ValueMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    HuntError::Settings(format!("{} is not a settings file: {e}", path.display()))
                })?
            }
        } else {
            ValueMap::new()
        };
        debug!("Opened settings {} ({} keys)", path.display(), values.len());
        Ok(Self {
            path: path.to_path_buf(),
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn insert_and_persist(&self, key: &str, value: SettingValue) -> Result<()> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value);
        let content = serde_json::to_string_pretty(&*values)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        read_int(&self.values.read(), key, default)
    }

    fn set_int(&self, key: &str, value: i64) -> Result<()> {
        self.insert_and_persist(key, SettingValue::Int(value))
    }

    fn get_string(&self, key: &str) -> String {
        read_string(&self.values.read(), key)
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.insert_and_persist(key, SettingValue::Text(value.to_string()))
    }
}
