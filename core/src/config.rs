//! Endpoint configuration and its persistence.
//!
//! The façade keeps exactly one `Config`. It is loaded from a `ConfigStore`
//! at startup and rewritten from the form on every operation. Stores hold
//! plain strings under the keys `apiUrl` and `apiKey`, matching what a
//! browser host keeps in localStorage.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

pub const API_URL_KEY: &str = "apiUrl";
pub const API_KEY_KEY: &str = "apiKey";

/// Persistent string key-value storage.
pub trait ConfigStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub api_key: String,
}

impl Config {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            api_url: api_url.trim().to_string(),
            api_key: api_key.trim().to_string(),
        }
    }

    /// Read both entries; absent values become empty strings.
    pub fn load(store: &impl ConfigStore) -> Self {
        Self {
            api_url: store.get(API_URL_KEY).unwrap_or_default(),
            api_key: store.get(API_KEY_KEY).unwrap_or_default(),
        }
    }

    pub fn save(&self, store: &mut impl ConfigStore) {
        store.set(API_URL_KEY, &self.api_url);
        store.set(API_KEY_KEY, &self.api_key);
    }

    pub fn is_complete(&self) -> bool {
        !self.api_url.is_empty() && !self.api_key.is_empty()
    }
}

/// Volatile store, used by tests and by hosts without persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// Store backed by a JSON object on disk, rewritten on every `set`.
///
/// A missing or unreadable file starts out empty. Write failures are logged
/// and otherwise ignored; the in-memory copy stays authoritative for the
/// session.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries: BTreeMap<String, String> = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, entries }
    }

    fn flush(&self) {
        let raw = match serde_json::to_string_pretty(&self.entries) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to serialize config");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, raw) {
            warn!(path = %self.path.display(), error = %e, "failed to persist config");
        }
    }
}

impl ConfigStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_empty_store_defaults_to_empty_strings() {
        let cfg = Config::load(&MemoryStore::default());
        assert_eq!(cfg, Config::default());
        assert!(!cfg.is_complete());
    }

    #[test]
    fn new_trims_whitespace() {
        let cfg = Config::new("  http://api.local ", "\tkey\n");
        assert_eq!(cfg.api_url, "http://api.local");
        assert_eq!(cfg.api_key, "key");
        assert!(cfg.is_complete());
    }

    #[test]
    fn save_uses_literal_keys() {
        let mut store = MemoryStore::default();
        Config::new("http://a", "k").save(&mut store);
        assert_eq!(store.get("apiUrl").as_deref(), Some("http://a"));
        assert_eq!(store.get("apiKey").as_deref(), Some("k"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut store = FileStore::open(&path);
        Config::new("http://persisted", "secret").save(&mut store);
        drop(store);

        let reopened = FileStore::open(&path);
        assert_eq!(Config::load(&reopened), Config::new("http://persisted", "secret"));
    }

    #[test]
    fn file_store_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        let store = FileStore::open(&path);
        assert!(store.get(API_URL_KEY).is_none());
    }
}
