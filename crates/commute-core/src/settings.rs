//! Key-value settings store.
//!
//! The dashboard persists a single API key (and the theme choice). The store
//! is injected as a [`SettingsProvider`] so it can be backed by a JSON file,
//! the system keyring, the environment, or memory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::SettingsError;

/// Settings key holding the 511.org API key.
pub const API_KEY_SETTING: &str = "transit.api_key";

/// Settings key holding the theme ("light" or "dark").
pub const THEME_SETTING: &str = "ui.theme";

/// API key baked in at build time, if any.
pub const BUILD_TIME_API_KEY: Option<&str> = option_env!("COMMUTE_511_API_KEY");

const KEYRING_SERVICE: &str = "commute";
const SETTINGS_FILE: &str = "settings.json";

pub trait SettingsProvider: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never set or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), SettingsError>;

    /// Short name for logs and the settings screen.
    fn describe(&self) -> String;
}

/// Settings stored as a flat JSON object in the config directory.
pub struct FileSettingsStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(SETTINGS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SettingsError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| SettingsError::Read(format!("{}: {}", self.path.display(), e)))?;

        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&json)
            .map_err(|e| SettingsError::Read(format!("{}: {}", self.path.display(), e)))
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::Write(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(values)
            .map_err(|e| SettingsError::Write(e.to_string()))?;

        std::fs::write(&self.path, json).map_err(|e| SettingsError::Write(e.to_string()))
    }
}

impl SettingsProvider for FileSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let _guard = self.lock.lock();
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)?;
        tracing::info!("Stored setting {} in {}", key, self.path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        let _guard = self.lock.lock();
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
            tracing::info!("Removed setting {}", key);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file ({})", self.path.display())
    }
}

/// Settings stored in the system keyring, one entry per key.
pub struct KeyringSettingsStore {
    service: String,
}

impl KeyringSettingsStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, SettingsError> {
        keyring::Entry::new(&self.service, key)
            .map_err(|e| SettingsError::Unavailable(e.to_string()))
    }
}

impl Default for KeyringSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsProvider for KeyringSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SettingsError::Read(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| SettingsError::Write(e.to_string()))?;
        tracing::info!("Stored setting {} in keyring", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SettingsError::Write(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        format!("keyring (service \"{}\")", self.service)
    }
}

/// Read-only settings taken from environment variables.
///
/// `transit.api_key` is read from `COMMUTE_TRANSIT_API_KEY`.
pub struct EnvSettingsStore {
    prefix: String,
}

impl EnvSettingsStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn var_name(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}_{}", self.prefix, suffix)
    }
}

impl SettingsProvider for EnvSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(std::env::var(self.var_name(key)).ok())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), SettingsError> {
        Err(SettingsError::ReadOnly)
    }

    fn remove(&self, _key: &str) -> Result<(), SettingsError> {
        Err(SettingsError::ReadOnly)
    }

    fn describe(&self) -> String {
        format!("environment ({}_*)", self.prefix)
    }
}

/// Process-local settings; nothing survives a restart.
#[derive(Default)]
pub struct MemorySettingsStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsProvider for MemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        self.values.write().remove(key);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Where the key for the next fetch cycle comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Settings,
    /// Configured or build-time default
    Default,
    /// No key anywhere; transit runs in demo mode
    Missing,
}

/// Resolves the transit API key for one fetch cycle.
///
/// Order: settings store, configured default, build-time default.
/// Blank values count as absent.
#[derive(Clone)]
pub struct ApiKeyResolver {
    store: Arc<dyn SettingsProvider>,
    fallback: Option<String>,
}

impl ApiKeyResolver {
    pub fn new(store: Arc<dyn SettingsProvider>, configured_default: Option<String>) -> Self {
        let fallback = non_blank(configured_default)
            .or_else(|| non_blank(BUILD_TIME_API_KEY.map(str::to_string)));
        Self { store, fallback }
    }

    /// Like [`ApiKeyResolver::new`] but ignores any key baked in at build
    /// time, so demo mode stays reachable in every build.
    pub fn without_build_default(
        store: Arc<dyn SettingsProvider>,
        configured_default: Option<String>,
    ) -> Self {
        Self {
            store,
            fallback: non_blank(configured_default),
        }
    }

    pub fn resolve(&self) -> Option<String> {
        let stored = match self.store.get(API_KEY_SETTING) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Could not read API key from {}: {}", self.store.describe(), e);
                None
            }
        };

        non_blank(stored).or_else(|| self.fallback.clone())
    }

    pub fn key_source(&self) -> KeySource {
        let stored = self.store.get(API_KEY_SETTING).ok().flatten();
        if non_blank(stored).is_some() {
            KeySource::Settings
        } else if self.fallback.is_some() {
            KeySource::Default
        } else {
            KeySource::Missing
        }
    }

    pub fn store(&self) -> &Arc<dyn SettingsProvider> {
        &self.store
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.get(API_KEY_SETTING).unwrap(), None);

        store.set(API_KEY_SETTING, "abc").unwrap();
        assert_eq!(store.get(API_KEY_SETTING).unwrap().as_deref(), Some("abc"));

        store.set(API_KEY_SETTING, "def").unwrap();
        assert_eq!(store.get(API_KEY_SETTING).unwrap().as_deref(), Some("def"));

        store.remove(API_KEY_SETTING).unwrap();
        assert_eq!(store.get(API_KEY_SETTING).unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileSettingsStore::new(dir.path());
        store.set(API_KEY_SETTING, "secret").unwrap();
        store.set(THEME_SETTING, "dark").unwrap();

        let reopened = FileSettingsStore::new(dir.path());
        assert_eq!(reopened.get(API_KEY_SETTING).unwrap().as_deref(), Some("secret"));
        assert_eq!(reopened.get(THEME_SETTING).unwrap().as_deref(), Some("dark"));

        reopened.remove(API_KEY_SETTING).unwrap();
        assert_eq!(store.get(API_KEY_SETTING).unwrap(), None);
        assert_eq!(store.get(THEME_SETTING).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(&dir.path().join("nested"));
        assert_eq!(store.get(API_KEY_SETTING).unwrap(), None);
        store.remove(API_KEY_SETTING).unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        let store = FileSettingsStore::new(dir.path());
        assert!(matches!(store.get(API_KEY_SETTING), Err(SettingsError::Read(_))));
    }

    #[test]
    fn test_env_store_is_read_only() {
        let store = EnvSettingsStore::new("COMMUTE");
        assert_eq!(store.var_name(API_KEY_SETTING), "COMMUTE_TRANSIT_API_KEY");
        assert!(matches!(store.set(API_KEY_SETTING, "x"), Err(SettingsError::ReadOnly)));
        assert!(matches!(store.remove(API_KEY_SETTING), Err(SettingsError::ReadOnly)));
    }

    #[test]
    fn test_resolver_absent_key() {
        let store: Arc<dyn SettingsProvider> = Arc::new(MemorySettingsStore::new());
        let resolver = ApiKeyResolver {
            store,
            fallback: None,
        };
        assert_eq!(resolver.resolve(), None);
    }

    #[test]
    fn test_resolver_blank_key_is_absent() {
        let store = Arc::new(MemorySettingsStore::new());
        store.set(API_KEY_SETTING, "   ").unwrap();
        let resolver = ApiKeyResolver {
            store,
            fallback: None,
        };
        assert_eq!(resolver.resolve(), None);
    }

    #[test]
    fn test_resolver_prefers_stored_key() {
        let store = Arc::new(MemorySettingsStore::new());
        store.set(API_KEY_SETTING, " stored ").unwrap();
        let resolver = ApiKeyResolver::new(store, Some("configured".to_string()));
        assert_eq!(resolver.resolve().as_deref(), Some("stored"));
    }

    #[test]
    fn test_resolver_falls_back_to_configured_default() {
        let store = Arc::new(MemorySettingsStore::new());
        let resolver = ApiKeyResolver::new(store.clone(), Some("configured".to_string()));
        assert_eq!(resolver.resolve().as_deref(), Some("configured"));

        store.set(API_KEY_SETTING, "").unwrap();
        assert_eq!(resolver.resolve().as_deref(), Some("configured"));
    }

    #[test]
    fn test_resolver_reads_store_every_time() {
        let store = Arc::new(MemorySettingsStore::new());
        let resolver = ApiKeyResolver {
            store: store.clone(),
            fallback: None,
        };
        assert_eq!(resolver.resolve(), None);
        store.set(API_KEY_SETTING, "later").unwrap();
        assert_eq!(resolver.resolve().as_deref(), Some("later"));
    }

    #[test]
    fn test_key_source() {
        let store = Arc::new(MemorySettingsStore::new());
        let resolver = ApiKeyResolver {
            store: store.clone(),
            fallback: None,
        };
        assert_eq!(resolver.key_source(), KeySource::Missing);

        let with_default = ApiKeyResolver::new(store.clone(), Some("configured".to_string()));
        assert_eq!(with_default.key_source(), KeySource::Default);

        store.set(API_KEY_SETTING, "stored").unwrap();
        assert_eq!(resolver.key_source(), KeySource::Settings);
    }

    #[test]
    fn test_without_build_default_ignores_baked_key() {
        let store = Arc::new(MemorySettingsStore::new());
        let resolver = ApiKeyResolver::without_build_default(store.clone(), None);
        assert_eq!(resolver.resolve(), None);
        assert_eq!(resolver.key_source(), KeySource::Missing);

        let resolver =
            ApiKeyResolver::without_build_default(store, Some(" configured ".to_string()));
        assert_eq!(resolver.resolve().as_deref(), Some("configured"));
    }
}
