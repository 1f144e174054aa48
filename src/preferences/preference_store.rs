//! Durable, versioned persistence of [`UserPreferences`].
//!
//! Preferences are written as a single JSON record under [`STORAGE_KEY`]:
//!
//! ```json
//! { "version": 1, "lastUpdated": "2026-10-17T08:00:00Z", "preferences": { ... } }
//! ```
//!
//! Records written before versioning existed are flat preference objects with an
//! optional `lastUpdated` field; they are migrated and re-saved on load.

use std::cell::Cell;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::preferences::{
    UserPreferences,
    storage::{StorageBackend, StorageError},
};

/// Key the preference record is stored under.
pub const STORAGE_KEY: &str = "transit_watch_preferences";
/// Key written and removed to probe the backend.
const PROBE_KEY: &str = "__storage_probe__";
/// Current layout of the persisted record.
pub const SCHEMA_VERSION: u64 = 1;

/// Why a preference operation did not complete.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("malformed preference record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported preference schema version {0}")]
    UnsupportedVersion(u64),
}

/// Preferences together with the instant they were saved.
///
/// `last_updated` is `None` for legacy records that never carried one.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPreferences {
    pub preferences: UserPreferences,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Result of [`PreferenceStore::load`].
///
/// Lets callers tell "nothing saved yet" apart from "could not read" while
/// both mean "use defaults".
#[derive(Debug)]
pub enum LoadOutcome {
    Restored(SavedPreferences),
    Missing,
    Failed(PreferenceError),
}

impl LoadOutcome {
    pub fn into_saved(self) -> Option<SavedPreferences> {
        match self {
            LoadOutcome::Restored(saved) => Some(saved),
            LoadOutcome::Missing | LoadOutcome::Failed(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedRecord {
    version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
    preferences: UserPreferences,
}

/// Persists preferences in a [`StorageBackend`].
///
/// The backend is probed once when the store is created; while it is
/// unavailable every operation is skipped and reports
/// [`PreferenceError::Unavailable`]. The in-memory preferences held by the
/// caller stay authoritative either way.
///
/// # Examples
///
/// ```no_run
/// let store = PreferenceStore::new(FileStorage::new(Path::new("./data"), 5 * 1024 * 1024));
/// let preferences = store
///     .load()
///     .into_saved()
///     .map(|saved| saved.preferences)
///     .unwrap_or_default();
/// let _ = store.save(&preferences);
/// ```
pub struct PreferenceStore<B: StorageBackend> {
    backend: B,
    /// Result of the last availability probe
    available: Cell<bool>,
}

impl<B: StorageBackend> PreferenceStore<B> {
    pub fn new(backend: B) -> Self {
        let store = PreferenceStore {
            backend,
            available: Cell::new(false),
        };
        store.is_available();
        store
    }

    /// Probes the backend with a write followed by a remove.
    ///
    /// The probe key never collides with stored data, so the probe does not
    /// alter saved preferences.
    pub fn is_available(&self) -> bool {
        let available = match self
            .backend
            .set_item(PROBE_KEY, "probe")
            .and_then(|_| self.backend.remove_item(PROBE_KEY))
        {
            Ok(()) => true,
            Err(e) => {
                warn!("preference storage unavailable: {}", e);
                false
            }
        };

        self.available.set(available);
        available
    }

    /// Saves the full preference set, stamped with the current time.
    ///
    /// Failures are logged and returned; they never affect the caller's state.
    pub fn save(&self, preferences: &UserPreferences) -> Result<DateTime<Utc>, PreferenceError> {
        if !self.available.get() {
            debug!("skipping preference save, storage unavailable");
            return Err(PreferenceError::Unavailable);
        }

        let last_updated = Utc::now();
        let record = PersistedRecord {
            version: SCHEMA_VERSION,
            last_updated: Some(last_updated),
            preferences: preferences.clone(),
        };

        let serialized = serde_json::to_string(&record).map_err(|e| {
            error!("failed to serialize preferences: {}", e);
            PreferenceError::from(e)
        })?;

        if let Err(e) = self.backend.set_item(STORAGE_KEY, &serialized) {
            error!("failed to persist preferences: {}", e);
            return Err(e.into());
        }

        debug!("persisted preferences {}", serialized);
        Ok(last_updated)
    }

    /// Loads saved preferences.
    ///
    /// Never fails: unreadable, malformed or future-version records are
    /// reported as [`LoadOutcome::Failed`] and mean "use defaults".
    pub fn load(&self) -> LoadOutcome {
        if !self.available.get() {
            debug!("skipping preference load, storage unavailable");
            return LoadOutcome::Failed(PreferenceError::Unavailable);
        }

        let raw = match self.backend.get_item(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("no saved preferences found, starting with defaults");
                return LoadOutcome::Missing;
            }
            Err(e) => {
                error!("failed to read saved preferences: {}", e);
                return LoadOutcome::Failed(e.into());
            }
        };

        let (record, migrated) = match serde_json::from_str(&raw)
            .map_err(PreferenceError::from)
            .and_then(migrate)
        {
            Ok(result) => result,
            Err(e) => {
                error!("failed to restore saved preferences, using defaults: {}", e);
                return LoadOutcome::Failed(e);
            }
        };

        if migrated {
            info!("migrated saved preferences to schema version {}", SCHEMA_VERSION);
            let rewritten = PersistedRecord {
                version: SCHEMA_VERSION,
                ..record
            };
            match serde_json::to_string(&rewritten) {
                Ok(serialized) => {
                    if let Err(e) = self.backend.set_item(STORAGE_KEY, &serialized) {
                        warn!("failed to rewrite migrated preferences: {}", e);
                    }
                }
                Err(e) => warn!("failed to serialize migrated preferences: {}", e),
            }
            return LoadOutcome::Restored(SavedPreferences {
                preferences: rewritten.preferences,
                last_updated: rewritten.last_updated,
            });
        }

        match record.last_updated {
            Some(at) => info!("restored preferences saved at {}", at),
            None => info!("restored preferences with no save time"),
        }
        LoadOutcome::Restored(SavedPreferences {
            preferences: record.preferences,
            last_updated: record.last_updated,
        })
    }

    /// Removes saved preferences.
    pub fn clear(&self) -> Result<(), PreferenceError> {
        if !self.available.get() {
            debug!("skipping preference clear, storage unavailable");
            return Err(PreferenceError::Unavailable);
        }

        if let Err(e) = self.backend.remove_item(STORAGE_KEY) {
            error!("failed to clear preferences: {}", e);
            return Err(e.into());
        }

        info!("cleared saved preferences");
        Ok(())
    }
}

/// Brings a raw record to the current schema.
///
/// Returns the record and whether it had to be migrated.
fn migrate(value: Value) -> Result<(PersistedRecord, bool), PreferenceError> {
    match value.get("version").and_then(Value::as_u64) {
        Some(SCHEMA_VERSION) => Ok((serde_json::from_value(value)?, false)),
        Some(version) => Err(PreferenceError::UnsupportedVersion(version)),
        None => {
            let last_updated = value
                .get("lastUpdated")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok());
            let preferences: UserPreferences = serde_json::from_value(value)?;
            Ok((
                PersistedRecord {
                    version: 0,
                    last_updated,
                    preferences,
                },
                true,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alerts::{Severity, filter::SeverityFilter},
        preferences::{
            FontSize, Theme,
            storage::{FileStorage, MemoryStorage, MockStorageBackend},
        },
    };
    use tempfile::TempDir;

    fn custom_preferences() -> UserPreferences {
        let mut preferences = UserPreferences {
            severity_filter: SeverityFilter::Only(Severity::Critical),
            sound_enabled: false,
            rush_hour_mode: true,
            theme: Theme::Dark,
            font_size: FontSize::Large,
            language: "fr".to_string(),
            ..UserPreferences::default()
        };
        preferences.favorites.insert("sim-001".to_string());
        preferences
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let store = PreferenceStore::new(MemoryStorage::default());
        let preferences = custom_preferences();

        let saved_at = store.save(&preferences).unwrap();
        let saved = store.load().into_saved().unwrap();

        assert_eq!(saved.preferences, preferences);
        assert_eq!(saved.last_updated, Some(saved_at));
    }

    #[test]
    fn test_load_without_record_is_missing() {
        let store = PreferenceStore::new(MemoryStorage::default());
        assert!(matches!(store.load(), LoadOutcome::Missing));
    }

    #[test]
    fn test_load_malformed_record_falls_back() {
        let backend = MemoryStorage::default();
        backend.set_item(STORAGE_KEY, "{ this is not json").unwrap();
        let store = PreferenceStore::new(backend);

        let outcome = store.load();
        assert!(matches!(
            outcome,
            LoadOutcome::Failed(PreferenceError::Malformed(_))
        ));
        assert!(outcome.into_saved().is_none());
    }

    #[test]
    fn test_load_wrong_shape_falls_back() {
        let backend = MemoryStorage::default();
        backend
            .set_item(
                STORAGE_KEY,
                r#"{"version": 1, "lastUpdated": "2026-10-17T08:00:00Z", "preferences": {"theme": 42}}"#,
            )
            .unwrap();
        let store = PreferenceStore::new(backend);

        assert!(store.load().into_saved().is_none());
    }

    #[test]
    fn test_load_future_version_is_rejected() {
        let backend = MemoryStorage::default();
        backend
            .set_item(
                STORAGE_KEY,
                r#"{"version": 7, "lastUpdated": "2026-10-17T08:00:00Z", "preferences": {}}"#,
            )
            .unwrap();
        let store = PreferenceStore::new(backend);

        assert!(matches!(
            store.load(),
            LoadOutcome::Failed(PreferenceError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_legacy_record_is_migrated_and_rewritten() {
        let dir = TempDir::new().unwrap();
        let backend = FileStorage::new(dir.path(), 1024 * 1024);
        backend
            .set_item(
                STORAGE_KEY,
                r#"{"theme": "dark", "language": "es", "lastUpdated": "2026-10-17T08:00:00Z"}"#,
            )
            .unwrap();
        let store = PreferenceStore::new(backend);

        let saved = store.load().into_saved().unwrap();
        assert_eq!(saved.preferences.theme, Theme::Dark);
        assert_eq!(saved.preferences.language, "es");
        assert_eq!(saved.preferences.font_size, FontSize::Medium);
        assert_eq!(
            saved.last_updated.map(|at| at.to_rfc3339()).as_deref(),
            Some("2026-10-17T08:00:00+00:00")
        );

        let rewritten = std::fs::read_to_string(dir.path().join(format!("{}.json", STORAGE_KEY)))
            .unwrap();
        let value: Value = serde_json::from_str(&rewritten).unwrap();
        assert_eq!(value["version"], SCHEMA_VERSION);
        assert_eq!(value["preferences"]["theme"], "dark");
    }

    #[test]
    fn test_legacy_record_without_timestamp_keeps_it_unknown() {
        let backend = MemoryStorage::default();
        backend.set_item(STORAGE_KEY, r#"{"theme": "dark"}"#).unwrap();
        let store = PreferenceStore::new(backend);

        let saved = store.load().into_saved().unwrap();
        assert_eq!(saved.preferences.theme, Theme::Dark);
        assert_eq!(saved.last_updated, None);

        // The rewritten record must not gain a made-up save time either
        let reloaded = store.load().into_saved().unwrap();
        assert_eq!(reloaded.last_updated, None);
    }

    #[test]
    fn test_probe_failure_skips_every_operation() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_set_item()
            .withf(|key, _| key == PROBE_KEY)
            .times(1)
            .returning(|_, _| Err(StorageError::QuotaExceeded(0)));
        backend.expect_get_item().never();
        backend.expect_remove_item().never();

        let store = PreferenceStore::new(backend);

        assert!(matches!(
            store.load(),
            LoadOutcome::Failed(PreferenceError::Unavailable)
        ));
        assert!(matches!(
            store.save(&UserPreferences::default()),
            Err(PreferenceError::Unavailable)
        ));
        assert!(matches!(store.clear(), Err(PreferenceError::Unavailable)));
    }

    #[test]
    fn test_save_failure_is_reported_not_raised() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_set_item()
            .withf(|key, _| key == PROBE_KEY)
            .returning(|_, _| Ok(()));
        backend.expect_remove_item().returning(|_| Ok(()));
        backend
            .expect_set_item()
            .withf(|key, _| key == STORAGE_KEY)
            .returning(|_, _| Err(StorageError::QuotaExceeded(16)));

        let store = PreferenceStore::new(backend);

        assert!(matches!(
            store.save(&UserPreferences::default()),
            Err(PreferenceError::Storage(StorageError::QuotaExceeded(16)))
        ));
    }

    #[test]
    fn test_probe_leaves_saved_preferences_untouched() {
        let store = PreferenceStore::new(MemoryStorage::default());
        store.save(&custom_preferences()).unwrap();

        assert!(store.is_available());
        assert_eq!(
            store.load().into_saved().unwrap().preferences,
            custom_preferences()
        );
    }

    #[test]
    fn test_clear_removes_record() {
        let store = PreferenceStore::new(MemoryStorage::default());
        store.save(&custom_preferences()).unwrap();

        store.clear().unwrap();

        assert!(matches!(store.load(), LoadOutcome::Missing));
    }
}
