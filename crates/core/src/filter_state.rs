//! Persistence of the dashboard's date filter.
//!
//! The filter is stored under a single key as
//! `{"preset": "...", "range": {"startDate": ISO|null, "endDate": ISO|null}}`.
//! Loading never fails: absent or malformed state falls back to month-to-date.

use crate::date_range::{DateRange, DateRangeWithPreset};
use crate::error::{DashboardError, DashboardResult};
use chrono::{DateTime, TimeZone};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key under which the date filter is persisted.
pub const DATE_RANGE_KEY: &str = "dashboard.dateRange";

/// A string key-value store for client-side state.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> DashboardResult<Option<String>>;
    fn set(&self, key: &str, value: String) -> DashboardResult<()>;
    fn remove(&self, key: &str) -> DashboardResult<()>;
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> DashboardResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> DashboardResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> DashboardResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> DashboardResult<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> DashboardResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn guard(&self) -> DashboardResult<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| DashboardError::Store("file store lock poisoned".into()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> DashboardResult<Option<String>> {
        let _guard = self.guard()?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> DashboardResult<()> {
        let _guard = self.guard()?;
        // A corrupt file is replaced rather than blocking every write.
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> DashboardResult<()> {
        let _guard = self.guard()?;
        let mut entries = self.read_all().unwrap_or_default();
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Reads and writes the date filter through a [`KeyValueStore`].
pub struct FilterStateRepository<S> {
    store: S,
}

impl<S: KeyValueStore> FilterStateRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save(&self, state: &DateRangeWithPreset) -> DashboardResult<()> {
        let json = serde_json::to_string(state)?;
        self.store.set(DATE_RANGE_KEY, json)?;
        debug!(preset = %state.preset, "Date filter persisted");
        Ok(())
    }

    /// Load the persisted filter. Named presets are recomputed against `now`
    /// so a reload never shows a stale window.
    pub fn load<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateRangeWithPreset {
        let raw = match self.store.get(DATE_RANGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return DateRangeWithPreset::default_at(now),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted date filter, using default");
                return DateRangeWithPreset::default_at(now);
            }
        };

        match decode(&raw) {
            Some(state) => state.refreshed(now),
            None => {
                warn!("Persisted date filter is malformed, using default");
                DateRangeWithPreset::default_at(now)
            }
        }
    }

    pub fn clear(&self) -> DashboardResult<()> {
        self.store.remove(DATE_RANGE_KEY)
    }
}

fn decode(raw: &str) -> Option<DateRangeWithPreset> {
    let state: DateRangeWithPreset = serde_json::from_str(raw).ok()?;
    // Re-validate ordering; serde does not go through DateRange::new.
    let range = DateRange::new(state.range.start_date, state.range.end_date).ok()?;
    if !range.is_complete() {
        return None;
    }
    Some(DateRangeWithPreset {
        preset: state.preset,
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_range::{resolve_preset, DatePreset};
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_absent_state_defaults_to_month_to_date() {
        let repo = FilterStateRepository::new(MemoryStore::new());
        let state = repo.load(&now());
        assert_eq!(state.preset, DatePreset::MonthToDate);
        assert_eq!(state.range, resolve_preset(DatePreset::MonthToDate, &now()));
    }

    #[test]
    fn test_custom_range_survives_reload() {
        let repo = FilterStateRepository::new(MemoryStore::new());
        let range = DateRange::new(
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2024, 2, 9, 0, 0, 0).unwrap()),
        )
        .unwrap();
        let state = DateRangeWithPreset {
            preset: DatePreset::Custom,
            range,
        };
        repo.save(&state).unwrap();
        assert_eq!(repo.load(&now()), state);
    }

    #[test]
    fn test_wire_format_uses_iso_strings() {
        let repo = FilterStateRepository::new(MemoryStore::new());
        repo.save(&DateRangeWithPreset::from_preset(DatePreset::YearToDate, &now()))
            .unwrap();
        let raw = repo.store().get(DATE_RANGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["preset"], "ytd");
        assert_eq!(value["range"]["startDate"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_named_preset_recomputed_on_load() {
        let repo = FilterStateRepository::new(MemoryStore::new());
        repo.save(&DateRangeWithPreset::from_preset(DatePreset::Last30Days, &now()))
            .unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let state = repo.load(&later);
        assert_eq!(state.preset, DatePreset::Last30Days);
        assert_eq!(state.range.end_date, Some(later));
    }

    #[test]
    fn test_malformed_state_falls_back() {
        for raw in [
            "not json",
            r#"{"preset":"weekly","range":{"startDate":null,"endDate":null}}"#,
            r#"{"preset":"custom","range":{"startDate":"2024-03-01T00:00:00Z","endDate":null}}"#,
            r#"{"preset":"ytd","range":{"startDate":"2024-01-01T00:00:00Z","endDate":null}}"#,
            r#"{"preset":"1y","range":{"startDate":null,"endDate":null}}"#,
            r#"{"preset":"custom","range":{"startDate":"2024-03-09T00:00:00Z","endDate":"2024-03-01T00:00:00Z"}}"#,
        ] {
            let store = MemoryStore::new();
            store.set(DATE_RANGE_KEY, raw.to_string()).unwrap();
            let repo = FilterStateRepository::new(store);
            assert_eq!(repo.load(&now()).preset, DatePreset::MonthToDate, "{raw}");
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("filters.json");
        let repo = FilterStateRepository::new(JsonFileStore::new(&path));
        let state = DateRangeWithPreset::from_preset(DatePreset::LastThreeYears, &now());
        repo.save(&state).unwrap();
        assert!(path.exists());

        let reopened = FilterStateRepository::new(JsonFileStore::new(&path));
        assert_eq!(reopened.load(&now()), state);

        reopened.clear().unwrap();
        assert_eq!(reopened.load(&now()).preset, DatePreset::MonthToDate);
    }

    #[test]
    fn test_corrupt_file_falls_back_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.json");
        std::fs::write(&path, "{{{").unwrap();
        let repo = FilterStateRepository::new(JsonFileStore::new(&path));
        assert_eq!(repo.load(&now()).preset, DatePreset::MonthToDate);

        let state = DateRangeWithPreset::from_preset(DatePreset::YearToDate, &now());
        repo.save(&state).unwrap();
        assert_eq!(repo.load(&now()), state);
    }
}
