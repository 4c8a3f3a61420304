// ── JSON file ledger ──
//
// The whole ledger is one JSON object on disk. Reads come from an
// in-memory copy; every write rewrites the file through a sibling temp
// file and an atomic rename, so a crash never leaves a half-written ledger.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::Ledger;
use crate::error::CoreError;

#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileLedger {
    /// Open the ledger at `path`, starting empty if the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error: the
    /// caller decides whether to surface it or fall back to a fresh ledger.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                CoreError::storage(format!("{} is not a valid ledger: {e}", path.display()))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(CoreError::storage(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };

        debug!(path = %path.display(), keys = entries.len(), "ledger opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries).map_err(CoreError::storage)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `mutate` to the map and write it out. The in-memory copy is
    /// only updated once the file write succeeded.
    fn update(&self, mutate: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), CoreError> {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        mutate(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}

impl Ledger for FileLedger {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.update(|map| {
            map.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.update(|map| {
            map.remove(key);
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::open(dir.path().join("ledger.json")).unwrap();
        assert!(ledger.get("anything").unwrap().is_none());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        let ledger = FileLedger::open(&path).unwrap();
        ledger.set("smartnet_total_spins", "7").unwrap();
        ledger.set("smartnet_daily_spins", "1").unwrap();
        ledger.remove("smartnet_daily_spins").unwrap();
        drop(ledger);

        let reopened = FileLedger::open(&path).unwrap();
        assert_eq!(reopened.get("smartnet_total_spins").unwrap().as_deref(), Some("7"));
        assert!(reopened.get("smartnet_daily_spins").unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{ not json").unwrap();

        let err = FileLedger::open(&path).unwrap_err();
        assert!(matches!(err, CoreError::StorageUnavailable { .. }));
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // The ledger path is a directory, so the final rename fails.
        let path = dir.path().join("occupied");
        fs::create_dir(&path).unwrap();
        let ledger = FileLedger {
            path,
            entries: Mutex::new(BTreeMap::new()),
        };

        assert!(ledger.set("k", "v").is_err());
        assert!(ledger.get("k").unwrap().is_none());
    }
}
