// ── In-process ledger ──

use dashmap::DashMap;

use super::Ledger;
use crate::error::CoreError;

/// A non-durable ledger backed by a concurrent map. Useful for kiosks
/// that reset on restart, and for tests.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: DashMap<String, String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Ledger for MemoryLedger {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.entries.get(key).map(|r| r.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
