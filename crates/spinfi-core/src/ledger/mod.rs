// ── Persistent ledger ──
//
// Durable string key-value state that survives across sessions: the
// daily quota, lifetime counters, win history, and feature snapshots.
// Every value is string-serialized, so any backing store that can hold
// strings (a JSON file, a browser's local storage, a test map) fits.

mod file;
mod memory;

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::CoreError;

pub use file::FileLedger;
pub use memory::MemoryLedger;

/// Prefix applied to every key unless configured otherwise.
pub const DEFAULT_KEY_PREFIX: &str = "smartnet_";

/// A durable key-value store. All values are strings.
///
/// Implementations assume a single writer process; they do not lock
/// across processes.
pub trait Ledger: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

/// Logical keys used by the reward subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum LedgerKey {
    DailySpins,
    LastSpinDate,
    TotalSpins,
    WinHistory,
    FeatureState,
}

/// Maps logical keys to physical, prefixed key names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerKeys {
    prefix: String,
}

impl LedgerKeys {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Physical key name, e.g. `smartnet_daily_spins`.
    pub fn name(&self, key: LedgerKey) -> String {
        format!("{}{key}", self.prefix)
    }

    /// All physical key names owned by the subsystem.
    pub fn all(&self) -> Vec<String> {
        LedgerKey::iter().map(|k| self.name(k)).collect()
    }
}

impl Default for LedgerKeys {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_KEY_PREFIX)
    }
}
