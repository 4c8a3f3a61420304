// ── Snapshot and status types ──

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Persisted quota state for the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinQuota {
    pub date: NaiveDate,
    pub remaining: u32,
}

/// Periodic snapshot written to the ledger (every few minutes and on
/// shutdown). Field names match the JSON the portal page reads back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureState {
    pub last_update: NaiveDateTime,
    pub spins_remaining: u32,
    #[serde(rename = "freeWifiAvailable")]
    pub free_window_open: bool,
}

/// Read-only view for debugging and status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortalStatus {
    pub initialized: bool,
    pub spins_remaining: u32,
    pub free_window_open: bool,
    pub total_spins: u64,
    pub history_len: usize,
    pub next_free_window: Option<NaiveDateTime>,
}
