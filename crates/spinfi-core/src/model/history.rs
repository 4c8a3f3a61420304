// ── Win history ──

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::prize::{PrizeCategory, PrizeEntry};

/// Default number of wins kept in the history.
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// One recorded wheel result. Every draw counts as a "win", including
/// the neutral segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRecord {
    pub timestamp: NaiveDateTime,
    #[serde(rename = "prize")]
    pub prize_name: String,
    #[serde(rename = "type")]
    pub category: PrizeCategory,
}

impl WinRecord {
    pub fn new(prize: &PrizeEntry, timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            prize_name: prize.name.clone(),
            category: prize.category,
        }
    }
}

/// Prepend `record` and drop anything past `cap`, keeping newest-first order.
pub fn push_capped(history: &mut Vec<WinRecord>, record: WinRecord, cap: usize) {
    history.insert(0, record);
    history.truncate(cap);
}
