// ── Prize domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

/// What kind of reward a wheel segment represents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PrizeCategory {
    /// "Thanks for playing" -- nothing granted.
    #[serde(rename = "thanks", alias = "neutral")]
    #[strum(to_string = "neutral", serialize = "thanks")]
    Neutral,
    /// A timed network session.
    #[serde(rename = "time", alias = "time_grant")]
    #[strum(to_string = "time_grant", serialize = "time")]
    TimeGrant,
    /// A data-capped network session.
    #[serde(rename = "data", alias = "data_grant")]
    #[strum(to_string = "data_grant", serialize = "data")]
    DataGrant,
    /// One extra spin, outside the daily allowance.
    #[serde(rename = "bonus", alias = "bonus_spin")]
    #[strum(to_string = "bonus_spin", serialize = "bonus")]
    BonusSpin,
}

impl PrizeCategory {
    /// Whether winning this category leads to a network session.
    pub fn grants_session(self) -> bool {
        matches!(self, Self::TimeGrant | Self::DataGrant)
    }
}

/// Grant-size tag carried by session prizes (e.g. `3h`, `500mb`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantTag(String);

impl GrantTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GrantTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One segment of the reward wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeEntry {
    pub name: String,
    pub weight: u32,
    pub category: PrizeCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<GrantTag>,
}

impl PrizeEntry {
    pub fn neutral(name: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight,
            category: PrizeCategory::Neutral,
            payload: None,
        }
    }

    pub fn time(name: impl Into<String>, weight: u32, tag: &str) -> Self {
        Self {
            name: name.into(),
            weight,
            category: PrizeCategory::TimeGrant,
            payload: Some(GrantTag::new(tag)),
        }
    }

    pub fn data(name: impl Into<String>, weight: u32, tag: &str) -> Self {
        Self {
            name: name.into(),
            weight,
            category: PrizeCategory::DataGrant,
            payload: Some(GrantTag::new(tag)),
        }
    }

    pub fn bonus(name: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight,
            category: PrizeCategory::BonusSpin,
            payload: None,
        }
    }

    /// Key into the credential table for session prizes.
    ///
    /// Time grants use the payload as-is (`3h`); data grants live in a
    /// separate `data_` namespace (`data_500mb`) so a time and a data
    /// prize can share a size tag.
    pub fn credential_key(&self) -> Option<String> {
        let tag = self.payload.as_ref()?;
        match self.category {
            PrizeCategory::TimeGrant => Some(tag.as_str().to_owned()),
            PrizeCategory::DataGrant => Some(format!("data_{tag}")),
            PrizeCategory::Neutral | PrizeCategory::BonusSpin => None,
        }
    }
}

// ── Prize table ──────────────────────────────────────────────────────

/// An immutable, validated set of prizes with precomputed cumulative
/// weights for O(log n) selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PrizeEntry>", into = "Vec<PrizeEntry>")]
pub struct PrizeTable {
    entries: Vec<PrizeEntry>,
    cumulative: Vec<u64>,
}

impl PrizeTable {
    /// Validate and build a table.
    ///
    /// Rejects empty tables, zero weights, and session prizes without a
    /// payload tag.
    pub fn new(entries: Vec<PrizeEntry>) -> Result<Self, CoreError> {
        if entries.is_empty() {
            return Err(CoreError::InvalidPrizeTable {
                reason: "table has no entries".into(),
            });
        }

        let mut cumulative = Vec::with_capacity(entries.len());
        let mut running = 0_u64;
        for entry in &entries {
            if entry.weight == 0 {
                return Err(CoreError::InvalidPrizeTable {
                    reason: format!("prize '{}' has zero weight", entry.name),
                });
            }
            if entry.category.grants_session() && entry.payload.is_none() {
                return Err(CoreError::InvalidPrizeTable {
                    reason: format!("{} prize '{}' has no payload tag", entry.category, entry.name),
                });
            }
            running += u64::from(entry.weight);
            cumulative.push(running);
        }

        Ok(Self {
            entries,
            cumulative,
        })
    }

    /// The stock seven-segment wheel (weights sum to 100).
    pub fn standard() -> Self {
        let entries = vec![
            PrizeEntry::neutral("Thanks", 60),
            PrizeEntry::time("3 Hours", 8, "3h"),
            PrizeEntry::data("100MB", 10, "100mb"),
            PrizeEntry::data("1GB", 5, "1gb"),
            PrizeEntry::data("500MB", 7, "500mb"),
            PrizeEntry::time("1 Hour", 8, "1h"),
            PrizeEntry::bonus("1 More Chance", 2),
        ];
        Self::new(entries).unwrap_or_else(|_| unreachable!("standard wheel is valid"))
    }

    pub fn entries(&self) -> &[PrizeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights -- the size of the implicit draw population.
    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Running weight totals, one per entry.
    pub(crate) fn cumulative(&self) -> &[u64] {
        &self.cumulative
    }

    /// Exact selection probability of `entry`'s weight within this table.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn probability(&self, entry: &PrizeEntry) -> f64 {
        f64::from(entry.weight) / self.total_weight() as f64
    }

    pub fn find(&self, name: &str) -> Option<&PrizeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

impl Default for PrizeTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<PrizeEntry>> for PrizeTable {
    type Error = CoreError;

    fn try_from(entries: Vec<PrizeEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<PrizeTable> for Vec<PrizeEntry> {
    fn from(table: PrizeTable) -> Self {
        table.entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_sums_to_one_hundred() {
        let table = PrizeTable::standard();
        assert_eq!(table.len(), 7);
        assert_eq!(table.total_weight(), 100);
    }

    #[test]
    fn zero_weight_is_rejected() {
        let err = PrizeTable::new(vec![PrizeEntry::neutral("Nothing", 0)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPrizeTable { .. }));
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(PrizeTable::new(Vec::new()).is_err());
    }

    #[test]
    fn session_prize_needs_payload() {
        let mut entry = PrizeEntry::time("2 Hours", 5, "2h");
        entry.payload = None;
        assert!(PrizeTable::new(vec![entry]).is_err());
    }

    #[test]
    fn data_prizes_use_namespaced_credential_keys() {
        let table = PrizeTable::standard();
        let keys: Vec<_> = table
            .entries()
            .iter()
            .filter_map(PrizeEntry::credential_key)
            .collect();
        assert_eq!(keys, ["3h", "data_100mb", "data_1gb", "data_500mb", "1h"]);
    }

    #[test]
    fn legacy_category_names_deserialize() {
        let json = r#"[
            {"name": "Thanks", "weight": 3, "category": "thanks"},
            {"name": "1 Hour", "weight": 1, "category": "time", "payload": "1h"}
        ]"#;
        let table: PrizeTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.entries()[0].category, PrizeCategory::Neutral);
        assert_eq!(table.entries()[1].category, PrizeCategory::TimeGrant);
        assert_eq!(table.total_weight(), 4);
    }

    #[test]
    fn invalid_table_fails_deserialization() {
        let json = r#"[{"name": "Broken", "weight": 0, "category": "neutral"}]"#;
        assert!(serde_json::from_str::<PrizeTable>(json).is_err());
    }

    #[test]
    fn category_serializes_short_names_and_reads_long_ones() {
        let json = serde_json::to_string(&[
            PrizeCategory::Neutral,
            PrizeCategory::TimeGrant,
            PrizeCategory::DataGrant,
            PrizeCategory::BonusSpin,
        ])
        .unwrap();
        assert_eq!(json, r#"["thanks","time","data","bonus"]"#);

        let long: Vec<PrizeCategory> =
            serde_json::from_str(r#"["neutral","time_grant","data_grant","bonus_spin"]"#).unwrap();
        assert_eq!(
            long,
            [
                PrizeCategory::Neutral,
                PrizeCategory::TimeGrant,
                PrizeCategory::DataGrant,
                PrizeCategory::BonusSpin,
            ]
        );
    }

    #[test]
    fn category_parses_from_either_spelling() {
        assert_eq!("bonus".parse::<PrizeCategory>().unwrap(), PrizeCategory::BonusSpin);
        assert_eq!("DATA_GRANT".parse::<PrizeCategory>().unwrap(), PrizeCategory::DataGrant);
    }
}
