// ── Reward dispatch ──
//
// Turns a drawn prize into the action the portal has to take, and keeps
// the win history and lifetime counter. Bookkeeping failures are logged
// and swallowed: they never change what the player is granted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::clock::Clock;
use crate::error::CoreError;
use crate::ledger::{Ledger, LedgerKey, LedgerKeys};
use crate::model::{PrizeCategory, PrizeEntry, THANKS_MESSAGE, WinRecord, push_capped};

/// What the portal must do after a prize is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchAction {
    /// Nothing granted, show the message.
    Notify { message: String },
    /// Authenticate a network session with the credential stored under
    /// `credential_key`.
    GrantSession { credential_key: String },
    /// Add a spin and let the player draw again.
    BonusGrant,
}

/// Hotspot login for one grant size.
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    pub password: SecretString,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Static map from credential key (`3h`, `data_500mb`, ...) to login.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    entries: HashMap<String, Credential>,
}

impl CredentialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, credential: Credential) {
        self.entries.insert(key.into(), credential);
    }

    pub fn get(&self, key: &str) -> Option<&Credential> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl FromIterator<(String, Credential)> for CredentialTable {
    fn from_iter<I: IntoIterator<Item = (String, Credential)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

pub struct RewardDispatcher {
    ledger: Arc<dyn Ledger>,
    keys: LedgerKeys,
    clock: Arc<dyn Clock>,
    credentials: CredentialTable,
    history_cap: usize,
    history_lock: Mutex<()>,
}

impl RewardDispatcher {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        keys: LedgerKeys,
        clock: Arc<dyn Clock>,
        credentials: CredentialTable,
        history_cap: usize,
    ) -> Self {
        Self {
            ledger,
            keys,
            clock,
            credentials,
            history_cap,
            history_lock: Mutex::new(()),
        }
    }

    /// Map a prize to its action. A session prize whose credential key is
    /// not configured is an error, never a grant.
    pub fn resolve_prize(&self, prize: &PrizeEntry) -> Result<DispatchAction, CoreError> {
        match prize.category {
            PrizeCategory::Neutral => Ok(DispatchAction::Notify {
                message: THANKS_MESSAGE.to_owned(),
            }),
            PrizeCategory::BonusSpin => Ok(DispatchAction::BonusGrant),
            PrizeCategory::TimeGrant | PrizeCategory::DataGrant => {
                let Some(key) = prize.credential_key() else {
                    return Err(CoreError::UnknownRewardTag {
                        tag: prize.name.clone(),
                    });
                };
                if !self.credentials.contains(&key) {
                    error!(prize = %prize.name, tag = %key, "no credential for reward tag");
                    return Err(CoreError::UnknownRewardTag { tag: key });
                }
                Ok(DispatchAction::GrantSession {
                    credential_key: key,
                })
            }
        }
    }

    pub fn credential(&self, key: &str) -> Option<&Credential> {
        self.credentials.get(key)
    }

    pub fn credentials(&self) -> &CredentialTable {
        &self.credentials
    }

    /// Append the win to history and bump the lifetime total.
    pub fn record_win(&self, prize: &PrizeEntry) {
        let _guard = self
            .history_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let record = WinRecord::new(prize, self.clock.now());
        if let Err(e) = self.append_history(record) {
            warn!(error = %e, prize = %prize.name, "failed to record win history");
        }
        if let Err(e) = self.increment_total() {
            warn!(error = %e, "failed to update lifetime spin total");
        }
    }

    /// Win history, newest first. Empty when unreadable.
    pub fn history(&self) -> Vec<WinRecord> {
        match self.read_history() {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "win history unreadable");
                Vec::new()
            }
        }
    }

    /// Lifetime spin total. Zero when unreadable.
    pub fn total_spins(&self) -> u64 {
        match self.ledger.get(&self.keys.name(LedgerKey::TotalSpins)) {
            Ok(raw) => raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0),
            Err(e) => {
                warn!(error = %e, "spin total unreadable");
                0
            }
        }
    }

    fn read_history(&self) -> Result<Vec<WinRecord>, CoreError> {
        let Some(raw) = self.ledger.get(&self.keys.name(LedgerKey::WinHistory))? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(CoreError::storage)
    }

    fn append_history(&self, record: WinRecord) -> Result<(), CoreError> {
        // A corrupt history is replaced rather than blocking new records.
        let mut history = self.read_history().unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable win history");
            Vec::new()
        });
        push_capped(&mut history, record, self.history_cap);
        let json = serde_json::to_string(&history).map_err(CoreError::storage)?;
        self.ledger
            .set(&self.keys.name(LedgerKey::WinHistory), &json)?;
        debug!(entries = history.len(), "win recorded");
        Ok(())
    }

    fn increment_total(&self) -> Result<(), CoreError> {
        let key = self.keys.name(LedgerKey::TotalSpins);
        let total = self
            .ledger
            .get(&key)?
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0)
            .saturating_add(1);
        self.ledger.set(&key, &total.to_string())
    }
}

impl std::fmt::Debug for RewardDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardDispatcher")
            .field("keys", &self.keys)
            .field("credentials", &self.credentials.keys())
            .field("history_cap", &self.history_cap)
            .finish_non_exhaustive()
    }
}
