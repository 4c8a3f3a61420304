// ── Runtime portal configuration ──
//
// These types describe *what* the portal offers: the wheel, the quota,
// the free window, and the logins behind each prize. They carry credential
// data and timing, but never touch disk. The CLI builds a `PortalConfig`
// and hands it in.

use std::collections::HashSet;
use std::time::Duration;

use url::Url;

use crate::dispatch::{Credential, CredentialTable};
use crate::ledger::DEFAULT_KEY_PREFIX;
use crate::model::{AccessSchedule, DEFAULT_HISTORY_CAP, PrizeTable};
use crate::quota::DEFAULT_DAILY_ALLOWANCE;
use crate::window::DEFAULT_POLL_INTERVAL;

/// Delays between the visible steps of a spin and of the other portal
/// actions. All zero makes every action resolve immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// From the spin request to the result being shown (wheel animation).
    pub reveal_delay: Duration,
    /// How long a winning result stays up before connecting starts.
    pub result_hold: Duration,
    /// From the connecting overlay to the login call.
    pub auth_delay: Duration,
    /// From "Connecting to Free WiFi..." to the login call.
    pub free_connect_delay: Duration,
    /// From the advert click to the redirect.
    pub advert_delay: Duration,
    /// How often the feature-state snapshot is written. Zero disables.
    pub snapshot_interval: Duration,
    /// How often the free window is re-evaluated. Zero disables.
    pub window_poll_interval: Duration,
}

impl TimingConfig {
    /// No delays and no background tasks.
    pub fn instant() -> Self {
        Self {
            reveal_delay: Duration::ZERO,
            result_hold: Duration::ZERO,
            auth_delay: Duration::ZERO,
            free_connect_delay: Duration::ZERO,
            advert_delay: Duration::ZERO,
            snapshot_interval: Duration::ZERO,
            window_poll_interval: Duration::ZERO,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_millis(3000),
            result_hold: Duration::from_millis(3000),
            auth_delay: Duration::from_millis(1000),
            free_connect_delay: Duration::from_millis(1500),
            advert_delay: Duration::from_millis(1500),
            snapshot_interval: Duration::from_secs(300),
            window_poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Everything a `Portal` needs.
///
/// Built by the CLI, passed to `Portal` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub prizes: PrizeTable,
    pub schedule: AccessSchedule,
    /// Spins granted per calendar day.
    pub daily_allowance: u32,
    /// Win history entries kept.
    pub history_cap: usize,
    /// Logins for session prizes, keyed by credential key.
    pub credentials: CredentialTable,
    /// Login used during the free window.
    pub free_window_credential: Option<Credential>,
    /// Advertiser landing page.
    pub advert_url: Option<Url>,
    /// Prefix for every ledger key.
    pub key_prefix: String,
    pub timing: TimingConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            prizes: PrizeTable::standard(),
            schedule: AccessSchedule::weekend_nights(),
            daily_allowance: DEFAULT_DAILY_ALLOWANCE,
            history_cap: DEFAULT_HISTORY_CAP,
            credentials: CredentialTable::new(),
            free_window_credential: None,
            advert_url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
            timing: TimingConfig::default(),
        }
    }
}

impl PortalConfig {
    /// Credential keys used by the prize table that have no login
    /// configured, once each in prize table order. Spinning one of these
    /// surfaces a connection error.
    pub fn missing_credentials(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.prizes
            .entries()
            .iter()
            .filter_map(crate::model::PrizeEntry::credential_key)
            .filter(|key| !self.credentials.contains(key))
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }
}
