//! Configuration for the spinfi portal.
//!
//! TOML file, environment overrides, credential resolution (env +
//! keyring + plaintext), and translation to `spinfi_core::PortalConfig`.
//! The CLI adds `GlobalOpts`-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Weekday;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use spinfi_core::{
    AccessSchedule, Credential, CredentialTable, PortalConfig, PrizeEntry, PrizeTable,
    TimingConfig,
};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "spinfi";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for '{scope}'")]
    NoCredentials { scope: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Output and color defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,

    /// Where state is persisted.
    #[serde(default)]
    pub ledger: LedgerSection,

    /// Prize table and quota.
    #[serde(default)]
    pub wheel: WheelSection,

    /// Recurring free access window.
    #[serde(default)]
    pub free_window: FreeWindowSection,

    /// Hotspot logins for session prizes, keyed by credential key
    /// (`3h`, `1h`, `data_500mb`, ...).
    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialEntry>,

    /// Hotspot login endpoint.
    #[serde(default)]
    pub hotspot: HotspotSection,

    /// Delays and background intervals.
    #[serde(default)]
    pub timing: TimingSection,

    #[serde(default)]
    pub advert: AdvertSection,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LedgerSection {
    /// Ledger file. Defaults to `ledger.json` in the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Prefix for every key in the ledger.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            path: None,
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_key_prefix() -> String {
    spinfi_core::ledger::DEFAULT_KEY_PREFIX.into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WheelSection {
    #[serde(default = "default_daily_allowance")]
    pub daily_allowance: u32,

    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// Custom prize table. The stock seven-segment wheel when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prizes: Option<Vec<PrizeEntry>>,
}

impl Default for WheelSection {
    fn default() -> Self {
        Self {
            daily_allowance: default_daily_allowance(),
            history_cap: default_history_cap(),
            prizes: None,
        }
    }
}

fn default_daily_allowance() -> u32 {
    spinfi_core::DEFAULT_DAILY_ALLOWANCE
}
fn default_history_cap() -> usize {
    spinfi_core::model::DEFAULT_HISTORY_CAP
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FreeWindowSection {
    /// Weekday names (`sat`, `sunday`, ...).
    #[serde(default = "default_days")]
    pub days: Vec<String>,

    #[serde(default)]
    pub start_hour: u32,

    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Login used during the window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl Default for FreeWindowSection {
    fn default() -> Self {
        Self {
            days: default_days(),
            start_hour: 0,
            end_hour: default_end_hour(),
            poll_interval_secs: default_poll_interval(),
            username: None,
            password: None,
            password_env: None,
        }
    }
}

fn default_days() -> Vec<String> {
    vec!["sat".into(), "sun".into()]
}
fn default_end_hour() -> u32 {
    3
}
fn default_poll_interval() -> u64 {
    60
}

/// One hotspot login.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialEntry {
    pub username: String,

    /// Password (plaintext -- prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HotspotSection {
    /// MikroTik hotspot login URL (e.g. `http://10.5.50.1/login`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,

    /// Login request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for HotspotSection {
    fn default() -> Self {
        Self {
            login_url: None,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize)]
#[allow(clippy::struct_field_names)]
pub struct TimingSection {
    #[serde(default = "default_reveal_ms")]
    pub reveal_delay_ms: u64,

    #[serde(default = "default_reveal_ms")]
    pub result_hold_ms: u64,

    #[serde(default = "default_auth_ms")]
    pub auth_delay_ms: u64,

    #[serde(default = "default_redirect_ms")]
    pub free_connect_delay_ms: u64,

    #[serde(default = "default_redirect_ms")]
    pub advert_delay_ms: u64,

    /// Feature-state snapshot interval. 0 disables.
    #[serde(default = "default_snapshot_secs")]
    pub snapshot_interval_secs: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            reveal_delay_ms: default_reveal_ms(),
            result_hold_ms: default_reveal_ms(),
            auth_delay_ms: default_auth_ms(),
            free_connect_delay_ms: default_redirect_ms(),
            advert_delay_ms: default_redirect_ms(),
            snapshot_interval_secs: default_snapshot_secs(),
        }
    }
}

fn default_reveal_ms() -> u64 {
    3000
}
fn default_auth_ms() -> u64 {
    1000
}
fn default_redirect_ms() -> u64 {
    1500
}
fn default_snapshot_secs() -> u64 {
    300
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AdvertSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "spinfi", "spinfi")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default ledger file in the platform data directory.
pub fn default_ledger_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("ledger.json"),
        |dirs| dirs.data_dir().join("ledger.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("spinfi");
    p
}

impl Config {
    /// Ledger file: the configured path, else the platform default.
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger.path.clone().unwrap_or_else(default_ledger_path)
    }
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from a specific file + environment. A missing file is not an
/// error; defaults and env vars still apply.
///
/// Env vars use `SPINFI_` and a double underscore between sections, e.g.
/// `SPINFI_WHEEL__DAILY_ALLOWANCE=3`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SPINFI_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML, creating parent directories as needed.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a password: named env var, then the system keyring entry
/// `spinfi / <scope>/password`, then plaintext in the config.
pub fn resolve_password(
    scope: &str,
    password_env: Option<&str>,
    plaintext: Option<&str>,
) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Some(env_name) = password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{scope}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(pw) = plaintext {
        return Ok(SecretString::from(pw.to_owned()));
    }

    Err(ConfigError::NoCredentials {
        scope: scope.into(),
    })
}

/// Store a password in the system keyring under `scope`.
pub fn store_password(scope: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{scope}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: format!("{scope} password"),
            reason: format!("keyring unavailable: {e}"),
        })
}

fn resolve_credential(scope: &str, entry: &CredentialEntry) -> Result<Credential, ConfigError> {
    let password = resolve_password(
        scope,
        entry.password_env.as_deref(),
        entry.password.as_deref(),
    )?;
    Ok(Credential {
        username: entry.username.clone(),
        password,
    })
}

// ── Translation ─────────────────────────────────────────────────────

fn parse_weekday(raw: &str) -> Result<Weekday, ConfigError> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| ConfigError::Validation {
            field: "free_window.days".into(),
            reason: format!("'{raw}' is not a weekday"),
        })
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

impl FreeWindowSection {
    pub fn schedule(&self) -> Result<AccessSchedule, ConfigError> {
        let days = self
            .days
            .iter()
            .map(|d| parse_weekday(d))
            .collect::<Result<Vec<_>, _>>()?;
        AccessSchedule::new(days, self.start_hour, self.end_hour).map_err(|e| {
            ConfigError::Validation {
                field: "free_window".into(),
                reason: e.to_string(),
            }
        })
    }

    fn credential(&self) -> Result<Option<Credential>, ConfigError> {
        let Some(username) = &self.username else {
            return Ok(None);
        };
        let entry = CredentialEntry {
            username: username.clone(),
            password: self.password.clone(),
            password_env: self.password_env.clone(),
        };
        resolve_credential("free_window", &entry).map(Some)
    }
}

impl WheelSection {
    pub fn prize_table(&self) -> Result<PrizeTable, ConfigError> {
        match &self.prizes {
            None => Ok(PrizeTable::standard()),
            Some(entries) => PrizeTable::new(entries.clone()).map_err(|e| ConfigError::Validation {
                field: "wheel.prizes".into(),
                reason: e.to_string(),
            }),
        }
    }
}

impl TimingSection {
    pub fn to_timing(&self, window_poll_secs: u64) -> TimingConfig {
        TimingConfig {
            reveal_delay: Duration::from_millis(self.reveal_delay_ms),
            result_hold: Duration::from_millis(self.result_hold_ms),
            auth_delay: Duration::from_millis(self.auth_delay_ms),
            free_connect_delay: Duration::from_millis(self.free_connect_delay_ms),
            advert_delay: Duration::from_millis(self.advert_delay_ms),
            snapshot_interval: Duration::from_secs(self.snapshot_interval_secs),
            window_poll_interval: Duration::from_secs(window_poll_secs),
        }
    }
}

impl HotspotSection {
    pub fn login_url(&self) -> Result<Option<Url>, ConfigError> {
        self.login_url
            .as_deref()
            .map(|raw| parse_url("hotspot.login_url", raw))
            .transpose()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Build a `PortalConfig`, resolving every password.
pub fn to_portal_config(cfg: &Config) -> Result<PortalConfig, ConfigError> {
    let credentials = cfg
        .credentials
        .iter()
        .map(|(key, entry)| {
            resolve_credential(&format!("credentials/{key}"), entry).map(|c| (key.clone(), c))
        })
        .collect::<Result<CredentialTable, _>>()?;

    let advert_url = cfg
        .advert
        .url
        .as_deref()
        .map(|raw| parse_url("advert.url", raw))
        .transpose()?;

    if cfg.wheel.history_cap == 0 {
        return Err(ConfigError::Validation {
            field: "wheel.history_cap".into(),
            reason: "must be at least 1".into(),
        });
    }

    Ok(PortalConfig {
        prizes: cfg.wheel.prize_table()?,
        schedule: cfg.free_window.schedule()?,
        daily_allowance: cfg.wheel.daily_allowance,
        history_cap: cfg.wheel.history_cap,
        credentials,
        free_window_credential: cfg.free_window.credential()?,
        advert_url,
        key_prefix: cfg.ledger.key_prefix.clone(),
        timing: cfg.timing.to_timing(cfg.free_window.poll_interval_secs),
    })
}
