//! CLI configuration -- thin wrapper around `spinfi_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--config, --ledger, --instant).

use std::path::PathBuf;

use spinfi_core::{PortalConfig, TimingConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use spinfi_config::{
    Config, CredentialEntry, config_path, load_config_from, save_config_to, store_password,
    to_portal_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file: `--config` flag, else the platform default.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config the flags point at. A missing file yields defaults.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&active_config_path(global))?)
}

/// Ledger file: `--ledger` flag, else the config's.
pub fn ledger_path(global: &GlobalOpts, cfg: &Config) -> PathBuf {
    global.ledger.clone().unwrap_or_else(|| cfg.ledger_path())
}

/// Translate the config into a `PortalConfig`, applying `--instant`.
pub fn portal_config(global: &GlobalOpts, cfg: &Config) -> Result<PortalConfig, CliError> {
    let mut portal = to_portal_config(cfg)?;
    if global.instant {
        portal.timing = TimingConfig::instant();
    } else {
        // One-shot runs: no background polling, no periodic snapshots.
        portal.timing.snapshot_interval = std::time::Duration::ZERO;
        portal.timing.window_poll_interval = std::time::Duration::ZERO;
    }
    Ok(portal)
}
