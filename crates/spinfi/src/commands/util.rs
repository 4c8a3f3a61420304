//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use chrono::NaiveDateTime;

use spinfi_core::{FileLedger, Portal};

use crate::auth::HotspotAuthenticator;
use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::error::CliError;
use crate::notify::CliNotifier;
use crate::output;

/// A portal wired to the ledger file, the terminal, and (when a login
/// URL is configured) the hotspot.
pub struct PortalContext {
    pub portal: Portal,
    pub hotspot: Option<Arc<HotspotAuthenticator>>,
}

impl PortalContext {
    /// Let pending continuations finish, then report how the hotspot
    /// logins they started went.
    pub async fn settle(&self) -> Result<usize, CliError> {
        self.portal.settle().await;
        match &self.hotspot {
            Some(hotspot) => hotspot.wait().await,
            None => Ok(0),
        }
    }
}

pub fn build_portal(global: &GlobalOpts, cfg: &Config) -> Result<PortalContext, CliError> {
    let portal_config = config::portal_config(global, cfg)?;
    let ledger_path = config::ledger_path(global, cfg);
    tracing::debug!(ledger = %ledger_path.display(), "opening ledger");
    let ledger = FileLedger::open(ledger_path)?;

    let hotspot = cfg
        .hotspot
        .login_url()?
        .map(|url| HotspotAuthenticator::new(url, cfg.hotspot.timeout()))
        .transpose()?
        .map(Arc::new);

    let color = output::should_color(&global.color);
    let mut builder = Portal::builder(portal_config, Arc::new(ledger))
        .notifier(Arc::new(CliNotifier::new(color, global.quiet)));
    if let Some(hotspot) = &hotspot {
        builder = builder.authenticator(hotspot.clone());
    }
    if let Some(seed) = global.seed {
        builder = builder.seed(seed);
    }

    Ok(PortalContext {
        portal: builder.build(),
        hotspot,
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Parse a local wall-clock time for `--at` flags.
pub fn parse_local_datetime(raw: &str) -> Result<NaiveDateTime, CliError> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
        .ok_or_else(|| CliError::Validation {
            field: "at".into(),
            reason: format!("'{raw}' is not a local time like \"2026-10-24 01:30\""),
        })
}
