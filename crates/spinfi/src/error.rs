//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use spinfi_config::ConfigError;
use spinfi_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Ledger ───────────────────────────────────────────────────────
    #[error("Ledger unavailable: {message}")]
    #[diagnostic(
        code(spinfi::ledger),
        help(
            "Check that the ledger file is readable and valid JSON.\n\
             Point at another file with --ledger, or delete it to start over."
        )
    )]
    Ledger { message: String },

    // ── Wheel ────────────────────────────────────────────────────────
    #[error("A spin is already in progress ({phase})")]
    #[diagnostic(code(spinfi::spin_in_progress))]
    SpinInProgress { phase: String },

    #[error("No session credential for reward tag '{tag}'")]
    #[diagnostic(
        code(spinfi::unknown_reward_tag),
        help("Add a [credentials.{tag}] section to the config file.")
    )]
    UnknownRewardTag { tag: String },

    #[error("The portal is shut down")]
    #[diagnostic(code(spinfi::shut_down))]
    PortalShutDown,

    // ── Hotspot ──────────────────────────────────────────────────────
    #[error("No hotspot authenticator configured")]
    #[diagnostic(
        code(spinfi::no_authenticator),
        help("Set hotspot.login_url in the config, e.g. \"http://10.5.50.1/login\".")
    )]
    AuthenticatorUnavailable,

    #[error("Hotspot login at {url} failed")]
    #[diagnostic(
        code(spinfi::login_failed),
        help("Check that the hotspot is reachable and the credentials are correct.")
    )]
    LoginFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("No password configured for '{scope}'")]
    #[diagnostic(
        code(spinfi::no_credentials),
        help(
            "Store one with: spinfi config set-password {scope}\n\
             Or set password / password_env in the config file."
        )
    )]
    NoCredentials { scope: String },

    // ── Access window ────────────────────────────────────────────────
    #[error("The free access window is closed")]
    #[diagnostic(
        code(spinfi::window_closed),
        help("Free access runs {schedule}. Check with: spinfi window")
    )]
    FreeWindowClosed { schedule: String },

    #[error("No advert URL configured")]
    #[diagnostic(code(spinfi::no_advert), help("Set advert.url in the config file."))]
    NoAdvert,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(spinfi::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(spinfi::config),
        help("Run: spinfi config show   to see the resolved configuration")
    )]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(spinfi::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to write config: {0}")]
    #[diagnostic(code(spinfi::toml))]
    Toml(#[from] toml::ser::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthenticatorUnavailable | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::LoginFailed { .. } => exit_code::CONNECTION,
            Self::FreeWindowClosed { .. } => exit_code::PERMISSION,
            Self::SpinInProgress { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::StorageUnavailable { message } => CliError::Ledger { message },

            CoreError::UnknownRewardTag { tag } => CliError::UnknownRewardTag { tag },

            CoreError::ConcurrentSpinRejected { phase } => CliError::SpinInProgress {
                phase: phase.to_string(),
            },

            CoreError::PortalShutDown => CliError::PortalShutDown,

            CoreError::AuthenticatorUnavailable => CliError::AuthenticatorUnavailable,

            CoreError::FreeWindowClosed => CliError::FreeWindowClosed {
                schedule: "on its configured schedule".into(),
            },

            CoreError::InvalidPrizeTable { reason } => CliError::Validation {
                field: "wheel.prizes".into(),
                reason,
            },

            CoreError::InvalidSchedule { reason } => CliError::Validation {
                field: "free_window".into(),
                reason,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { scope } => CliError::NoCredentials { scope },
            ConfigError::Serialization(e) => CliError::Toml(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
