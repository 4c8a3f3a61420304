// ── Core error types ──
//
// User-facing errors from spinfi-core. Storage and collaborator failures
// are folded into a small taxonomy so that consumers (CLI, portal shells)
// never see raw I/O or JSON errors from the ledger.

use thiserror::Error;

use crate::session::SpinPhase;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage errors ───────────────────────────────────────────────
    #[error("Ledger unavailable: {message}")]
    StorageUnavailable { message: String },

    // ── Reward errors ────────────────────────────────────────────────
    #[error("No session credential configured for reward tag '{tag}'")]
    UnknownRewardTag { tag: String },

    #[error("A spin is already in progress (phase: {phase})")]
    ConcurrentSpinRejected { phase: SpinPhase },

    #[error("Authentication collaborator is not available")]
    AuthenticatorUnavailable,

    #[error("The free access window is closed")]
    FreeWindowClosed,

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("The portal has been shut down")]
    PortalShutDown,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Invalid prize table: {reason}")]
    InvalidPrizeTable { reason: String },

    #[error("Invalid access schedule: {reason}")]
    InvalidSchedule { reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err)
    }
}
