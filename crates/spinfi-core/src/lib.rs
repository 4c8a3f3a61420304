// spinfi-core: Reward wheel, daily spin quota, and free-window gate for captive portals.

pub mod clock;
pub mod collaborator;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod model;
pub mod portal;
pub mod quota;
pub mod selector;
pub mod session;
pub mod window;

// ── Primary re-exports ──────────────────────────────────────────────
pub use clock::{Clock, FixedClock, SystemClock};
pub use collaborator::{Authenticator, Notifier, Severity, TracingNotifier};
pub use config::{PortalConfig, TimingConfig};
pub use dispatch::{Credential, CredentialTable, DispatchAction, RewardDispatcher};
pub use error::CoreError;
pub use ledger::{FileLedger, Ledger, LedgerKey, LedgerKeys, MemoryLedger};
pub use portal::{Portal, PortalBuilder, SpinHandle};
pub use quota::{DEFAULT_DAILY_ALLOWANCE, QuotaManager};
pub use selector::select_prize;
pub use session::{SpinAttempt, SpinPhase, SpinSession};
pub use window::{FreeWindowMonitor, is_within_free_window};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AccessSchedule, FeatureState, GrantTag, OutcomeKind, PortalStatus, PrizeCategory, PrizeEntry,
    PrizeTable, SpinFailure, SpinOutcome, SpinQuota, WinRecord,
};
