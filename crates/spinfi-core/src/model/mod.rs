// ── Domain model ──
//
// Plain data types shared by every component: prizes, history records,
// the free-window schedule, spin outcomes, and persisted snapshots.

pub mod history;
pub mod outcome;
pub mod prize;
pub mod schedule;
pub mod state;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use spinfi_core::model::*` gives you everything.

pub use history::{DEFAULT_HISTORY_CAP, WinRecord, push_capped};
pub use outcome::{OutcomeKind, SpinFailure, SpinOutcome, THANKS_MESSAGE};
pub use prize::{GrantTag, PrizeCategory, PrizeEntry, PrizeTable};
pub use schedule::AccessSchedule;
pub use state::{FeatureState, PortalStatus, SpinQuota};
