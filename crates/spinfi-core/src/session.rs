// ── Spin session state machine ──
//
// Per-spin lifecycle:
//
//   Idle -> QuotaCheck -> { Denied | Drawing } -> Resolved
//        -> (AwaitingExternalAuth) -> Idle
//
// Only one attempt may be in flight. `begin()` hands out a `SpinAttempt`
// guard; a second `begin()` while the guard lives is rejected, never
// queued. Dropping the guard returns the session to `Idle`, so an aborted
// continuation cannot leave the wheel locked.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use tracing::trace;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpinPhase {
    Idle,
    QuotaCheck,
    Denied,
    Drawing,
    Resolved,
    AwaitingExternalAuth,
}

#[derive(Debug)]
pub struct SpinSession {
    phase: watch::Sender<SpinPhase>,
    busy: AtomicBool,
}

impl SpinSession {
    pub fn new() -> Self {
        let (phase, _) = watch::channel(SpinPhase::Idle);
        Self {
            phase,
            busy: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> SpinPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SpinPhase> {
        self.phase.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the session for one attempt and move to `QuotaCheck`.
    pub fn begin(self: &Arc<Self>) -> Result<SpinAttempt, CoreError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CoreError::ConcurrentSpinRejected {
                phase: self.phase(),
            });
        }
        self.set(SpinPhase::QuotaCheck);
        Ok(SpinAttempt {
            session: Arc::clone(self),
            released: false,
        })
    }

    fn set(&self, phase: SpinPhase) {
        trace!(%phase, "spin phase");
        self.phase.send_replace(phase);
    }

    fn release(&self, phase: SpinPhase) {
        self.set(phase);
        self.busy.store(false, Ordering::Release);
    }
}

impl Default for SpinSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive handle on the session for one spin attempt.
#[derive(Debug)]
pub struct SpinAttempt {
    session: Arc<SpinSession>,
    released: bool,
}

impl SpinAttempt {
    pub fn phase(&self) -> SpinPhase {
        self.session.phase()
    }

    pub fn set_phase(&self, phase: SpinPhase) {
        self.session.set(phase);
    }

    /// Attempt complete; back to `Idle`.
    pub fn finish(mut self) {
        self.released = true;
        self.session.release(SpinPhase::Idle);
    }

    /// Quota check failed. The session stays in `Denied` until the next
    /// attempt begins.
    pub fn finish_denied(mut self) {
        self.released = true;
        self.session.release(SpinPhase::Denied);
    }

    /// A bonus spin was granted; the next attempt may start right away.
    pub fn release_for_respin(mut self) {
        self.released = true;
        self.session.release(SpinPhase::QuotaCheck);
    }
}

impl Drop for SpinAttempt {
    fn drop(&mut self) {
        if !self.released {
            self.session.release(SpinPhase::Idle);
        }
    }
}
