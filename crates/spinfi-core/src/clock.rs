// ── Wall-clock abstraction ──
//
// Quota rollover and the free-window gate are both functions of the
// *local* wall clock. Everything in core reads time through `Clock` so
// tests and the CLI (`window --at`) can pin it.

use std::sync::{Mutex, PoisonError};

use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta};

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    /// Current local date and time, without zone information.
    fn now(&self) -> NaiveDateTime;

    /// Current calendar day.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// The system's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
