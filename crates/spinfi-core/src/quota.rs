// ── Daily spin quota ──
//
// Owns the `SpinQuota` persisted in the ledger. Day rollover is lazy: the
// first read or write on a new calendar day resets the count to the
// allowance. All read-modify-write sequences run under one mutex so two
// near-simultaneous consumes can never both spend the same spin.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::CoreError;
use crate::ledger::{Ledger, LedgerKey, LedgerKeys};
use crate::model::SpinQuota;

/// Spins granted per calendar day.
pub const DEFAULT_DAILY_ALLOWANCE: u32 = 2;

pub struct QuotaManager {
    ledger: Arc<dyn Ledger>,
    keys: LedgerKeys,
    clock: Arc<dyn Clock>,
    allowance: u32,
    write_lock: Mutex<()>,
}

impl QuotaManager {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        keys: LedgerKeys,
        clock: Arc<dyn Clock>,
        allowance: u32,
    ) -> Self {
        Self {
            ledger,
            keys,
            clock,
            allowance,
            write_lock: Mutex::new(()),
        }
    }

    pub fn allowance(&self) -> u32 {
        self.allowance
    }

    /// Spins left today. Storage failures read as zero.
    pub fn remaining_spins(&self) -> u32 {
        let _guard = self.lock();
        match self.current() {
            Ok(quota) => quota.remaining,
            Err(e) => {
                warn!(error = %e, "quota unreadable, denying spins");
                0
            }
        }
    }

    /// Spend one spin. Returns `false` without touching the ledger when
    /// none are left, or when the decrement could not be persisted.
    pub fn consume_spin(&self) -> bool {
        let _guard = self.lock();
        let quota = match self.current() {
            Ok(quota) => quota,
            Err(e) => {
                warn!(error = %e, "quota unreadable, denying spin");
                return false;
            }
        };

        if quota.remaining == 0 {
            debug!("no spins left today");
            return false;
        }

        let remaining = quota.remaining - 1;
        if let Err(e) = self.write_count(remaining) {
            warn!(error = %e, "failed to persist spin, denying");
            return false;
        }
        debug!(remaining, "spin consumed");
        true
    }

    /// Add one spin on top of whatever is left today, ignoring the
    /// allowance cap. Returns the new count.
    pub fn grant_bonus_spin(&self) -> Result<u32, CoreError> {
        let _guard = self.lock();
        let quota = self.current()?;
        let remaining = quota.remaining.saturating_add(1);
        self.write_count(remaining)?;
        info!(remaining, "bonus spin granted");
        Ok(remaining)
    }

    /// Today's quota after any pending rollover.
    pub fn snapshot(&self) -> Result<SpinQuota, CoreError> {
        let _guard = self.lock();
        self.current()
    }

    /// Forget today's quota. The next read starts a fresh day.
    pub fn reset(&self) -> Result<(), CoreError> {
        let _guard = self.lock();
        self.ledger.remove(&self.keys.name(LedgerKey::DailySpins))?;
        self.ledger.remove(&self.keys.name(LedgerKey::LastSpinDate))?;
        info!("daily spins reset");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the quota, rolling it over first if the stored day is not
    /// today. Must be called with the write lock held.
    fn current(&self) -> Result<SpinQuota, CoreError> {
        let today = self.clock.today();
        let stored_date = self
            .ledger
            .get(&self.keys.name(LedgerKey::LastSpinDate))?
            .and_then(|raw| raw.parse::<NaiveDate>().ok());

        if stored_date != Some(today) {
            self.ledger.set(
                &self.keys.name(LedgerKey::DailySpins),
                &self.allowance.to_string(),
            )?;
            self.ledger
                .set(&self.keys.name(LedgerKey::LastSpinDate), &today.to_string())?;
            debug!(%today, allowance = self.allowance, "new day, quota reset");
            return Ok(SpinQuota {
                date: today,
                remaining: self.allowance,
            });
        }

        // A count that fails to parse (or went negative in an older
        // ledger) is treated as exhausted.
        let remaining = self
            .ledger
            .get(&self.keys.name(LedgerKey::DailySpins))?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX));

        Ok(SpinQuota {
            date: today,
            remaining,
        })
    }

    fn write_count(&self, remaining: u32) -> Result<(), CoreError> {
        self.ledger.set(
            &self.keys.name(LedgerKey::DailySpins),
            &remaining.to_string(),
        )
    }
}

impl std::fmt::Debug for QuotaManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaManager")
            .field("keys", &self.keys)
            .field("allowance", &self.allowance)
            .finish_non_exhaustive()
    }
}
