// ── Free access window ──
//
// `is_within_free_window` is a pure function of wall-clock time. There is
// no notification when time crosses a boundary, so `FreeWindowMonitor`
// re-evaluates it on an interval and publishes transitions.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::model::AccessSchedule;

/// Default re-evaluation cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Whether `now` falls inside the schedule's weekday set and half-open
/// hour range.
pub fn is_within_free_window(now: NaiveDateTime, schedule: &AccessSchedule) -> bool {
    schedule.contains(now)
}

/// Polls the schedule and publishes the open/closed state.
pub struct FreeWindowMonitor {
    schedule: AccessSchedule,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    state: watch::Sender<bool>,
}

impl FreeWindowMonitor {
    pub fn new(schedule: AccessSchedule, clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        let open = is_within_free_window(clock.now(), &schedule);
        let (state, _) = watch::channel(open);
        Self {
            schedule,
            clock,
            poll_interval,
            state,
        }
    }

    pub fn schedule(&self) -> &AccessSchedule {
        &self.schedule
    }

    /// Last published state.
    pub fn is_open(&self) -> bool {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Evaluate the schedule now and publish the result if it changed.
    /// Returns the current state.
    pub fn check(&self) -> bool {
        let open = is_within_free_window(self.clock.now(), &self.schedule);
        let changed = self.state.send_if_modified(|current| {
            if *current == open {
                false
            } else {
                *current = open;
                true
            }
        });

        if changed {
            if open {
                info!(window = %self.schedule.describe(), "free access window is open");
            } else {
                info!("free access window closed");
            }
        }
        open
    }

    /// Re-check on every tick until cancelled.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.check();
                }
            }
        }
        debug!("free window monitor stopped");
    }
}

impl std::fmt::Debug for FreeWindowMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreeWindowMonitor")
            .field("schedule", &self.schedule)
            .field("poll_interval", &self.poll_interval)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{NaiveDate, TimeDelta, Weekday};

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        // October 2026: the 19th is a Monday, the 24th a Saturday.
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn weekend_night_boundaries() {
        let schedule = AccessSchedule::weekend_nights();
        assert!(is_within_free_window(at(24, 1, 0), &schedule));
        assert!(is_within_free_window(at(25, 2, 59), &schedule));
        assert!(!is_within_free_window(at(24, 3, 0), &schedule));
        assert!(!is_within_free_window(at(19, 1, 0), &schedule));
    }

    #[test]
    fn start_hour_is_inclusive() {
        let schedule = AccessSchedule::new([Weekday::Mon], 9, 17).unwrap();
        assert!(!is_within_free_window(at(19, 8, 59), &schedule));
        assert!(is_within_free_window(at(19, 9, 0), &schedule));
        assert!(is_within_free_window(at(19, 16, 59), &schedule));
        assert!(!is_within_free_window(at(19, 17, 0), &schedule));
    }

    #[test]
    fn check_publishes_transitions() {
        let clock = Arc::new(FixedClock::new(at(23, 23, 30)));
        let monitor = FreeWindowMonitor::new(
            AccessSchedule::weekend_nights(),
            clock.clone(),
            DEFAULT_POLL_INTERVAL,
        );
        let rx = monitor.subscribe();
        assert!(!monitor.is_open());

        clock.advance(TimeDelta::minutes(45));
        assert!(monitor.check());
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_until_cancelled() {
        let clock = Arc::new(FixedClock::new(at(23, 23, 59)));
        let monitor = Arc::new(FreeWindowMonitor::new(
            AccessSchedule::weekend_nights(),
            clock.clone(),
            Duration::from_secs(60),
        ));
        let mut rx = monitor.subscribe();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(&monitor).run(cancel.clone()));

        clock.advance(TimeDelta::minutes(2));
        tokio::time::sleep(Duration::from_secs(61)).await;
        rx.changed().await.unwrap();
        assert!(*rx.borrow());

        cancel.cancel();
        task.await.unwrap();
    }
}
