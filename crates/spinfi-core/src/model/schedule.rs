// ── Free access window schedule ──

use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};
use serde::Serialize;

use crate::error::CoreError;

/// Recurring weekly window during which free access is granted.
///
/// The hour range is half-open: `start_hour <= hour < end_hour`, checked
/// against the local wall-clock hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessSchedule {
    allowed_weekdays: Vec<Weekday>,
    start_hour: u32,
    end_hour: u32,
}

impl AccessSchedule {
    pub fn new(
        allowed_weekdays: impl IntoIterator<Item = Weekday>,
        start_hour: u32,
        end_hour: u32,
    ) -> Result<Self, CoreError> {
        if end_hour > 24 {
            return Err(CoreError::InvalidSchedule {
                reason: format!("end hour {end_hour} is past midnight"),
            });
        }
        if start_hour >= end_hour {
            return Err(CoreError::InvalidSchedule {
                reason: format!("start hour {start_hour} must be before end hour {end_hour}"),
            });
        }

        let mut days: Vec<Weekday> = Vec::new();
        for day in allowed_weekdays {
            if !days.contains(&day) {
                days.push(day);
            }
        }
        days.sort_by_key(Weekday::num_days_from_monday);

        Ok(Self {
            allowed_weekdays: days,
            start_hour,
            end_hour,
        })
    }

    /// Saturday and Sunday, midnight to 03:00.
    pub fn weekend_nights() -> Self {
        Self {
            allowed_weekdays: vec![Weekday::Sat, Weekday::Sun],
            start_hour: 0,
            end_hour: 3,
        }
    }

    pub fn allowed_weekdays(&self) -> &[Weekday] {
        &self.allowed_weekdays
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub fn contains(&self, now: NaiveDateTime) -> bool {
        self.allowed_weekdays.contains(&now.weekday())
            && (self.start_hour..self.end_hour).contains(&now.hour())
    }

    /// The next moment the window opens, strictly after `now`.
    pub fn next_opening(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let start = NaiveTime::from_hms_opt(self.start_hour, 0, 0)?;
        (0..=7)
            .map(|offset| now.date() + TimeDelta::days(offset))
            .filter(|day| self.allowed_weekdays.contains(&day.weekday()))
            .map(|day| day.and_time(start))
            .find(|opening| *opening > now)
    }

    /// Human label, e.g. `Sat, Sun 00:00-03:00`.
    pub fn describe(&self) -> String {
        let days = self
            .allowed_weekdays
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{days} {:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

impl Default for AccessSchedule {
    fn default() -> Self {
        Self::weekend_nights()
    }
}
