//! Business-hours scheduling for outbound communications.
//!
//! The `scheduleEmail` and `scheduleCall` executors never contact anyone
//! outside business hours. [`BusinessHours`] answers "when is the next
//! moment we may reach out", relative to a fixed UTC offset.

use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone,
    Utc, Weekday,
};
use serde::{Deserialize, Serialize};

/// A weekly contact window in a fixed UTC offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessHours {
    /// Offset of the local clock from UTC, in minutes.
    pub utc_offset_minutes: i32,
    /// First local hour of the window (inclusive).
    pub start_hour: u32,
    /// Local hour at which the window closes (exclusive, up to 24).
    pub end_hour: u32,
    /// Days on which the window opens.
    pub weekdays: Vec<Weekday>,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            start_hour: 9,
            end_hour: 17,
            weekdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}

impl BusinessHours {
    /// The local offset, if `utc_offset_minutes` is in range.
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }

    fn local_offset(&self) -> FixedOffset {
        self.offset().unwrap_or_else(|| Utc.fix())
    }

    /// Opening and closing instants of the window on a local date.
    fn window(&self, date: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        let start = midnight.checked_add_signed(TimeDelta::hours(i64::from(self.start_hour)))?;
        let end = midnight.checked_add_signed(TimeDelta::hours(i64::from(self.end_hour)))?;
        Some((start, end))
    }

    fn to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.local_offset()
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Whether `at` falls inside the window.
    pub fn is_open(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.local_offset()).naive_local();
        if !self.weekdays.contains(&local.date().weekday()) {
            return false;
        }
        match self.window(local.date()) {
            Some((start, end)) => local >= start && local < end,
            None => false,
        }
    }

    /// The earliest instant at or after `after` that is inside the window.
    ///
    /// Returns `after` unchanged when the window is empty (no weekdays, or
    /// `start_hour >= end_hour`); config validation rejects such windows.
    pub fn next_slot(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        self.find_slot(after).unwrap_or(after)
    }

    fn find_slot(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.weekdays.is_empty() || self.start_hour >= self.end_hour {
            return None;
        }

        let local = after.with_timezone(&self.local_offset()).naive_local();

        for day in 0..=7 {
            let date = local.date().checked_add_days(Days::new(day))?;
            if !self.weekdays.contains(&date.weekday()) {
                continue;
            }
            let (start, end) = self.window(date)?;
            if local < start {
                return self.to_utc(start);
            }
            if local < end {
                return Some(after);
            }
        }

        None
    }

    /// The first slot once `delay` has passed since `now`.
    ///
    /// Returns `None` when `now + delay` is past the representable range.
    pub fn schedule_after(&self, now: DateTime<Utc>, delay: TimeDelta) -> Option<DateTime<Utc>> {
        now.checked_add_signed(delay).map(|at| self.next_slot(at))
    }
}
