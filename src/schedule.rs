// src/schedule.rs
//! Expected publication dates: every anchor weekday between `start` and `end` (inclusive).

use chrono::{Datelike, Days, NaiveDate, Weekday};

const CADENCE_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedSchedule {
    start: NaiveDate,
    end: NaiveDate,
    anchor: Weekday,
}

impl ExpectedSchedule {
    /// `start > end` is allowed and yields an empty schedule.
    pub fn new(start: NaiveDate, end: NaiveDate, anchor: Weekday) -> Self {
        Self { start, end, anchor }
    }

    pub fn anchor(&self) -> Weekday {
        self.anchor
    }

    /// First anchor weekday on or after `start` (never moves backwards).
    pub fn first(&self) -> Option<NaiveDate> {
        let have = self.start.weekday().num_days_from_monday();
        let want = self.anchor.num_days_from_monday();
        let ahead = (want + 7 - have) % 7;
        self.start
            .checked_add_days(Days::new(u64::from(ahead)))
            .filter(|d| *d <= self.end)
    }

    /// A fresh iterator each call; the schedule itself is never consumed.
    pub fn iter(&self) -> ScheduleIter {
        ScheduleIter {
            next: self.first(),
            end: self.end,
        }
    }
}

impl IntoIterator for &ExpectedSchedule {
    type Item = NaiveDate;
    type IntoIter = ScheduleIter;

    fn into_iter(self) -> ScheduleIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for ScheduleIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current
            .checked_add_days(Days::new(CADENCE_DAYS))
            .filter(|d| *d <= self.end);
        Some(current)
    }
}
