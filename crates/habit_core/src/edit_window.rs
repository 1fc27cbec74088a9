use chrono::{Days, NaiveDate};

use crate::error::EditWindowViolation;

pub const DEFAULT_EDIT_WINDOW_DAYS: u32 = 7;

/// Trailing span of days whose completions may still be toggled.
///
/// A date qualifies when it is not in the future, lies at most `days` days
/// before today, and is not earlier than the habit's creation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditWindow {
    days: u32,
}

impl Default for EditWindow {
    fn default() -> Self {
        Self::new(DEFAULT_EDIT_WINDOW_DAYS)
    }
}

impl EditWindow {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Oldest date still inside the window as of `today`.
    pub fn earliest(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.days)))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn check(
        &self,
        date: NaiveDate,
        today: NaiveDate,
        created: NaiveDate,
    ) -> Result<(), EditWindowViolation> {
        if date > today {
            return Err(EditWindowViolation::Future { date });
        }
        if date < self.earliest(today) {
            return Err(EditWindowViolation::TooOld {
                date,
                today,
                window_days: self.days,
            });
        }
        if date < created {
            return Err(EditWindowViolation::BeforeCreation { date, created });
        }
        Ok(())
    }

    pub fn allows(&self, date: NaiveDate, today: NaiveDate, created: NaiveDate) -> bool {
        self.check(date, today, created).is_ok()
    }
}
