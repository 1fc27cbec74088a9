//! Streak and completion calculus over a [`DayLogStore`].
//!
//! Every function here is pure. Callers pass `today` explicitly so one
//! statistics pass sees a single calendar date even if midnight passes
//! while it runs.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::day_log::DayLogStore;
use crate::habit::HabitId;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakInfo {
    pub current: u32,
    pub longest: u32,
}

pub fn is_completed_on(id: &HabitId, date: NaiveDate, log: &DayLogStore) -> bool {
    log.is_completed(id, date)
}

/// Length of the run of completed days ending today, or ending yesterday
/// when today has not been completed yet.
///
/// An open day never breaks a streak; it simply does not count until done.
pub fn current_streak(id: &HabitId, log: &DayLogStore, today: NaiveDate) -> u32 {
    let start = if log.is_completed(id, today) {
        Some(today)
    } else {
        today.pred_opt()
    };

    let mut streak = 0;
    let mut cursor = start;
    while let Some(day) = cursor {
        if !log.is_completed(id, day) {
            break;
        }
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

/// Longest run of consecutive calendar days on which `id` was completed.
pub fn longest_streak(id: &HabitId, log: &DayLogStore) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for date in log.completed_dates(id) {
        run = match previous {
            Some(prev) if (date - prev).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }
    longest
}

pub fn streak_info(id: &HabitId, log: &DayLogStore, today: NaiveDate) -> StreakInfo {
    StreakInfo {
        current: current_streak(id, log, today),
        longest: longest_streak(id, log),
    }
}

/// Number of days in `month` (1-12) of `year`.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

/// Days of `month` that count towards its completion rate as of `today`:
/// the elapsed days (today inclusive) for the running month, the whole month
/// otherwise.
pub fn elapsed_days_in_month(year: i32, month: u32, today: NaiveDate) -> u32 {
    if today.year() == year && today.month() == month {
        today.day()
    } else {
        days_in_month(year, month).unwrap_or(0)
    }
}

/// Percentage (0-100, rounded half up) of counted days in `month` on which
/// `id` was completed.
pub fn completion_percentage_for_month(
    id: &HabitId,
    year: i32,
    month: u32,
    log: &DayLogStore,
    today: NaiveDate,
) -> u8 {
    let denominator = elapsed_days_in_month(year, month, today);
    if denominator == 0 {
        return 0;
    }
    let completed = (1..=denominator)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .filter(|date| log.is_completed(id, *date))
        .count() as u32;

    let rounded = (completed * 200 + denominator) / (denominator * 2);
    rounded.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn log_with(id: &HabitId, dates: &[NaiveDate]) -> DayLogStore {
        let mut log = DayLogStore::new();
        for d in dates {
            log.toggle(id, *d);
        }
        log
    }

    #[test]
    fn empty_log_has_no_streaks() {
        let id = HabitId::from("a");
        let log = DayLogStore::new();
        assert_eq!(current_streak(&id, &log, date(2024, 3, 5)), 0);
        assert_eq!(longest_streak(&id, &log), 0);
    }

    #[test]
    fn streak_counts_back_from_today_when_done() {
        let id = HabitId::from("a");
        let today = date(2024, 3, 5);
        let log = log_with(&id, &[date(2024, 3, 3), date(2024, 3, 4), today]);
        assert_eq!(current_streak(&id, &log, today), 3);
    }

    #[test]
    fn today_done_but_yesterday_missed_is_one() {
        let id = HabitId::from("a");
        let today = date(2024, 3, 5);
        let log = log_with(&id, &[date(2024, 3, 3), today]);
        assert_eq!(current_streak(&id, &log, today), 1);
    }

    #[test]
    fn open_today_does_not_break_streak() {
        let id = HabitId::from("a");
        let today = date(2024, 3, 5);
        let log = log_with(&id, &[date(2024, 3, 3), date(2024, 3, 4)]);
        assert_eq!(current_streak(&id, &log, today), 2);
    }

    #[test]
    fn gap_scenario_from_march() {
        let id = HabitId::from("a");
        let log = log_with(
            &id,
            &[date(2024, 3, 1), date(2024, 3, 2), date(2024, 3, 4)],
        );
        assert_eq!(longest_streak(&id, &log), 2);
        assert_eq!(current_streak(&id, &log, date(2024, 3, 5)), 1);
    }

    #[test]
    fn two_missed_days_zero_the_streak() {
        let id = HabitId::from("a");
        let log = log_with(&id, &[date(2024, 3, 1), date(2024, 3, 2)]);
        assert_eq!(current_streak(&id, &log, date(2024, 3, 4)), 0);
        assert_eq!(longest_streak(&id, &log), 2);
    }

    #[test]
    fn streaks_span_month_and_year_boundaries() {
        let id = HabitId::from("a");
        let log = log_with(
            &id,
            &[
                date(2023, 12, 30),
                date(2023, 12, 31),
                date(2024, 1, 1),
                date(2024, 2, 28),
                date(2024, 2, 29),
                date(2024, 3, 1),
                date(2024, 3, 2),
            ],
        );
        assert_eq!(longest_streak(&id, &log), 4);
        assert_eq!(current_streak(&id, &log, date(2024, 3, 2)), 4);
        assert_eq!(current_streak(&id, &log, date(2024, 1, 2)), 3);
    }

    #[test]
    fn other_habits_do_not_count() {
        let a = HabitId::from("a");
        let b = HabitId::from("b");
        let today = date(2024, 3, 5);
        let log = log_with(&b, &[date(2024, 3, 4), today]);
        assert_eq!(current_streak(&a, &log, today), 0);
        assert!(!is_completed_on(&a, today, &log));
        assert!(is_completed_on(&b, today, &log));
    }

    #[test]
    fn single_completion_is_longest_one() {
        let id = HabitId::from("a");
        let log = log_with(&id, &[date(2022, 6, 15)]);
        assert_eq!(longest_streak(&id, &log), 1);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 4), Some(30));
        assert_eq!(days_in_month(2024, 12), Some(31));
        assert_eq!(days_in_month(2024, 13), None);
    }

    #[test]
    fn running_month_counts_elapsed_days_only() {
        let id = HabitId::from("a");
        let days: Vec<_> = (1..=10).map(|d| date(2024, 4, d)).collect();
        let log = log_with(&id, &days);

        let pct = completion_percentage_for_month(&id, 2024, 4, &log, date(2024, 4, 10));
        assert_eq!(pct, 100);

        let past = completion_percentage_for_month(&id, 2024, 4, &log, date(2024, 6, 1));
        assert_eq!(past, 33);
    }

    #[test]
    fn percentage_rounds_half_up_and_guards_invalid_months() {
        let id = HabitId::from("a");
        let log = log_with(&id, &[date(2024, 3, 1)]);
        // 1 of 8 elapsed days is 12.5%.
        assert_eq!(
            completion_percentage_for_month(&id, 2024, 3, &log, date(2024, 3, 8)),
            13
        );
        assert_eq!(
            completion_percentage_for_month(&id, 2024, 0, &log, date(2024, 3, 8)),
            0
        );
        assert_eq!(
            completion_percentage_for_month(&id, 2024, 5, &DayLogStore::new(), date(2024, 3, 8)),
            0
        );
    }
}
