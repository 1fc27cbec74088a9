//! Aggregates across the whole registry: today/week completion, best current
//! streak, per-day counts for the heat map, and the snapshot handed to the
//! reminder planner.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::day_log::DayLogStore;
use crate::habit::{Habit, HabitId, HabitRegistry};
use crate::streak;

pub const WEEK_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub completed: u32,
    pub total: u32,
}

impl CompletionStats {
    /// Completed share as a whole percentage, 0 when nothing is tracked.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (u64::from(self.completed) * 200 + u64::from(self.total))
            / (u64::from(self.total) * 2);
        pct.min(100) as u8
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BestStreak {
    pub habit_id: HabitId,
    pub habit_name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsightStats {
    pub today_completed: u32,
    pub today_total: u32,
    pub week_completed: u32,
    pub week_total: u32,
    pub best_streak_habit: Option<String>,
    pub best_streak_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HabitWithStreak {
    #[serde(flatten)]
    pub habit: Habit,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completed_today: bool,
}

/// Read-only figures the reminder planner phrases its messages from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSnapshot {
    pub total_habits: u32,
    pub yesterday_completed: u32,
    pub has_active_streaks: bool,
    pub longest_active_streak: u32,
}

/// The seven days ending today, oldest first.
pub fn week_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (0..WEEK_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
        .collect()
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn completed_on(habits: &HabitRegistry, log: &DayLogStore, date: NaiveDate) -> u32 {
    count(
        habits
            .iter()
            .filter(|habit| log.is_completed(&habit.id, date))
            .count(),
    )
}

pub fn today_stats(habits: &HabitRegistry, log: &DayLogStore, today: NaiveDate) -> CompletionStats {
    CompletionStats {
        completed: completed_on(habits, log, today),
        total: count(habits.len()),
    }
}

pub fn week_stats(habits: &HabitRegistry, log: &DayLogStore, today: NaiveDate) -> CompletionStats {
    let completed = week_dates(today)
        .into_iter()
        .map(|date| completed_on(habits, log, date))
        .sum();
    CompletionStats {
        completed,
        total: count(habits.len()).saturating_mul(WEEK_DAYS),
    }
}

/// Habit with the highest current streak. The earliest habit in the registry
/// wins ties; `None` when no habit has an active streak.
pub fn best_streak(habits: &HabitRegistry, log: &DayLogStore, today: NaiveDate) -> Option<BestStreak> {
    let mut best: Option<BestStreak> = None;
    for habit in habits.iter() {
        let streak = streak::current_streak(&habit.id, log, today);
        let leading = best.as_ref().map(|b| b.count).unwrap_or(0);
        if streak > leading {
            best = Some(BestStreak {
                habit_id: habit.id.clone(),
                habit_name: habit.name.clone(),
                count: streak,
            });
        }
    }
    best
}

/// Number of habits recorded as completed on `date`.
pub fn daily_completion_count(log: &DayLogStore, date: NaiveDate) -> u32 {
    count(log.completion_count(date))
}

pub fn insight_stats(habits: &HabitRegistry, log: &DayLogStore, today: NaiveDate) -> InsightStats {
    let day = today_stats(habits, log, today);
    let week = week_stats(habits, log, today);
    let best = best_streak(habits, log, today);
    InsightStats {
        today_completed: day.completed,
        today_total: day.total,
        week_completed: week.completed,
        week_total: week.total,
        best_streak_count: best.as_ref().map(|b| b.count).unwrap_or(0),
        best_streak_habit: best.map(|b| b.habit_name),
    }
}

pub fn habits_with_streaks(
    habits: &HabitRegistry,
    log: &DayLogStore,
    today: NaiveDate,
) -> Vec<HabitWithStreak> {
    habits
        .iter()
        .map(|habit| HabitWithStreak {
            habit: habit.clone(),
            current_streak: streak::current_streak(&habit.id, log, today),
            longest_streak: streak::longest_streak(&habit.id, log),
            completed_today: log.is_completed(&habit.id, today),
        })
        .collect()
}

pub fn notification_snapshot(
    habits: &HabitRegistry,
    log: &DayLogStore,
    today: NaiveDate,
) -> NotificationSnapshot {
    let yesterday_completed = today
        .pred_opt()
        .map(|yesterday| daily_completion_count(log, yesterday))
        .unwrap_or(0);
    let longest_active_streak = habits
        .iter()
        .map(|habit| streak::current_streak(&habit.id, log, today))
        .max()
        .unwrap_or(0);
    NotificationSnapshot {
        total_habits: count(habits.len()),
        yesterday_completed,
        has_active_streaks: longest_active_streak > 0,
        longest_active_streak,
    }
}

/// Intensity bucket of one heat-map day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeatTier {
    Future,
    Empty,
    Low,
    Medium,
    MediumHigh,
    High,
}

impl HeatTier {
    pub fn classify(completed: u32, total: u32, is_future: bool) -> Self {
        if is_future {
            return HeatTier::Future;
        }
        if total == 0 || completed == 0 {
            return HeatTier::Empty;
        }
        // Compare completed/total against quarter marks without floats.
        let scaled = u64::from(completed) * 100;
        let total = u64::from(total);
        if scaled <= 25 * total {
            HeatTier::Low
        } else if scaled <= 50 * total {
            HeatTier::Medium
        } else if scaled <= 75 * total {
            HeatTier::MediumHigh
        } else {
            HeatTier::High
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeatMapCell {
    pub date: NaiveDate,
    pub completed: u32,
    pub total: u32,
    pub tier: HeatTier,
}

/// One cell per day of `month` (1-12). With `habit` set the map covers that
/// habit alone, otherwise every tracked habit.
pub fn heat_map_month(
    habits: &HabitRegistry,
    log: &DayLogStore,
    year: i32,
    month: u32,
    habit: Option<&HabitId>,
    today: NaiveDate,
) -> Vec<HeatMapCell> {
    let Some(days) = streak::days_in_month(year, month) else {
        return Vec::new();
    };
    let total = match habit {
        Some(_) => 1,
        None => count(habits.len()),
    };

    (1..=days)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .map(|date| {
            let completed = match habit {
                Some(id) => u32::from(log.is_completed(id, date)),
                None => daily_completion_count(log, date),
            };
            HeatMapCell {
                date,
                completed,
                total,
                tier: HeatTier::classify(completed, total, date > today),
            }
        })
        .collect()
}
