use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::settings::{NotificationKind, NotificationSettings};
use crate::stats::NotificationSnapshot;

/// When a reminder repeats, in local wall-clock time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReminderSchedule {
    Daily { at: NaiveTime },
    Weekly { weekday: Weekday, at: NaiveTime },
    Monthly { day: u32, at: NaiveTime },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRequest {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub schedule: ReminderSchedule,
}

/// Receiver of planned reminders. Each re-plan calls `cancel_all` first and
/// then `schedule` once per reminder, so a sink only ever holds the latest plan.
pub trait NotificationSink: Send + Sync {
    fn cancel_all(&self);
    fn schedule(&self, notification: NotificationRequest);
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Reminders the user opted into, phrased from the current statistics.
pub fn plan_reminders(
    settings: &NotificationSettings,
    stats: &NotificationSnapshot,
) -> Vec<NotificationRequest> {
    let mut planned = Vec::new();

    if settings.evening_reminder {
        planned.push(NotificationRequest {
            kind: NotificationKind::EveningReminder,
            title: "Evening Check-in".to_string(),
            body: "Don't forget to log today's habits!".to_string(),
            schedule: ReminderSchedule::Daily { at: at(20, 0) },
        });
    }

    if settings.morning_stats && stats.total_habits > 0 {
        let body = if stats.yesterday_completed > 0 {
            format!(
                "You completed {}/{} habits yesterday. Keep it up!",
                stats.yesterday_completed, stats.total_habits
            )
        } else {
            format!(
                "Start fresh today! You have {} habits to track.",
                stats.total_habits
            )
        };
        planned.push(NotificationRequest {
            kind: NotificationKind::MorningStats,
            title: "Good Morning".to_string(),
            body,
            schedule: ReminderSchedule::Daily { at: at(9, 0) },
        });
    }

    if settings.weekly_digest {
        planned.push(NotificationRequest {
            kind: NotificationKind::WeeklyDigest,
            title: "Weekly Summary".to_string(),
            body: "Check your weekly progress in the Insights tab!".to_string(),
            schedule: ReminderSchedule::Weekly {
                weekday: Weekday::Sun,
                at: at(19, 0),
            },
        });
    }

    if settings.monthly_digest {
        planned.push(NotificationRequest {
            kind: NotificationKind::MonthlyDigest,
            title: "Monthly Summary".to_string(),
            body: "See how you did last month in your habit tracking!".to_string(),
            schedule: ReminderSchedule::Monthly {
                day: 1,
                at: at(19, 0),
            },
        });
    }

    if settings.streak_saver && stats.has_active_streaks {
        let body = if stats.longest_active_streak > 1 {
            format!(
                "Your {}-day streak is about to break! Log now?",
                stats.longest_active_streak
            )
        } else {
            "Log your habits before midnight to keep your streak!".to_string()
        };
        planned.push(NotificationRequest {
            kind: NotificationKind::StreakSaver,
            title: "Streak Alert".to_string(),
            body,
            schedule: ReminderSchedule::Daily { at: at(23, 30) },
        });
    }

    planned
}

/// Replaces whatever the sink had scheduled with a fresh plan.
pub fn reschedule(
    sink: &dyn NotificationSink,
    settings: &NotificationSettings,
    stats: &NotificationSnapshot,
) -> usize {
    sink.cancel_all();
    let planned = plan_reminders(settings, stats);
    let count = planned.len();
    for request in planned {
        sink.schedule(request);
    }
    tracing::debug!(count, "reminders rescheduled");
    count
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        scheduled: Mutex<Vec<NotificationRequest>>,
        cancels: Mutex<usize>,
    }

    impl NotificationSink for RecordingSink {
        fn cancel_all(&self) {
            *self.cancels.lock() += 1;
            self.scheduled.lock().clear();
        }

        fn schedule(&self, notification: NotificationRequest) {
            self.scheduled.lock().push(notification);
        }
    }

    fn snapshot(total: u32, yesterday: u32, longest: u32) -> NotificationSnapshot {
        NotificationSnapshot {
            total_habits: total,
            yesterday_completed: yesterday,
            has_active_streaks: longest > 0,
            longest_active_streak: longest,
        }
    }

    fn kinds(plan: &[NotificationRequest]) -> Vec<NotificationKind> {
        plan.iter().map(|request| request.kind).collect()
    }

    #[test]
    fn defaults_plan_evening_morning_and_streak() {
        let plan = plan_reminders(&NotificationSettings::default(), &snapshot(3, 2, 5));
        assert_eq!(
            kinds(&plan),
            vec![
                NotificationKind::EveningReminder,
                NotificationKind::MorningStats,
                NotificationKind::StreakSaver,
            ]
        );
        assert_eq!(plan[1].body, "You completed 2/3 habits yesterday. Keep it up!");
        assert_eq!(plan[2].body, "Your 5-day streak is about to break! Log now?");
        assert_eq!(plan[2].schedule, ReminderSchedule::Daily { at: at(23, 30) });
    }

    #[test]
    fn morning_and_streak_messages_adapt() {
        let plan = plan_reminders(&NotificationSettings::default(), &snapshot(4, 0, 1));
        assert_eq!(plan[1].body, "Start fresh today! You have 4 habits to track.");
        assert_eq!(
            plan[2].body,
            "Log your habits before midnight to keep your streak!"
        );
    }

    #[test]
    fn skips_reminders_without_habits_or_streaks() {
        let plan = plan_reminders(&NotificationSettings::default(), &snapshot(0, 0, 0));
        assert_eq!(kinds(&plan), vec![NotificationKind::EveningReminder]);
    }

    #[test]
    fn digests_follow_their_toggles() {
        let mut settings = NotificationSettings::default();
        settings.evening_reminder = false;
        settings.weekly_digest = true;
        settings.monthly_digest = true;
        let plan = plan_reminders(&settings, &snapshot(0, 0, 0));
        assert_eq!(
            plan.iter().map(|r| r.schedule).collect::<Vec<_>>(),
            vec![
                ReminderSchedule::Weekly {
                    weekday: Weekday::Sun,
                    at: at(19, 0)
                },
                ReminderSchedule::Monthly {
                    day: 1,
                    at: at(19, 0)
                },
            ]
        );
    }

    #[test]
    fn reschedule_replaces_previous_plan() {
        let sink = RecordingSink::default();
        reschedule(&sink, &NotificationSettings::default(), &snapshot(2, 1, 2));
        let count = reschedule(&sink, &NotificationSettings::default(), &snapshot(0, 0, 0));
        assert_eq!(count, 1);
        assert_eq!(*sink.cancels.lock(), 2);
        assert_eq!(sink.scheduled.lock().len(), 1);
    }
}
