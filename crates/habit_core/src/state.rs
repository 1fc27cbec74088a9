use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::day_log::DayLogStore;
use crate::edit_window::EditWindow;
use crate::error::EditWindowViolation;
use crate::habit::{Habit, HabitId, HabitRegistry};
use crate::settings::{NotificationKind, Settings};

/// Result of a toggle that passed the edit-window check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The habit is now completed on the date.
    Completed,
    /// The completion was removed.
    Cleared,
    /// No habit has that id; nothing changed.
    UnknownHabit,
}

impl ToggleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ToggleOutcome::Completed)
    }
}

/// Everything the tracker owns: habits, the day log and user settings.
///
/// All mutations go through the methods below, which keep the day log free
/// of ids that are not in the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitState {
    #[serde(default)]
    habits: HabitRegistry,
    #[serde(default)]
    logs: DayLogStore,
    #[serde(default)]
    settings: Settings,
}

impl HabitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn habits(&self) -> &HabitRegistry {
        &self.habits
    }

    pub fn logs(&self) -> &DayLogStore {
        &self.logs
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn add_habit(&mut self, name: &str, now: DateTime<Utc>) -> Option<HabitId> {
        let habit = self.habits.add(name, now)?;
        tracing::info!(habit_id = %habit.id, name = %habit.name, "habit added");
        Some(habit.id.clone())
    }

    /// Renames a habit in place. Unknown ids and blank names change nothing.
    pub fn edit_habit(&mut self, id: &HabitId, name: &str) -> bool {
        let renamed = self.habits.rename(id, name);
        if renamed {
            tracing::debug!(habit_id = %id, "habit renamed");
        }
        renamed
    }

    /// Removes a habit together with every completion recorded for it.
    pub fn delete_habit(&mut self, id: &HabitId) -> Option<Habit> {
        let removed = self.habits.remove(id)?;
        let touched = self.logs.remove_habit(id);
        tracing::info!(habit_id = %id, days = touched, "habit deleted");
        Some(removed)
    }

    pub fn toggle_habit(
        &mut self,
        id: &HabitId,
        date: NaiveDate,
        window: &EditWindow,
        clock: &dyn Clock,
    ) -> Result<ToggleOutcome, EditWindowViolation> {
        self.apply_toggle(id, date, window, clock)
    }

    /// Same operation as [`HabitState::toggle_habit`], named for callers that
    /// edit a past day.
    pub fn toggle_habit_for_date(
        &mut self,
        id: &HabitId,
        date: NaiveDate,
        window: &EditWindow,
        clock: &dyn Clock,
    ) -> Result<ToggleOutcome, EditWindowViolation> {
        self.apply_toggle(id, date, window, clock)
    }

    /// Whether `date` may be toggled for `id` right now.
    pub fn check_edit(
        &self,
        id: &HabitId,
        date: NaiveDate,
        window: &EditWindow,
        clock: &dyn Clock,
    ) -> Option<Result<(), EditWindowViolation>> {
        let habit = self.habits.get(id)?;
        let created = clock.local_date(habit.created_at);
        Some(window.check(date, clock.today(), created))
    }

    fn apply_toggle(
        &mut self,
        id: &HabitId,
        date: NaiveDate,
        window: &EditWindow,
        clock: &dyn Clock,
    ) -> Result<ToggleOutcome, EditWindowViolation> {
        let Some(check) = self.check_edit(id, date, window, clock) else {
            tracing::debug!(habit_id = %id, %date, "toggle ignored for unknown habit");
            return Ok(ToggleOutcome::UnknownHabit);
        };
        if let Err(violation) = check {
            tracing::debug!(habit_id = %id, %date, %violation, "toggle rejected");
            return Err(violation);
        }

        let completed = self.logs.toggle(id, date);
        tracing::debug!(habit_id = %id, %date, completed, "habit toggled");
        Ok(if completed {
            ToggleOutcome::Completed
        } else {
            ToggleOutcome::Cleared
        })
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.settings.dark_mode = !self.settings.dark_mode;
        self.settings.dark_mode
    }

    pub fn toggle_notification(&mut self, kind: NotificationKind) -> bool {
        self.settings.notifications.toggle(kind)
    }

    /// Forgets every habit and completion and restores default settings.
    pub fn clear_all_data(&mut self) {
        self.habits.clear();
        self.logs.clear();
        self.settings = Settings::default();
        tracing::info!("all habit data cleared");
    }

    pub(crate) fn drop_dangling_completions(&mut self) {
        let habits = &self.habits;
        self.logs.retain_habits(|id| habits.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;

    use super::*;
    use crate::clock::FixedClock;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    }

    fn days_ago(n: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n)).unwrap()
    }

    fn state_with_habit(created_days_ago: u64) -> (HabitState, HabitId, FixedClock) {
        let clock = FixedClock::at_date(today());
        let created = FixedClock::at_date(days_ago(created_days_ago)).now();
        let mut state = HabitState::new();
        let id = state.add_habit("Read", created).unwrap();
        (state, id, clock)
    }

    #[test]
    fn add_rejects_blank_names() {
        let mut state = HabitState::new();
        assert!(state.add_habit(" \t ", Utc::now()).is_none());
        assert!(state.habits().is_empty());
    }

    #[test]
    fn toggle_respects_edit_window() {
        let (mut state, id, clock) = state_with_habit(10);
        let window = EditWindow::default();

        let rejected = state.toggle_habit_for_date(&id, days_ago(8), &window, &clock);
        assert!(matches!(rejected, Err(EditWindowViolation::TooOld { .. })));
        assert_eq!(state.logs().entry_count(), 0);

        let accepted = state.toggle_habit_for_date(&id, days_ago(6), &window, &clock);
        assert_eq!(accepted, Ok(ToggleOutcome::Completed));
        assert!(state.logs().is_completed(&id, days_ago(6)));
    }

    #[test]
    fn both_toggle_entry_points_share_state() {
        let (mut state, id, clock) = state_with_habit(3);
        let window = EditWindow::default();

        assert_eq!(
            state.toggle_habit(&id, today(), &window, &clock),
            Ok(ToggleOutcome::Completed)
        );
        assert_eq!(
            state.toggle_habit_for_date(&id, today(), &window, &clock),
            Ok(ToggleOutcome::Cleared)
        );
        assert!(!state.logs().is_completed(&id, today()));
    }

    #[test]
    fn toggle_of_unknown_habit_is_a_noop() {
        let (mut state, _, clock) = state_with_habit(1);
        let outcome = state.toggle_habit(
            &HabitId::from("ghost"),
            today(),
            &EditWindow::default(),
            &clock,
        );
        assert_eq!(outcome, Ok(ToggleOutcome::UnknownHabit));
        assert_eq!(state.logs().entry_count(), 0);
    }

    #[test]
    fn delete_cascades_into_logs() {
        let (mut state, id, clock) = state_with_habit(5);
        let other = state.add_habit("Walk", clock.now()).unwrap();
        let window = EditWindow::default();
        for n in 0..=4 {
            state.toggle_habit(&id, days_ago(n), &window, &clock).unwrap();
        }
        state.toggle_habit(&other, today(), &window, &clock).unwrap();

        assert!(state.delete_habit(&id).is_some());
        assert!((0..=4).all(|n| !state.logs().is_completed(&id, days_ago(n))));
        assert!(state.logs().is_completed(&other, today()));
        assert!(state.delete_habit(&id).is_none());
    }

    #[test]
    fn edit_renames_and_ignores_unknown() {
        let (mut state, id, _) = state_with_habit(0);
        assert!(state.edit_habit(&id, "  Read more "));
        assert_eq!(state.habits().get(&id).unwrap().name, "Read more");
        assert!(!state.edit_habit(&HabitId::from("nope"), "x"));
    }

    #[test]
    fn clear_all_data_resets_everything() {
        let (mut state, id, clock) = state_with_habit(0);
        state
            .toggle_habit(&id, today(), &EditWindow::default(), &clock)
            .unwrap();
        state.toggle_dark_mode();
        state.toggle_notification(NotificationKind::WeeklyDigest);

        state.clear_all_data();
        assert_eq!(state, HabitState::new());
    }

    #[test]
    fn dangling_completions_are_dropped() {
        let (mut state, id, _) = state_with_habit(0);
        state.logs.toggle(&HabitId::from("gone"), today());
        state.logs.toggle(&id, today());

        state.drop_dangling_completions();
        assert_eq!(state.logs().completion_count(today()), 1);
        assert!(state.logs().is_completed(&id, today()));
    }
}
