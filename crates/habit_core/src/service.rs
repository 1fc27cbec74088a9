use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::edit_window::EditWindow;
use crate::error::{EditWindowViolation, StorageError};
use crate::habit::{Habit, HabitId};
use crate::notifications::{self, NotificationSink};
use crate::settings::{NotificationKind, Settings};
use crate::state::{HabitState, ToggleOutcome};
use crate::stats::{
    self, BestStreak, CompletionStats, HabitWithStreak, HeatMapCell, InsightStats,
    NotificationSnapshot,
};
use crate::storage::{self, SnapshotStore, STORAGE_KEY};
use crate::streak::{self, StreakInfo};

/// Owns the tracker state and exposes the query and mutation surface.
///
/// Mutations update memory first, then write a snapshot to the configured
/// store and re-plan reminders. A failed save is logged and otherwise
/// ignored; the in-memory state stays authoritative.
pub struct HabitService {
    state: RwLock<HabitState>,
    clock: Box<dyn Clock>,
    store: Option<Box<dyn SnapshotStore>>,
    storage_key: String,
    edit_window: EditWindow,
    notification_sink: Option<Box<dyn NotificationSink>>,
}

pub struct HabitServiceBuilder {
    clock: Box<dyn Clock>,
    store: Option<Box<dyn SnapshotStore>>,
    storage_key: String,
    edit_window: EditWindow,
    notification_sink: Option<Box<dyn NotificationSink>>,
    initial_state: Option<HabitState>,
}

impl Default for HabitServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self {
            clock: Box::new(SystemClock),
            store: None,
            storage_key: STORAGE_KEY.to_string(),
            edit_window: EditWindow::default(),
            notification_sink: None,
            initial_state: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_edit_window_days(mut self, days: u32) -> Self {
        self.edit_window = EditWindow::new(days);
        self
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    /// Starts from `state` instead of whatever the store holds.
    pub fn with_state(mut self, state: HabitState) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn build(self) -> HabitService {
        let state = match (self.initial_state, &self.store) {
            (Some(state), _) => state,
            (None, Some(store)) => storage::load_state(store.as_ref(), &self.storage_key),
            (None, None) => HabitState::default(),
        };
        HabitService {
            state: RwLock::new(state),
            clock: self.clock,
            store: self.store,
            storage_key: self.storage_key,
            edit_window: self.edit_window,
            notification_sink: self.notification_sink,
        }
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn edit_window(&self) -> EditWindow {
        self.edit_window
    }

    /// Copy of the full state, e.g. for export.
    pub fn snapshot(&self) -> HabitState {
        self.state.read().clone()
    }

    pub fn list_habits(&self) -> Vec<Habit> {
        self.state.read().habits().as_slice().to_vec()
    }

    pub fn habit(&self, id: &HabitId) -> Option<Habit> {
        self.state.read().habits().get(id).cloned()
    }

    pub fn settings(&self) -> Settings {
        *self.state.read().settings()
    }

    pub fn current_streak(&self, id: &HabitId) -> u32 {
        let today = self.clock.today();
        streak::current_streak(id, self.state.read().logs(), today)
    }

    pub fn longest_streak(&self, id: &HabitId) -> u32 {
        streak::longest_streak(id, self.state.read().logs())
    }

    pub fn streak_info(&self, id: &HabitId) -> StreakInfo {
        let today = self.clock.today();
        streak::streak_info(id, self.state.read().logs(), today)
    }

    pub fn is_completed(&self, id: &HabitId, date: NaiveDate) -> bool {
        streak::is_completed_on(id, date, self.state.read().logs())
    }

    pub fn monthly_completion_pct(&self, id: &HabitId, year: i32, month: u32) -> u8 {
        let today = self.clock.today();
        streak::completion_percentage_for_month(id, year, month, self.state.read().logs(), today)
    }

    pub fn today_stats(&self) -> CompletionStats {
        let today = self.clock.today();
        let state = self.state.read();
        stats::today_stats(state.habits(), state.logs(), today)
    }

    pub fn week_stats(&self) -> CompletionStats {
        let today = self.clock.today();
        let state = self.state.read();
        stats::week_stats(state.habits(), state.logs(), today)
    }

    pub fn best_streak(&self) -> Option<BestStreak> {
        let today = self.clock.today();
        let state = self.state.read();
        stats::best_streak(state.habits(), state.logs(), today)
    }

    pub fn daily_completion_count(&self, date: NaiveDate) -> u32 {
        stats::daily_completion_count(self.state.read().logs(), date)
    }

    pub fn insight_stats(&self) -> InsightStats {
        let today = self.clock.today();
        let state = self.state.read();
        stats::insight_stats(state.habits(), state.logs(), today)
    }

    pub fn habits_with_streaks(&self) -> Vec<HabitWithStreak> {
        let today = self.clock.today();
        let state = self.state.read();
        stats::habits_with_streaks(state.habits(), state.logs(), today)
    }

    pub fn heat_map_month(&self, year: i32, month: u32, habit: Option<&HabitId>) -> Vec<HeatMapCell> {
        let today = self.clock.today();
        let state = self.state.read();
        stats::heat_map_month(state.habits(), state.logs(), year, month, habit, today)
    }

    pub fn notification_snapshot(&self) -> NotificationSnapshot {
        let today = self.clock.today();
        let state = self.state.read();
        stats::notification_snapshot(state.habits(), state.logs(), today)
    }

    /// Whether `date` may currently be toggled for `id`; `None` for unknown
    /// habits.
    pub fn can_edit(&self, id: &HabitId, date: NaiveDate) -> Option<Result<(), EditWindowViolation>> {
        self.state
            .read()
            .check_edit(id, date, &self.edit_window, self.clock.as_ref())
    }

    pub fn add_habit(&self, name: &str) -> Option<HabitId> {
        let added = self.state.write().add_habit(name, self.clock.now());
        if added.is_some() {
            self.after_mutation();
        }
        added
    }

    pub fn edit_habit(&self, id: &HabitId, name: &str) -> bool {
        let renamed = self.state.write().edit_habit(id, name);
        if renamed {
            self.after_mutation();
        }
        renamed
    }

    pub fn delete_habit(&self, id: &HabitId) -> bool {
        let removed = self.state.write().delete_habit(id).is_some();
        if removed {
            self.after_mutation();
        }
        removed
    }

    pub fn toggle_habit(
        &self,
        id: &HabitId,
        date: NaiveDate,
    ) -> Result<ToggleOutcome, EditWindowViolation> {
        let outcome =
            self.state
                .write()
                .toggle_habit(id, date, &self.edit_window, self.clock.as_ref())?;
        self.after_toggle(outcome);
        Ok(outcome)
    }

    pub fn toggle_habit_for_date(
        &self,
        id: &HabitId,
        date: NaiveDate,
    ) -> Result<ToggleOutcome, EditWindowViolation> {
        let outcome = self.state.write().toggle_habit_for_date(
            id,
            date,
            &self.edit_window,
            self.clock.as_ref(),
        )?;
        self.after_toggle(outcome);
        Ok(outcome)
    }

    pub fn toggle_today(&self, id: &HabitId) -> Result<ToggleOutcome, EditWindowViolation> {
        self.toggle_habit(id, self.clock.today())
    }

    pub fn toggle_dark_mode(&self) -> bool {
        let enabled = self.state.write().toggle_dark_mode();
        self.after_mutation();
        enabled
    }

    pub fn toggle_notification(&self, kind: NotificationKind) -> bool {
        let enabled = self.state.write().toggle_notification(kind);
        self.after_mutation();
        enabled
    }

    /// Irreversibly drops every habit and completion and resets settings.
    pub fn clear_all_data(&self) {
        self.state.write().clear_all_data();
        self.after_mutation();
    }

    /// Writes the current state to the store, if one is configured.
    pub fn save(&self) -> Result<(), StorageError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let state = self.state.read();
        storage::save_state(store.as_ref(), &self.storage_key, &state)
    }

    /// Re-plans reminders on the configured sink. Returns how many were
    /// scheduled.
    pub fn refresh_notifications(&self) -> usize {
        let Some(sink) = &self.notification_sink else {
            return 0;
        };
        let settings = self.settings();
        let snapshot = self.notification_snapshot();
        notifications::reschedule(sink.as_ref(), &settings.notifications, &snapshot)
    }

    fn after_toggle(&self, outcome: ToggleOutcome) {
        if outcome != ToggleOutcome::UnknownHabit {
            self.after_mutation();
        }
    }

    fn after_mutation(&self) {
        if let Err(err) = self.save() {
            tracing::warn!(key = %self.storage_key, %err, "failed to persist habit state");
        }
        self.refresh_notifications();
    }
}
