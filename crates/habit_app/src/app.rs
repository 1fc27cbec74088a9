use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use habit_core::notifications::{plan_reminders, NotificationRequest, NotificationSink, ReminderSchedule};
use habit_core::stats::HeatTier;
use habit_core::storage::{JsonFileStore, STORAGE_KEY};
use habit_core::{HabitId, HabitService, ToggleOutcome};
use tracing::{debug, info};

use crate::cli::Command;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) storage_key: String,
    pub(crate) edit_window_days: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("HABIT_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(key) = std::env::var("HABIT_STORAGE_KEY") {
            if !key.trim().is_empty() {
                config.storage_key = key.trim().to_string();
            }
        }
        if let Ok(days) = std::env::var("HABIT_EDIT_WINDOW_DAYS") {
            let value = days
                .trim()
                .parse::<u32>()
                .with_context(|| format!("HABIT_EDIT_WINDOW_DAYS must be a number, got `{days}`"))?;
            config.edit_window_days = value;
        }
        debug!(?config, "configuration resolved");
        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn build_service(&self) -> HabitService {
        let store = JsonFileStore::new(&self.data_dir);
        info!(path = %store.dir().display(), key = %self.storage_key, "opening habit store");
        HabitService::builder()
            .with_store(store)
            .with_storage_key(self.storage_key.clone())
            .with_edit_window_days(self.edit_window_days)
            .with_notification_sink(Box::new(TracingSink))
            .build()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("habitlocal");
        Self {
            data_dir,
            storage_key: STORAGE_KEY.to_string(),
            edit_window_days: habit_core::edit_window::DEFAULT_EDIT_WINDOW_DAYS,
        }
    }
}

/// Stands in for an OS notification scheduler: reports each planned
/// reminder as a trace event.
struct TracingSink;

impl NotificationSink for TracingSink {
    fn cancel_all(&self) {
        debug!("cancelling scheduled reminders");
    }

    fn schedule(&self, notification: NotificationRequest) {
        debug!(
            kind = %notification.kind,
            title = %notification.title,
            when = %describe_schedule(&notification.schedule),
            "reminder scheduled"
        );
    }
}

fn describe_schedule(schedule: &ReminderSchedule) -> String {
    match schedule {
        ReminderSchedule::Daily { at } => format!("daily at {}", at.format("%H:%M")),
        ReminderSchedule::Weekly { weekday, at } => {
            format!("every {weekday} at {}", at.format("%H:%M"))
        }
        ReminderSchedule::Monthly { day, at } => {
            format!("monthly on day {day} at {}", at.format("%H:%M"))
        }
    }
}

/// Finds a habit by exact id, unique id prefix, or case-insensitive name.
pub fn resolve_habit(service: &HabitService, needle: &str) -> Result<HabitId> {
    let needle = needle.trim();
    let habits = service.list_habits();
    if let Some(habit) = habits.iter().find(|h| h.id.as_str() == needle) {
        return Ok(habit.id.clone());
    }
    let by_name: Vec<_> = habits
        .iter()
        .filter(|h| h.name.eq_ignore_ascii_case(needle))
        .collect();
    if let [habit] = by_name.as_slice() {
        return Ok(habit.id.clone());
    }
    let by_prefix: Vec<_> = habits
        .iter()
        .filter(|h| !needle.is_empty() && h.id.as_str().starts_with(needle))
        .collect();
    match by_prefix.as_slice() {
        [habit] => Ok(habit.id.clone()),
        [] if by_name.is_empty() => Err(anyhow!("no habit matches `{needle}`")),
        _ => Err(anyhow!("`{needle}` matches more than one habit; use its id")),
    }
}

fn heat_glyph(tier: HeatTier) -> char {
    match tier {
        HeatTier::Future => '·',
        HeatTier::Empty => '□',
        HeatTier::Low => '░',
        HeatTier::Medium => '▒',
        HeatTier::MediumHigh => '▓',
        HeatTier::High => '█',
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn year_month(service: &HabitService, year: Option<i32>, month: Option<u32>) -> (i32, u32) {
    let today = service.today();
    (year.unwrap_or(today.year()), month.unwrap_or(today.month()))
}

pub fn run(config: AppConfig, command: Command, json: bool) -> Result<()> {
    let service = config.build_service();
    execute(&service, command, json)
}

pub fn execute(service: &HabitService, command: Command, json: bool) -> Result<()> {
    match command {
        Command::List => {
            let rows = service.habits_with_streaks();
            if json {
                return print_json(&rows);
            }
            if rows.is_empty() {
                println!("No habits yet. Add one with `habitlocal add <name>`.");
            }
            for row in rows {
                println!(
                    "[{}] {:<24} streak {:>3}  best {:>3}  {}",
                    if row.completed_today { 'x' } else { ' ' },
                    row.habit.name,
                    row.current_streak,
                    row.longest_streak,
                    row.habit.id
                );
            }
        }
        Command::Add { name } => {
            let name = name.join(" ");
            let id = service
                .add_habit(&name)
                .ok_or_else(|| anyhow!("habit name cannot be empty"))?;
            println!("Added {name:?} ({id})");
        }
        Command::Rename { habit, name } => {
            let id = resolve_habit(service, &habit)?;
            if !service.edit_habit(&id, &name.join(" ")) {
                bail!("habit name cannot be empty");
            }
            println!("Renamed {id}");
        }
        Command::Delete { habit } => {
            let id = resolve_habit(service, &habit)?;
            service.delete_habit(&id);
            println!("Deleted {id}");
        }
        Command::Toggle { habit, date } => {
            let id = resolve_habit(service, &habit)?;
            let date = date.unwrap_or_else(|| service.today());
            let outcome = service
                .toggle_habit_for_date(&id, date)
                .map_err(|violation| anyhow!("locked: {violation}"))?;
            if outcome == ToggleOutcome::UnknownHabit {
                bail!("habit {id} no longer exists");
            }
            if outcome.is_completed() {
                println!("Marked done on {date}");
            } else {
                println!("Cleared {date}");
            }
        }
        Command::Streak { habit } => {
            let id = resolve_habit(service, &habit)?;
            let info = service.streak_info(&id);
            if json {
                return print_json(&info);
            }
            println!("current {}  longest {}", info.current, info.longest);
        }
        Command::Month { habit, year, month } => {
            let id = resolve_habit(service, &habit)?;
            let (year, month) = year_month(service, year, month);
            let pct = service.monthly_completion_pct(&id, year, month);
            if json {
                return print_json(&serde_json::json!({ "year": year, "month": month, "percentage": pct }));
            }
            println!("{year}-{month:02}: {pct}%");
        }
        Command::Stats => {
            let stats = service.insight_stats();
            if json {
                return print_json(&stats);
            }
            println!("Today: {}/{}", stats.today_completed, stats.today_total);
            println!("Week:  {}/{}", stats.week_completed, stats.week_total);
            if let Some(name) = stats.best_streak_habit {
                println!("Best streak: {name} ({} days)", stats.best_streak_count);
            }
        }
        Command::Heatmap { habit, year, month } => {
            let habit = habit.map(|h| resolve_habit(service, &h)).transpose()?;
            let (year, month) = year_month(service, year, month);
            let cells = service.heat_map_month(year, month, habit.as_ref());
            if json {
                return print_json(&cells);
            }
            let Some(first) = cells.first() else {
                bail!("invalid month {year}-{month}");
            };
            println!("{year}-{month:02}");
            println!(" S  M  T  W  T  F  S");
            let lead = first.date.weekday().num_days_from_sunday() as usize;
            let mut line = "   ".repeat(lead);
            for cell in &cells {
                line.push(' ');
                line.push(heat_glyph(cell.tier));
                line.push(' ');
                if cell.date.weekday().num_days_from_sunday() == 6 {
                    println!("{}", line.trim_end());
                    line.clear();
                }
            }
            if !line.is_empty() {
                println!("{}", line.trim_end());
            }
        }
        Command::Day { date } => show_day(service, date, json)?,
        Command::Settings => {
            let settings = service.settings();
            if json {
                return print_json(&settings);
            }
            println!("dark mode: {}", settings.dark_mode);
            for kind in habit_core::settings::NotificationKind::ALL {
                println!("{kind}: {}", settings.notifications.is_enabled(kind));
            }
        }
        Command::DarkMode => {
            let enabled = service.toggle_dark_mode();
            println!("dark mode {}", if enabled { "on" } else { "off" });
        }
        Command::Notify { kind } => {
            let enabled = service.toggle_notification(kind);
            println!("{kind} {}", if enabled { "on" } else { "off" });
        }
        Command::Reminders => {
            let plan = plan_reminders(
                &service.settings().notifications,
                &service.notification_snapshot(),
            );
            if json {
                return print_json(&plan);
            }
            for reminder in plan {
                println!(
                    "{:<18} {:<28} {}",
                    reminder.title,
                    describe_schedule(&reminder.schedule),
                    reminder.body
                );
            }
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to erase all data without --yes");
            }
            service.clear_all_data();
            println!("All habit data erased");
        }
    }
    Ok(())
}

fn show_day(service: &HabitService, date: NaiveDate, json: bool) -> Result<()> {
    let habits = service.list_habits();
    let rows: Vec<_> = habits
        .iter()
        .map(|habit| {
            let editable = matches!(service.can_edit(&habit.id, date), Some(Ok(())));
            (habit, service.is_completed(&habit.id, date), editable)
        })
        .collect();
    if json {
        let value: Vec<_> = rows
            .iter()
            .map(|(habit, done, editable)| {
                serde_json::json!({
                    "id": habit.id,
                    "name": habit.name,
                    "completed": done,
                    "editable": editable,
                })
            })
            .collect();
        return print_json(&value);
    }
    println!(
        "{date}: {}/{} completed (editable up to {} days back)",
        service.daily_completion_count(date),
        habits.len(),
        service.edit_window().days()
    );
    for (habit, done, editable) in rows {
        println!(
            "[{}] {}{}",
            if done { 'x' } else { ' ' },
            habit.name,
            if editable { "" } else { "  (locked)" }
        );
    }
    Ok(())
}
