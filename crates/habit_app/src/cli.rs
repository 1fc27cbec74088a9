use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use habit_core::settings::NotificationKind;

#[derive(Debug, Parser)]
#[command(name = "habitlocal", version, about = "Local-first habit tracker")]
pub struct Cli {
    /// Directory holding the habit snapshot (overrides HABIT_DATA_DIR).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List habits with their streaks.
    List,
    /// Add a new habit.
    Add {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Rename a habit.
    Rename {
        habit: String,
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Delete a habit and all of its completions.
    Delete { habit: String },
    /// Flip completion for a day (defaults to today).
    Toggle {
        habit: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show current and longest streak.
    Streak { habit: String },
    /// Completion percentage for a month.
    Month {
        habit: String,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Today, week and best-streak summary.
    Stats,
    /// Monthly heat map, for one habit or all of them.
    Heatmap {
        #[arg(long)]
        habit: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Completions recorded on a given date.
    Day { date: NaiveDate },
    /// Show settings.
    Settings,
    /// Toggle dark mode.
    DarkMode,
    /// Toggle a reminder kind (e.g. eveningReminder, weekly-digest).
    Notify { kind: NotificationKind },
    /// Reminders that would currently be scheduled.
    Reminders,
    /// Erase every habit, completion and setting.
    Clear {
        #[arg(long)]
        yes: bool,
    },
}
