pub mod clock;
pub mod day_log;
pub mod edit_window;
pub mod error;
pub mod habit;
pub mod notifications;
pub mod service;
pub mod settings;
pub mod state;
pub mod stats;
pub mod storage;
pub mod streak;

pub use crate::error::{EditWindowViolation, StorageError};
pub use crate::habit::{Habit, HabitId};
pub use crate::service::{HabitService, HabitServiceBuilder};
pub use crate::state::{HabitState, ToggleOutcome};
