use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::habit::HabitId;

/// One calendar day of completions as it appears in the snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayLog {
    pub date: NaiveDate,
    pub completed_habits: Vec<HabitId>,
}

/// Sparse mapping from local calendar date to the habits completed that day.
///
/// A missing date and a date holding an empty set read the same everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<DayLog>", into = "Vec<DayLog>")]
pub struct DayLogStore {
    days: BTreeMap<NaiveDate, BTreeSet<HabitId>>,
}

impl DayLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, id: &HabitId, date: NaiveDate) -> bool {
        self.days
            .get(&date)
            .map(|set| set.contains(id))
            .unwrap_or(false)
    }

    pub fn completion_count(&self, date: NaiveDate) -> usize {
        self.days.get(&date).map(BTreeSet::len).unwrap_or(0)
    }

    /// Dates on which `id` was completed, oldest first.
    pub fn completed_dates<'a>(&'a self, id: &'a HabitId) -> impl Iterator<Item = NaiveDate> + 'a {
        self.days
            .iter()
            .filter(move |(_, set)| set.contains(id))
            .map(|(date, _)| *date)
    }

    /// Flips membership of `id` on `date`, creating the entry on first use.
    ///
    /// Returns whether the habit is completed on `date` afterwards.
    pub fn toggle(&mut self, id: &HabitId, date: NaiveDate) -> bool {
        let set = self.days.entry(date).or_default();
        if set.remove(id) {
            false
        } else {
            set.insert(id.clone());
            true
        }
    }

    /// Drops `id` from every day. Emptied days are kept.
    pub fn remove_habit(&mut self, id: &HabitId) -> usize {
        let mut touched = 0;
        for set in self.days.values_mut() {
            if set.remove(id) {
                touched += 1;
            }
        }
        touched
    }

    pub fn retain_habits(&mut self, mut keep: impl FnMut(&HabitId) -> bool) {
        for set in self.days.values_mut() {
            set.retain(|id| keep(id));
        }
    }

    /// Number of stored date entries, including emptied ones.
    pub fn entry_count(&self) -> usize {
        self.days.len()
    }

    /// Days with at least one completion, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = DayLog> + '_ {
        self.days
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(date, set)| DayLog {
                date: *date,
                completed_habits: set.iter().cloned().collect(),
            })
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }
}

impl From<Vec<DayLog>> for DayLogStore {
    fn from(logs: Vec<DayLog>) -> Self {
        let mut days: BTreeMap<NaiveDate, BTreeSet<HabitId>> = BTreeMap::new();
        for log in logs {
            days.entry(log.date)
                .or_default()
                .extend(log.completed_habits);
        }
        Self { days }
    }
}

impl From<DayLogStore> for Vec<DayLog> {
    fn from(store: DayLogStore) -> Self {
        store.entries().collect()
    }
}
