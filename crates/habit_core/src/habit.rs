use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque, immutable identifier assigned when a habit is created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Fresh random id in the simple (hyphen-free) uuid form.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HabitId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Trims `raw` and rejects names that are left empty.
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The user's habits in creation order.
///
/// Order matters: aggregate statistics break ties by registry position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitRegistry {
    habits: Vec<Habit>,
}

impl HabitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Habit> {
        self.habits.iter()
    }

    pub fn as_slice(&self) -> &[Habit] {
        &self.habits
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn get(&self, id: &HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| &habit.id == id)
    }

    pub fn contains(&self, id: &HabitId) -> bool {
        self.get(id).is_some()
    }

    /// Appends a habit named `name` created at `created_at`.
    ///
    /// Returns `None` without touching the registry when the trimmed name is
    /// empty.
    pub fn add(&mut self, name: &str, created_at: DateTime<Utc>) -> Option<&Habit> {
        let name = normalize_name(name)?;
        let mut id = HabitId::generate();
        while self.contains(&id) {
            id = HabitId::generate();
        }
        self.habits.push(Habit {
            id,
            name,
            created_at,
        });
        self.habits.last()
    }

    pub fn rename(&mut self, id: &HabitId, name: &str) -> bool {
        let Some(name) = normalize_name(name) else {
            return false;
        };
        match self.habits.iter_mut().find(|habit| &habit.id == id) {
            Some(habit) => {
                habit.name = name;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &HabitId) -> Option<Habit> {
        let idx = self.habits.iter().position(|habit| &habit.id == id)?;
        Some(self.habits.remove(idx))
    }

    pub fn clear(&mut self) {
        self.habits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn add_trims_and_rejects_blank_names() {
        let mut registry = HabitRegistry::new();
        assert!(registry.add("   ", created()).is_none());
        assert!(registry.is_empty());

        let habit = registry.add("  Read  ", created()).cloned().unwrap();
        assert_eq!(habit.name, "Read");
        assert_eq!(habit.created_at, created());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut registry = HabitRegistry::new();
        let a = registry.add("A", created()).unwrap().id.clone();
        let b = registry.add("B", created()).unwrap().id.clone();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn rename_keeps_identity() {
        let mut registry = HabitRegistry::new();
        let id = registry.add("Walk", created()).unwrap().id.clone();
        assert!(registry.rename(&id, " Run "));
        let habit = registry.get(&id).unwrap();
        assert_eq!(habit.name, "Run");
        assert_eq!(habit.created_at, created());

        assert!(!registry.rename(&id, "  "));
        assert_eq!(registry.get(&id).unwrap().name, "Run");
        assert!(!registry.rename(&HabitId::from("missing"), "x"));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let habit = Habit {
            id: HabitId::from("abc"),
            name: "Journal".into(),
            created_at: created(),
        };
        let json = serde_json::to_value(&habit).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["createdAt"], "2024-01-01T08:00:00Z");
    }
}
