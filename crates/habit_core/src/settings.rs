use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which reminder a notification preference controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    EveningReminder,
    MorningStats,
    WeeklyDigest,
    MonthlyDigest,
    StreakSaver,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 5] = [
        NotificationKind::EveningReminder,
        NotificationKind::MorningStats,
        NotificationKind::WeeklyDigest,
        NotificationKind::MonthlyDigest,
        NotificationKind::StreakSaver,
    ];

    /// Key used for this preference in the snapshot document.
    pub fn key(&self) -> &'static str {
        match self {
            NotificationKind::EveningReminder => "eveningReminder",
            NotificationKind::MorningStats => "morningStats",
            NotificationKind::WeeklyDigest => "weeklyDigest",
            NotificationKind::MonthlyDigest => "monthlyDigest",
            NotificationKind::StreakSaver => "streakSaver",
        }
    }

    pub fn default_enabled(&self) -> bool {
        matches!(
            self,
            NotificationKind::EveningReminder
                | NotificationKind::MorningStats
                | NotificationKind::StreakSaver
        )
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        NotificationKind::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown notification `{s}`"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub evening_reminder: bool,
    #[serde(default = "default_true")]
    pub morning_stats: bool,
    #[serde(default)]
    pub weekly_digest: bool,
    #[serde(default)]
    pub monthly_digest: bool,
    #[serde(default = "default_true")]
    pub streak_saver: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            evening_reminder: NotificationKind::EveningReminder.default_enabled(),
            morning_stats: NotificationKind::MorningStats.default_enabled(),
            weekly_digest: NotificationKind::WeeklyDigest.default_enabled(),
            monthly_digest: NotificationKind::MonthlyDigest.default_enabled(),
            streak_saver: NotificationKind::StreakSaver.default_enabled(),
        }
    }
}

impl NotificationSettings {
    pub fn is_enabled(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::EveningReminder => self.evening_reminder,
            NotificationKind::MorningStats => self.morning_stats,
            NotificationKind::WeeklyDigest => self.weekly_digest,
            NotificationKind::MonthlyDigest => self.monthly_digest,
            NotificationKind::StreakSaver => self.streak_saver,
        }
    }

    /// Flips one preference and returns its new value.
    pub fn toggle(&mut self, kind: NotificationKind) -> bool {
        let flag = match kind {
            NotificationKind::EveningReminder => &mut self.evening_reminder,
            NotificationKind::MorningStats => &mut self.morning_stats,
            NotificationKind::WeeklyDigest => &mut self.weekly_digest,
            NotificationKind::MonthlyDigest => &mut self.monthly_digest,
            NotificationKind::StreakSaver => &mut self.streak_saver,
        };
        *flag = !*flag;
        *flag
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_notification_keys_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"darkMode": true}"#).unwrap();
        assert!(settings.dark_mode);
        assert_eq!(settings.notifications, NotificationSettings::default());

        let partial: NotificationSettings =
            serde_json::from_str(r#"{"weeklyDigest": true, "streakSaver": false}"#).unwrap();
        assert!(partial.evening_reminder);
        assert!(partial.weekly_digest);
        assert!(!partial.streak_saver);
    }

    #[test]
    fn toggle_flips_only_the_named_preference() {
        let mut prefs = NotificationSettings::default();
        assert!(prefs.toggle(NotificationKind::MonthlyDigest));
        assert!(prefs.is_enabled(NotificationKind::MonthlyDigest));
        assert!(!prefs.toggle(NotificationKind::EveningReminder));
        assert!(prefs.morning_stats);
    }

    #[test]
    fn parses_kind_names_loosely() {
        assert_eq!(
            "streak-saver".parse::<NotificationKind>(),
            Ok(NotificationKind::StreakSaver)
        );
        assert_eq!(
            "morningStats".parse::<NotificationKind>(),
            Ok(NotificationKind::MorningStats)
        );
        assert!("bedtime".parse::<NotificationKind>().is_err());
    }
}
