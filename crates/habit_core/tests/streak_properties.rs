use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use habit_core::day_log::DayLogStore;
use habit_core::streak::{current_streak, longest_streak};
use habit_core::HabitId;
use proptest::prelude::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
}

fn back(n: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(n)).expect("in range")
}

fn log_from(id: &HabitId, offsets: &BTreeSet<u64>) -> DayLogStore {
    let mut log = DayLogStore::new();
    for offset in offsets {
        log.toggle(id, back(*offset));
    }
    log
}

proptest! {
    #[test]
    fn longest_is_never_below_current(offsets in prop::collection::btree_set(0u64..120, 0..60)) {
        let id = HabitId::from("h");
        let log = log_from(&id, &offsets);
        prop_assert!(longest_streak(&id, &log) >= current_streak(&id, &log, today()));
    }

    #[test]
    fn unbroken_run_ending_today_counts_exactly(k in 1u64..90, noise in prop::collection::btree_set(0u64..200, 0..40)) {
        let id = HabitId::from("h");
        let mut offsets: BTreeSet<u64> = noise.into_iter().filter(|o| *o > k).collect();
        offsets.extend(0..k);
        let log = log_from(&id, &offsets);
        prop_assert_eq!(current_streak(&id, &log, today()), k as u32);
    }

    #[test]
    fn open_today_keeps_yesterdays_run(k in 1u64..90) {
        let id = HabitId::from("h");
        let offsets: BTreeSet<u64> = (1..=k).collect();
        let log = log_from(&id, &offsets);
        prop_assert_eq!(current_streak(&id, &log, today()), k as u32);
    }

    #[test]
    fn double_toggle_is_identity(
        offsets in prop::collection::btree_set(0u64..60, 0..30),
        target in 0u64..60,
    ) {
        let id = HabitId::from("h");
        let other = HabitId::from("other");
        let mut log = log_from(&id, &offsets);
        log.toggle(&other, back(target));
        let before: Vec<bool> = (0..60).map(|o| log.is_completed(&id, back(o))).collect();

        log.toggle(&id, back(target));
        log.toggle(&id, back(target));

        let after: Vec<bool> = (0..60).map(|o| log.is_completed(&id, back(o))).collect();
        prop_assert_eq!(before, after);
        prop_assert!(log.is_completed(&other, back(target)));
    }

    #[test]
    fn removing_a_habit_clears_it_everywhere(offsets in prop::collection::btree_set(0u64..60, 0..30)) {
        let id = HabitId::from("h");
        let mut log = log_from(&id, &offsets);
        log.remove_habit(&id);
        prop_assert_eq!(longest_streak(&id, &log), 0);
        prop_assert!((0..60).all(|o| !log.is_completed(&id, back(o))));
    }
}
