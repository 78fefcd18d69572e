// Property-based tests for rendering and the edit cycle
// Exercises the store and edit session with random grids and edits

mod fixtures;

use proptest::prelude::*;
use weekly_schedule::models::schedule::{
    Day, EntryType, ScheduleEntry, ScheduleGrid, TimeSlot, FREE_LABEL,
};
use weekly_schedule::services::schedule::ScheduleStore;
use weekly_schedule::services::storage::MemoryStorage;

use fixtures::viewers;

fn day() -> impl Strategy<Value = Day> {
    (0..Day::ALL.len()).prop_map(|i| Day::ALL[i])
}

fn time() -> impl Strategy<Value = TimeSlot> {
    (0u8..24).prop_map(|hour| TimeSlot::new(hour).unwrap())
}

fn displayed_time() -> impl Strategy<Value = TimeSlot> {
    (0..TimeSlot::DISPLAY.len()).prop_map(|i| TimeSlot::DISPLAY[i])
}

/// Any type that may be stored, i.e. everything but `empty`.
fn stored_type() -> impl Strategy<Value = EntryType> {
    (0..EntryType::ALL.len() - 1).prop_map(|i| EntryType::ALL[i])
}

fn grid() -> impl Strategy<Value = ScheduleGrid> {
    prop::collection::vec((day(), time(), stored_type(), "[A-Za-z][A-Za-z ]{0,15}"), 0..30)
        .prop_map(|entries| {
            let mut grid = ScheduleGrid::new();
            for (day, time, entry_type, activity) in entries {
                grid.insert(day, time, ScheduleEntry::new(entry_type, activity));
            }
            grid
        })
}

/// One modal commit: a blank activity or `empty` type clears the cell.
fn edit() -> impl Strategy<Value = (Day, TimeSlot, String, EntryType)> {
    (
        day(),
        displayed_time(),
        prop_oneof!["", "  ", "[A-Za-z]{1,12}"],
        (0..EntryType::ALL.len()).prop_map(|i| EntryType::ALL[i]),
    )
}

proptest! {
    /// Property: rendering twice gives the same rows
    #[test]
    fn prop_render_is_idempotent(grid in grid()) {
        let store = ScheduleStore::new(grid);
        prop_assert_eq!(store.render(), store.render());
    }

    /// Property: every displayed slot without an entry renders as Free
    #[test]
    fn prop_missing_entries_render_free(grid in grid()) {
        let store = ScheduleStore::new(grid.clone());
        let rows = store.render();
        prop_assert_eq!(rows.len(), TimeSlot::DISPLAY.len());

        for row in rows {
            prop_assert_eq!(row.cells.len(), Day::ALL.len());
            for cell in row.cells {
                match grid.get(cell.day, cell.time) {
                    Some(entry) => {
                        prop_assert!(!cell.is_empty);
                        prop_assert_eq!(&cell.activity, &entry.activity);
                    }
                    None => {
                        prop_assert!(cell.is_empty);
                        prop_assert_eq!(cell.activity.as_str(), FREE_LABEL);
                        prop_assert_eq!(cell.entry_type, EntryType::Empty);
                    }
                }
            }
        }
    }

    /// Property: cancel restores exactly the grid seen on entering edit mode
    #[test]
    fn prop_cancel_restores_prior_state(
        initial in grid(),
        edits in prop::collection::vec(edit(), 1..10),
    ) {
        let mut app = viewers::offline(initial.clone(), Box::new(MemoryStorage::new()));

        app.enter_edit_mode();
        for (day, time, activity, entry_type) in edits {
            app.commit_entry(day, time, &activity, entry_type);
        }
        prop_assert!(app.cancel());
        prop_assert_eq!(app.store().grid(), &initial);
    }

    /// Property: a commit leaves an entry only for a non-blank, non-empty input
    #[test]
    fn prop_commit_sets_or_removes(initial in grid(), (day, time, activity, entry_type) in edit()) {
        let mut app = viewers::offline(initial, Box::new(MemoryStorage::new()));

        app.enter_edit_mode();
        app.commit_entry(day, time, &activity, entry_type);

        let stored = app.store().get_entry(day, time);
        if entry_type == EntryType::Empty || activity.trim().is_empty() {
            prop_assert_eq!(stored, None);
        } else {
            let expected = ScheduleEntry::new(entry_type, activity.trim());
            prop_assert_eq!(stored, Some(&expected));
        }
        prop_assert!(app.store().grid().validate().is_ok());
    }
}
