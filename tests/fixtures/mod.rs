// Test fixtures - reusable test data
// Provides consistent grids and viewers across all test files

#![allow(dead_code)]

use weekly_schedule::app::ScheduleApp;
use weekly_schedule::models::schedule::{Day, EntryType, ScheduleEntry, ScheduleGrid, TimeSlot};
use weekly_schedule::models::settings::AppConfig;
use weekly_schedule::services::storage::{LocalStorage, MemoryStorage};
use weekly_schedule::services::sync::channel::{InMemoryRealtime, LocalOnlyChannel};

/// Shorthand for an on-the-hour slot.
pub fn slot(hour: u8) -> TimeSlot {
    TimeSlot::new(hour).unwrap()
}

/// Sample grids for testing
pub mod grids {
    use super::*;

    /// Persisted payload with one Monday entry
    pub const MONDAY_DEV_JSON: &str = r#"{"monday":{"09:00":{"type":"work","activity":"Dev"}}}"#;

    pub fn monday_dev() -> ScheduleGrid {
        let mut grid = ScheduleGrid::new();
        grid.insert(Day::Monday, slot(9), ScheduleEntry::new(EntryType::Work, "Dev"));
        grid
    }

    /// A week with a few entries spread over different days
    pub fn busy_week() -> ScheduleGrid {
        let mut grid = monday_dev();
        grid.insert(Day::Tuesday, slot(14), ScheduleEntry::new(EntryType::Meeting, "Retro"));
        grid.insert(Day::Wednesday, slot(12), ScheduleEntry::new(EntryType::Break, "Lunch"));
        grid.insert(
            Day::Saturday,
            slot(10),
            ScheduleEntry::new(EntryType::Learning, "Rust course"),
        );
        grid
    }
}

/// Sample viewers for testing
pub mod viewers {
    use super::*;

    /// A viewer with no realtime backend, started against `storage`.
    pub fn offline(initial: ScheduleGrid, storage: Box<dyn LocalStorage>) -> ScheduleApp {
        let mut app = ScheduleApp::with_grid(
            &AppConfig::default(),
            initial,
            Box::new(LocalOnlyChannel),
            storage,
        );
        app.start();
        app.take_notices();
        app
    }

    /// A viewer connected to `hub`, with startup events already applied.
    pub fn online(hub: &InMemoryRealtime, initial: ScheduleGrid) -> ScheduleApp {
        online_with_storage(hub, initial, Box::new(MemoryStorage::new()))
    }

    pub fn online_with_storage(
        hub: &InMemoryRealtime,
        initial: ScheduleGrid,
        storage: Box<dyn LocalStorage>,
    ) -> ScheduleApp {
        let mut app =
            ScheduleApp::with_grid(&AppConfig::default(), initial, Box::new(hub.clone()), storage);
        app.start();
        app.pump_sync();
        app.take_notices();
        app
    }
}
