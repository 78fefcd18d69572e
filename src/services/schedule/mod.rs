//! In-memory schedule store.
//!
//! The store exclusively owns the live [`ScheduleGrid`]. Everything else,
//! including the edit session and the sync coordinator, reads and writes
//! through it. It never persists or transmits anything itself.

pub mod edit;

use crate::models::schedule::{
    Day, EntryType, ScheduleEntry, ScheduleGrid, TimeSlot, FREE_LABEL,
};

/// Where a mutation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Edit made on this viewer.
    Local,
    /// Grid received from the realtime channel.
    Remote,
    /// Grid loaded from local storage.
    Persisted,
    /// Pre-edit snapshot put back after a cancel.
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    pub origin: ChangeOrigin,
    pub revision: u64,
}

/// One rendered grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleCell {
    pub day: Day,
    pub time: TimeSlot,
    pub entry_type: EntryType,
    pub activity: String,
    pub is_empty: bool,
}

impl ScheduleCell {
    /// Hover text, e.g. `09:00 - Development` or `09:00 - Free time`.
    pub fn title(&self) -> String {
        if self.is_empty {
            format!("{} - Free time", self.time)
        } else {
            format!("{} - {}", self.time, self.activity)
        }
    }
}

/// A time label followed by one cell per day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    pub time: TimeSlot,
    pub cells: Vec<ScheduleCell>,
}

type ChangeListener = Box<dyn FnMut(&StoreChange)>;

pub struct ScheduleStore {
    grid: ScheduleGrid,
    revision: u64,
    listeners: Vec<ChangeListener>,
}

impl ScheduleStore {
    pub fn new(initial: ScheduleGrid) -> Self {
        Self {
            grid: initial,
            revision: 0,
            listeners: Vec::new(),
        }
    }

    pub fn get_entry(&self, day: Day, time: TimeSlot) -> Option<&ScheduleEntry> {
        self.grid.get(day, time)
    }

    /// Upserts an entry. Any type/activity combination is accepted; callers
    /// are responsible for never storing a blank activity.
    pub fn set_entry(&mut self, day: Day, time: TimeSlot, entry: ScheduleEntry) {
        self.grid.insert(day, time, entry);
        self.notify(ChangeOrigin::Local);
    }

    pub fn remove_entry(&mut self, day: Day, time: TimeSlot) {
        if self.grid.remove(day, time).is_some() {
            self.notify(ChangeOrigin::Local);
        }
    }

    pub fn replace_all(&mut self, grid: ScheduleGrid) {
        self.replace_all_from(grid, ChangeOrigin::Local);
    }

    pub fn replace_all_from(&mut self, grid: ScheduleGrid, origin: ChangeOrigin) {
        self.grid = grid;
        self.notify(origin);
    }

    pub fn grid(&self) -> &ScheduleGrid {
        &self.grid
    }

    /// Deep copy of the live grid.
    pub fn snapshot(&self) -> ScheduleGrid {
        self.grid.clone()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Registers a callback run after every mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Projects the grid onto the fixed display rows. Pure; calling it
    /// repeatedly on the same grid yields identical rows.
    pub fn render(&self) -> Vec<ScheduleRow> {
        TimeSlot::DISPLAY
            .iter()
            .map(|&time| ScheduleRow {
                time,
                cells: Day::ALL
                    .iter()
                    .map(|&day| self.render_cell(day, time))
                    .collect(),
            })
            .collect()
    }

    fn render_cell(&self, day: Day, time: TimeSlot) -> ScheduleCell {
        match self.grid.get(day, time) {
            Some(entry) => ScheduleCell {
                day,
                time,
                entry_type: entry.entry_type,
                activity: entry.activity.clone(),
                is_empty: false,
            },
            None => ScheduleCell {
                day,
                time,
                entry_type: EntryType::Empty,
                activity: FREE_LABEL.to_string(),
                is_empty: true,
            },
        }
    }

    fn notify(&mut self, origin: ChangeOrigin) {
        self.revision += 1;
        let change = StoreChange {
            origin,
            revision: self.revision,
        };
        for listener in &mut self.listeners {
            listener(&change);
        }
    }
}

impl Default for ScheduleStore {
    fn default() -> Self {
        Self::new(ScheduleGrid::default_week())
    }
}
