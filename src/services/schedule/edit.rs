//! Edit-mode lifecycle and the single-entry edit modal.
//!
//! Viewing <-> Editing, with the modal only reachable while Editing.
//! Mutations go through the [`ScheduleStore`] and are then handed to a
//! [`SchedulePublisher`] (the sync coordinator in the running app).

use crate::models::schedule::{Day, EntryType, ScheduleEntry, ScheduleGrid, TimeSlot};

use super::{ChangeOrigin, ScheduleStore};

/// Receives grids that should leave this viewer.
#[cfg_attr(test, mockall::automock)]
pub trait SchedulePublisher {
    /// Send the full grid to the realtime channel. Must not block.
    fn push(&mut self, grid: &ScheduleGrid);
    /// Write the full grid to local storage.
    fn persist(&mut self, grid: &ScheduleGrid);
}

/// Fields of the open edit modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalState {
    pub day: Day,
    pub time: TimeSlot,
    pub activity: String,
    pub entry_type: EntryType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Updated,
    Removed,
    /// Not in edit mode; nothing happened.
    Ignored,
}

#[derive(Debug, Default)]
pub struct EditSession {
    is_edit_mode: bool,
    original_snapshot: Option<ScheduleGrid>,
    modal: Option<ModalState>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_edit_mode(&self) -> bool {
        self.is_edit_mode
    }

    /// Cells accept clicks only while editing.
    pub fn is_interactive(&self) -> bool {
        self.is_edit_mode
    }

    pub fn modal(&self) -> Option<&ModalState> {
        self.modal.as_ref()
    }

    pub fn original_snapshot(&self) -> Option<&ScheduleGrid> {
        self.original_snapshot.as_ref()
    }

    /// Enters edit mode, re-snapshotting the grid if already editing.
    pub fn enter_edit_mode(&mut self, store: &ScheduleStore) {
        self.is_edit_mode = true;
        self.original_snapshot = Some(store.snapshot());
        log::debug!("Entered schedule edit mode at revision {}", store.revision());
    }

    /// Back to viewing. Leaves grid data alone.
    pub fn exit_edit_mode(&mut self) {
        self.is_edit_mode = false;
        self.modal = None;
    }

    /// Makes the current grid canonical: pushes it, persists it, and leaves
    /// edit mode. Reports success even though the push completes later and
    /// may fail. Returns `false` when not editing.
    pub fn save<P: SchedulePublisher + ?Sized>(
        &mut self,
        store: &ScheduleStore,
        publisher: &mut P,
    ) -> bool {
        if !self.is_edit_mode {
            return false;
        }

        publisher.push(store.grid());
        publisher.persist(store.grid());
        self.original_snapshot = None;
        self.exit_edit_mode();
        true
    }

    /// Restores the grid captured by the most recent `enter_edit_mode` and
    /// leaves edit mode. Remote updates received since then are discarded
    /// with the rest of the edits. Returns whether a snapshot was restored.
    pub fn cancel(&mut self, store: &mut ScheduleStore) -> bool {
        let restored = match self.original_snapshot.take() {
            Some(snapshot) if self.is_edit_mode => {
                store.replace_all_from(snapshot, ChangeOrigin::Restore);
                true
            }
            _ => false,
        };

        self.exit_edit_mode();
        restored
    }

    /// Opens the modal for one cell, pre-filled from the current entry.
    /// Silently ignored while viewing.
    pub fn open_modal(
        &mut self,
        store: &ScheduleStore,
        day: Day,
        time: TimeSlot,
    ) -> Option<&ModalState> {
        if !self.is_edit_mode {
            return None;
        }

        let modal = match store.get_entry(day, time) {
            Some(entry) => ModalState {
                day,
                time,
                activity: entry.activity.clone(),
                entry_type: entry.entry_type,
            },
            None => ModalState {
                day,
                time,
                activity: String::new(),
                entry_type: EntryType::Empty,
            },
        };

        self.modal = Some(modal);
        self.modal.as_ref()
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    /// Applies the modal's values to one cell and pushes the grid right away.
    /// A blank activity or the `empty` type clears the cell.
    pub fn commit_modal_entry<P: SchedulePublisher + ?Sized>(
        &mut self,
        store: &mut ScheduleStore,
        publisher: &mut P,
        day: Day,
        time: TimeSlot,
        activity: &str,
        entry_type: EntryType,
    ) -> CommitOutcome {
        if !self.is_edit_mode {
            return CommitOutcome::Ignored;
        }

        let activity = activity.trim();
        let outcome = if entry_type == EntryType::Empty || activity.is_empty() {
            store.remove_entry(day, time);
            CommitOutcome::Removed
        } else {
            store.set_entry(day, time, ScheduleEntry::new(entry_type, activity));
            CommitOutcome::Updated
        };

        publisher.push(store.grid());
        self.close_modal();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::always;
    use pretty_assertions::assert_eq;

    use super::*;

    fn slot(hour: u8) -> TimeSlot {
        TimeSlot::new(hour).unwrap()
    }

    fn idle_publisher() -> MockSchedulePublisher {
        let mut publisher = MockSchedulePublisher::new();
        publisher.expect_push().never();
        publisher.expect_persist().never();
        publisher
    }

    #[test]
    fn test_enter_edit_mode_snapshots_grid() {
        let store = ScheduleStore::default();
        let mut session = EditSession::new();

        session.enter_edit_mode(&store);
        assert!(session.is_edit_mode());
        assert!(session.is_interactive());
        assert_eq!(session.original_snapshot(), Some(store.grid()));
    }

    #[test]
    fn test_reentering_edit_mode_resnapshots() {
        let mut store = ScheduleStore::default();
        let mut session = EditSession::new();

        session.enter_edit_mode(&store);
        store.remove_entry(Day::Monday, slot(9));
        session.enter_edit_mode(&store);

        assert!(session.original_snapshot().unwrap().get(Day::Monday, slot(9)).is_none());
    }

    #[test]
    fn test_open_modal_outside_edit_mode_is_noop() {
        let store = ScheduleStore::default();
        let mut session = EditSession::new();

        assert!(session.open_modal(&store, Day::Monday, slot(9)).is_none());
        assert!(session.modal().is_none());
    }

    #[test]
    fn test_open_modal_prefills_existing_entry() {
        let store = ScheduleStore::default();
        let mut session = EditSession::new();
        session.enter_edit_mode(&store);

        let modal = session.open_modal(&store, Day::Monday, slot(13)).unwrap();
        assert_eq!(modal.activity, "Team Meeting");
        assert_eq!(modal.entry_type, EntryType::Meeting);
    }

    #[test]
    fn test_open_modal_defaults_for_free_slot() {
        let store = ScheduleStore::new(ScheduleGrid::new());
        let mut session = EditSession::new();
        session.enter_edit_mode(&store);

        let modal = session.open_modal(&store, Day::Sunday, slot(9)).unwrap();
        assert_eq!(modal.activity, "");
        assert_eq!(modal.entry_type, EntryType::Empty);
    }

    #[test]
    fn test_commit_upserts_trimmed_entry_and_pushes() {
        let mut store = ScheduleStore::new(ScheduleGrid::new());
        let mut session = EditSession::new();
        let mut publisher = MockSchedulePublisher::new();
        publisher
            .expect_push()
            .withf(|grid: &ScheduleGrid| grid.len() == 1)
            .times(1)
            .return_const(());
        publisher.expect_persist().never();

        session.enter_edit_mode(&store);
        session.open_modal(&store, Day::Monday, slot(9));
        let outcome = session.commit_modal_entry(
            &mut store,
            &mut publisher,
            Day::Monday,
            slot(9),
            "  Design review  ",
            EntryType::Meeting,
        );

        assert_eq!(outcome, CommitOutcome::Updated);
        assert_eq!(
            store.get_entry(Day::Monday, slot(9)),
            Some(&ScheduleEntry::new(EntryType::Meeting, "Design review"))
        );
        assert!(session.modal().is_none());
        assert!(session.is_interactive());
    }

    #[test]
    fn test_commit_blank_activity_removes_entry() {
        let mut store = ScheduleStore::default();
        let mut session = EditSession::new();
        let mut publisher = MockSchedulePublisher::new();
        publisher.expect_push().with(always()).times(2).return_const(());

        session.enter_edit_mode(&store);
        let blank = session.commit_modal_entry(
            &mut store,
            &mut publisher,
            Day::Monday,
            slot(9),
            "   ",
            EntryType::Work,
        );
        let empty_type = session.commit_modal_entry(
            &mut store,
            &mut publisher,
            Day::Monday,
            slot(10),
            "Still typed",
            EntryType::Empty,
        );

        assert_eq!(blank, CommitOutcome::Removed);
        assert_eq!(empty_type, CommitOutcome::Removed);
        assert!(store.get_entry(Day::Monday, slot(9)).is_none());
        assert!(store.get_entry(Day::Monday, slot(10)).is_none());
    }

    #[test]
    fn test_commit_outside_edit_mode_is_ignored() {
        let mut store = ScheduleStore::new(ScheduleGrid::new());
        let mut session = EditSession::new();
        let mut publisher = idle_publisher();

        let outcome = session.commit_modal_entry(
            &mut store,
            &mut publisher,
            Day::Monday,
            slot(9),
            "Sneaky",
            EntryType::Work,
        );

        assert_eq!(outcome, CommitOutcome::Ignored);
        assert!(store.grid().is_empty());
    }

    #[test]
    fn test_save_pushes_persists_and_exits() {
        let store = ScheduleStore::default();
        let mut session = EditSession::new();
        let mut publisher = MockSchedulePublisher::new();
        publisher.expect_push().times(1).return_const(());
        publisher.expect_persist().times(1).return_const(());

        session.enter_edit_mode(&store);
        assert!(session.save(&store, &mut publisher));
        assert!(!session.is_edit_mode());
        assert!(session.original_snapshot().is_none());
    }

    #[test]
    fn test_save_while_viewing_is_noop() {
        let store = ScheduleStore::default();
        let mut session = EditSession::new();
        let mut publisher = idle_publisher();

        assert!(!session.save(&store, &mut publisher));
    }

    #[test]
    fn test_cancel_restores_pre_edit_grid() {
        let mut store = ScheduleStore::default();
        let original = store.snapshot();
        let mut session = EditSession::new();

        session.enter_edit_mode(&store);
        store.set_entry(Day::Saturday, slot(9), ScheduleEntry::new(EntryType::Work, "Extra"));
        store.remove_entry(Day::Monday, slot(9));
        store.replace_all_from(ScheduleGrid::new(), ChangeOrigin::Remote);

        assert!(session.cancel(&mut store));
        assert_eq!(store.grid(), &original);
        assert!(!session.is_edit_mode());
    }

    #[test]
    fn test_cancel_while_viewing_keeps_grid() {
        let mut store = ScheduleStore::default();
        let mut session = EditSession::new();
        let before = store.revision();

        assert!(!session.cancel(&mut store));
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn test_exit_edit_mode_closes_modal() {
        let store = ScheduleStore::default();
        let mut session = EditSession::new();

        session.enter_edit_mode(&store);
        session.open_modal(&store, Day::Friday, slot(17));
        session.exit_edit_mode();

        assert!(session.modal().is_none());
        assert!(!session.is_interactive());
    }
}
