//! Application facade.
//!
//! Owns the store, the edit session, the sync coordinator and the notice
//! queue, and turns their outcomes into user-visible notices. Front ends
//! (the terminal shell, tests) drive the schedule only through this type.

pub mod commands;
pub mod render;

use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone};

use crate::models::schedule::{Day, EntryType, ScheduleGrid, TimeSlot};
use crate::models::settings::AppConfig;
use crate::services::notification::{Notice, NotificationService, NoticeQueue};
use crate::services::schedule::edit::{CommitOutcome, EditSession, ModalState};
use crate::services::schedule::{ScheduleCell, ScheduleStore};
use crate::services::storage::LocalStorage;
use crate::services::sync::channel::RealtimeChannel;
use crate::services::sync::{PumpReport, SyncCoordinator, SyncMode, SyncOptions};
use crate::utils::date;

pub const EDIT_MODE_NOTICE: &str = "Edit mode enabled. Click any schedule cell to modify it.";
pub const SAVED_NOTICE: &str = "Schedule saved and synced to all users!";
pub const CANCELLED_NOTICE: &str = "Changes cancelled.";
pub const ENTRY_UPDATED_NOTICE: &str = "Schedule entry updated and synced!";
pub const REMOTE_UPDATE_NOTICE: &str = "Schedule updated by another user";
pub const CONNECTION_LOST_NOTICE: &str = "Connection lost. Working in offline mode.";

/// A rendered cell plus its presentation flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub cell: ScheduleCell,
    /// Accepts clicks (edit mode only).
    pub interactive: bool,
    /// Contains the current day and hour.
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub time: TimeSlot,
    pub cells: Vec<CellView>,
}

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleView {
    pub rows: Vec<RowView>,
    pub is_edit_mode: bool,
    pub modal: Option<ModalState>,
    pub status: SyncMode,
    pub clock: String,
}

impl ScheduleView {
    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }
}

pub struct ScheduleApp {
    store: ScheduleStore,
    session: EditSession,
    sync: SyncCoordinator,
    notices: NoticeQueue,
    notifier: NotificationService,
}

impl ScheduleApp {
    pub fn new(
        store: ScheduleStore,
        sync: SyncCoordinator,
        notices: NoticeQueue,
        notifier: NotificationService,
    ) -> Self {
        Self {
            store,
            session: EditSession::new(),
            sync,
            notices,
            notifier,
        }
    }

    /// Wires the app from config with the default week as the initial grid.
    pub fn from_config(
        config: &AppConfig,
        channel: Box<dyn RealtimeChannel>,
        storage: Box<dyn LocalStorage>,
    ) -> Self {
        Self::with_grid(config, ScheduleGrid::default_week(), channel, storage)
    }

    pub fn with_grid(
        config: &AppConfig,
        initial: ScheduleGrid,
        channel: Box<dyn RealtimeChannel>,
        storage: Box<dyn LocalStorage>,
    ) -> Self {
        Self::new(
            ScheduleStore::new(initial),
            SyncCoordinator::new(channel, storage, SyncOptions::from(config)),
            NoticeQueue::new(Duration::from_secs(config.notice_duration_secs)),
            NotificationService::new(config.desktop_notifications),
        )
    }

    /// Connects the realtime channel. The persisted grid is only used when
    /// the channel cannot be opened.
    pub fn start(&mut self) -> SyncMode {
        let mode = self.sync.initialize(&mut self.store);
        log::info!("Schedule started in {}", mode.label());
        mode
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    pub fn is_edit_mode(&self) -> bool {
        self.session.is_edit_mode()
    }

    pub fn enter_edit_mode(&mut self) {
        self.session.enter_edit_mode(&self.store);
        self.notices.info(EDIT_MODE_NOTICE);
    }

    /// Pushes and persists the grid, then leaves edit mode.
    pub fn save(&mut self) -> bool {
        let saved = self.session.save(&self.store, &mut self.sync);
        if saved {
            self.notices.success(SAVED_NOTICE);
        }
        saved
    }

    pub fn cancel(&mut self) -> bool {
        if !self.session.is_edit_mode() {
            return false;
        }

        self.session.cancel(&mut self.store);
        self.notices.info(CANCELLED_NOTICE);
        true
    }

    pub fn open_modal(&mut self, day: Day, time: TimeSlot) -> Option<ModalState> {
        self.session.open_modal(&self.store, day, time).cloned()
    }

    pub fn close_modal(&mut self) {
        self.session.close_modal();
    }

    pub fn commit_entry(
        &mut self,
        day: Day,
        time: TimeSlot,
        activity: &str,
        entry_type: EntryType,
    ) -> CommitOutcome {
        let outcome = self.session.commit_modal_entry(
            &mut self.store,
            &mut self.sync,
            day,
            time,
            activity,
            entry_type,
        );

        if outcome != CommitOutcome::Ignored {
            self.notices.success(ENTRY_UPDATED_NOTICE);
        }
        outcome
    }

    /// Commits the `empty` type, which removes the entry.
    pub fn clear_entry(&mut self, day: Day, time: TimeSlot) -> CommitOutcome {
        self.commit_entry(day, time, "", EntryType::Empty)
    }

    /// Applies pending channel events; raises a notice when another viewer
    /// changed the grid or the realtime connection dropped.
    pub fn pump_sync(&mut self) -> PumpReport {
        let report = self.sync.pump(&mut self.store);

        if report.remote_applied > 0 {
            self.announce(Notice::info(REMOTE_UPDATE_NOTICE));
        }
        if report.disconnected {
            self.announce(Notice::warning(CONNECTION_LOST_NOTICE));
        }

        report
    }

    /// Queues a notice and mirrors it on the desktop.
    fn announce(&mut self, notice: Notice) {
        if let Err(e) = self.notifier.show_notice(&notice) {
            log::warn!("Failed to show desktop notification: {}", e);
        }
        self.notices.push(notice);
    }

    /// Takes the pending notices that have not expired yet.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take_active(Instant::now())
    }

    pub fn view<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> ScheduleView {
        let current = date::current_position(now).filter(|(_, time)| time.is_displayed());
        let interactive = self.session.is_interactive();

        let rows = self
            .store
            .render()
            .into_iter()
            .map(|row| RowView {
                time: row.time,
                cells: row
                    .cells
                    .into_iter()
                    .map(|cell| CellView {
                        is_current: current == Some((cell.day, cell.time)),
                        interactive,
                        cell,
                    })
                    .collect(),
            })
            .collect();

        ScheduleView {
            rows,
            is_edit_mode: self.session.is_edit_mode(),
            modal: self.session.modal().cloned(),
            status: self.sync.mode(),
            clock: date::clock_label(now),
        }
    }
}
