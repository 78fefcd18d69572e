//! Sync coordinator: bridges the schedule store to the realtime channel and
//! to local persisted storage.
//!
//! Channel callbacks never touch the grid. They enqueue [`SyncEvent`]s that
//! [`SyncCoordinator::pump`] applies on the thread owning the store, so all
//! grid mutations stay serialized.
//!
//! While any push is in flight, inbound values are treated as this viewer's
//! own echo and dropped. Without that, every write would come straight back
//! as an "external" change and re-render mid-edit.

pub mod channel;
pub mod firebase;

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, Sender};

use serde_json::Value;
use thiserror::Error;

use crate::models::schedule::{GridParseError, ScheduleGrid};
use crate::models::settings::AppConfig;
use crate::services::schedule::edit::SchedulePublisher;
use crate::services::schedule::{ChangeOrigin, ScheduleStore};
use crate::services::storage::LocalStorage;

use channel::{ChannelError, ChannelEvent, LocalOnlyChannel, RealtimeChannel};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("realtime sync could not start: {0}")]
    Initialization(#[source] ChannelError),
    #[error("failed to sync schedule: {0}")]
    Push(#[source] ChannelError),
    #[error("invalid schedule payload: {0}")]
    Parse(#[from] GridParseError),
    #[error("local storage error: {0}")]
    Storage(#[source] anyhow::Error),
    #[error("realtime connection lost: {0}")]
    Disconnected(#[source] ChannelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Offline,
    Online,
}

impl SyncMode {
    /// Connection indicator text.
    pub fn label(&self) -> &'static str {
        match self {
            SyncMode::Online => "Live Collaboration Active",
            SyncMode::Offline => "Offline Mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncState {
    pub mode: SyncMode,
    pub suppress_echo: bool,
}

/// Identifies one outbound write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PushId(u64);

#[derive(Debug)]
pub enum SyncEvent {
    RemoteUpdate(Option<Value>),
    /// The subscription ended; no more remote values will arrive.
    ChannelClosed(ChannelError),
    PushCompleted {
        id: PushId,
        result: Result<(), ChannelError>,
    },
}

/// What happened to one inbound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Another viewer changed the grid; it replaced local state.
    Applied,
    /// Same grid as ours, e.g. the echo of our own write.
    SelfSourced,
    /// Arrived while our push was in flight.
    Suppressed,
    /// Empty value.
    Ignored,
    /// Not a valid grid; local state kept.
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub remote_applied: usize,
    pub self_sourced: usize,
    pub suppressed: usize,
    pub rejected: usize,
    pub pushes_succeeded: usize,
    pub pushes_failed: usize,
    /// The realtime subscription ended and the coordinator went Offline.
    pub disconnected: bool,
}

impl PumpReport {
    pub fn is_empty(&self) -> bool {
        *self == PumpReport::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub remote_path: String,
    pub storage_key: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SyncOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            remote_path: config.remote_path.trim().trim_matches('/').to_string(),
            storage_key: config.storage_key.clone(),
        }
    }
}

pub struct SyncCoordinator {
    channel: Box<dyn RealtimeChannel>,
    storage: Box<dyn LocalStorage>,
    options: SyncOptions,
    mode: SyncMode,
    next_push_id: u64,
    in_flight: BTreeSet<PushId>,
    events_tx: Sender<SyncEvent>,
    events_rx: Receiver<SyncEvent>,
    last_error: Option<SyncError>,
}

impl SyncCoordinator {
    pub fn new(
        channel: Box<dyn RealtimeChannel>,
        storage: Box<dyn LocalStorage>,
        options: SyncOptions,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            channel,
            storage,
            options,
            mode: SyncMode::Offline,
            next_push_id: 0,
            in_flight: BTreeSet::new(),
            events_tx,
            events_rx,
            last_error: None,
        }
    }

    /// Coordinator without a realtime backend.
    pub fn local_only(storage: Box<dyn LocalStorage>, options: SyncOptions) -> Self {
        Self::new(Box::new(LocalOnlyChannel), storage, options)
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn is_connected(&self) -> bool {
        self.mode == SyncMode::Online
    }

    /// True while at least one of our pushes has not completed.
    pub fn suppress_echo(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn state(&self) -> SyncState {
        SyncState {
            mode: self.mode,
            suppress_echo: self.suppress_echo(),
        }
    }

    pub fn in_flight_pushes(&self) -> usize {
        self.in_flight.len()
    }

    /// Most recent recoverable failure, if any.
    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Opens the realtime subscription. Falls back to Offline plus the
    /// persisted grid when the channel is unavailable. When Online, adopts
    /// the remote grid, or uploads ours if the remote path is still empty.
    pub fn initialize(&mut self, store: &mut ScheduleStore) -> SyncMode {
        let tx = self.events_tx.clone();
        let subscribed = self.channel.subscribe(
            &self.options.remote_path,
            Box::new(move |event: ChannelEvent| {
                let _ = tx.send(match event {
                    ChannelEvent::Value(value) => SyncEvent::RemoteUpdate(value),
                    ChannelEvent::Closed(err) => SyncEvent::ChannelClosed(err),
                });
            }),
        );

        match subscribed {
            Ok(()) => {
                self.mode = SyncMode::Online;
                log::info!("Real-time sync initialized on '{}'", self.options.remote_path);
                self.bootstrap(store);
            }
            Err(ChannelError::Unavailable) => {
                log::info!("Realtime channel not available, using local storage only");
                self.go_offline(store, SyncError::Initialization(ChannelError::Unavailable));
            }
            Err(err) => {
                log::error!("Failed to initialize realtime sync: {}", err);
                self.go_offline(store, SyncError::Initialization(err));
            }
        }

        self.mode
    }

    fn go_offline(&mut self, store: &mut ScheduleStore, error: SyncError) {
        self.mode = SyncMode::Offline;
        self.last_error = Some(error);
        self.load_persisted(store);
    }

    fn bootstrap(&mut self, store: &mut ScheduleStore) {
        match self.channel.read_once(&self.options.remote_path) {
            Ok(Some(value)) if !value.is_null() => match ScheduleGrid::from_value(value) {
                Ok(grid) => {
                    if &grid != store.grid() {
                        store.replace_all_from(grid, ChangeOrigin::Remote);
                    }
                    log::info!("Loaded schedule from realtime database");
                }
                Err(err) => {
                    log::error!("Remote schedule is invalid, keeping local copy: {}", err);
                    self.last_error = Some(SyncError::Parse(err));
                }
            },
            Ok(_) => {
                log::info!("No remote schedule yet, uploading local copy");
                self.sync_to_current(store.grid());
            }
            Err(err) => {
                log::warn!("Failed to read remote schedule, keeping local copy: {}", err);
                self.last_error = Some(SyncError::Initialization(err));
            }
        }
    }

    /// Fire-and-forget write of the full grid. No-op while Offline. The
    /// result arrives later through [`pump`](Self::pump); failures are only
    /// logged and are not retried.
    pub fn sync_to_current(&mut self, grid: &ScheduleGrid) -> Option<PushId> {
        if self.mode == SyncMode::Offline {
            return None;
        }

        let value = match grid.to_value() {
            Ok(value) => value,
            Err(err) => {
                log::error!("Failed to serialize schedule for sync: {}", err);
                return None;
            }
        };

        self.next_push_id += 1;
        let id = PushId(self.next_push_id);
        self.in_flight.insert(id);

        let tx = self.events_tx.clone();
        self.channel.write(
            &self.options.remote_path,
            value,
            Box::new(move |result: Result<(), ChannelError>| {
                let _ = tx.send(SyncEvent::PushCompleted { id, result });
            }),
        );

        Some(id)
    }

    /// Writes the full grid to local storage. Independent of remote sync.
    pub fn persist_grid(&mut self, grid: &ScheduleGrid) -> bool {
        let stored = grid
            .to_json()
            .map_err(|err| SyncError::Storage(err.into()))
            .and_then(|json| {
                self.storage
                    .set(&self.options.storage_key, &json)
                    .map_err(SyncError::Storage)
            });

        match stored {
            Ok(()) => true,
            Err(err) => {
                log::error!("Failed to save schedule locally: {}", err);
                self.last_error = Some(err);
                false
            }
        }
    }

    /// Replaces the grid with the persisted copy. Missing or unreadable data
    /// keeps the current grid. Returns whether a grid was loaded.
    pub fn load_persisted(&mut self, store: &mut ScheduleStore) -> bool {
        match self.read_persisted() {
            Ok(Some(grid)) => {
                store.replace_all_from(grid, ChangeOrigin::Persisted);
                log::info!("Loaded saved schedule from local storage");
                true
            }
            Ok(None) => false,
            Err(err) => {
                log::error!("Error loading saved schedule: {}", err);
                self.last_error = Some(err);
                false
            }
        }
    }

    fn read_persisted(&self) -> Result<Option<ScheduleGrid>, SyncError> {
        let raw = self
            .storage
            .get(&self.options.storage_key)
            .map_err(SyncError::Storage)?;

        match raw {
            Some(raw) => Ok(Some(ScheduleGrid::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    /// Applies one inbound value unless it is our own echo.
    pub fn handle_remote_update(
        &mut self,
        store: &mut ScheduleStore,
        value: Option<Value>,
    ) -> InboundOutcome {
        let Some(value) = value.filter(|value| !value.is_null()) else {
            return InboundOutcome::Ignored;
        };

        if self.suppress_echo() {
            log::debug!(
                "Ignoring realtime update while {} push(es) are in flight",
                self.in_flight.len()
            );
            return InboundOutcome::Suppressed;
        }

        match ScheduleGrid::from_value(value) {
            Ok(grid) if &grid == store.grid() => InboundOutcome::SelfSourced,
            Ok(grid) => {
                log::info!("Received real-time schedule update");
                store.replace_all_from(grid, ChangeOrigin::Remote);
                InboundOutcome::Applied
            }
            Err(err) => {
                log::error!("Ignoring invalid realtime schedule: {}", err);
                self.last_error = Some(SyncError::Parse(err));
                InboundOutcome::Rejected
            }
        }
    }

    fn complete_push(&mut self, id: PushId, result: Result<(), ChannelError>) -> bool {
        self.in_flight.remove(&id);
        match result {
            Ok(()) => {
                log::info!("Schedule synced to realtime database");
                true
            }
            Err(err) => {
                log::error!("Failed to sync schedule: {}", err);
                self.last_error = Some(SyncError::Push(err));
                false
            }
        }
    }

    /// Drops to Offline after the subscription ends. The grid is kept as
    /// is; pushes become no-ops until the next `initialize`.
    fn handle_channel_closed(&mut self, err: ChannelError) -> bool {
        if self.mode == SyncMode::Offline {
            return false;
        }

        log::warn!("Realtime subscription ended, switching to offline mode: {}", err);
        self.mode = SyncMode::Offline;
        self.last_error = Some(SyncError::Disconnected(err));
        true
    }

    /// Drains pending channel events in arrival order.
    pub fn pump(&mut self, store: &mut ScheduleStore) -> PumpReport {
        let mut report = PumpReport::default();

        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                SyncEvent::RemoteUpdate(value) => match self.handle_remote_update(store, value) {
                    InboundOutcome::Applied => report.remote_applied += 1,
                    InboundOutcome::SelfSourced => report.self_sourced += 1,
                    InboundOutcome::Suppressed => report.suppressed += 1,
                    InboundOutcome::Rejected => report.rejected += 1,
                    InboundOutcome::Ignored => {}
                },
                SyncEvent::ChannelClosed(err) => {
                    report.disconnected |= self.handle_channel_closed(err);
                }
                SyncEvent::PushCompleted { id, result } => {
                    if self.complete_push(id, result) {
                        report.pushes_succeeded += 1;
                    } else {
                        report.pushes_failed += 1;
                    }
                }
            }
        }

        report
    }
}

impl SchedulePublisher for SyncCoordinator {
    fn push(&mut self, grid: &ScheduleGrid) {
        self.sync_to_current(grid);
    }

    fn persist(&mut self, grid: &ScheduleGrid) {
        self.persist_grid(grid);
    }
}
