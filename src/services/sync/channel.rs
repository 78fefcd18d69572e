//! Remote realtime channel capability.
//!
//! The coordinator only needs subscribe / read-once / write on a single
//! path. Transport, auth and storage guarantees belong to the
//! implementation behind the trait.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use thiserror::Error;

/// What a subscription reports.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Current value at the subscribed path; `None` means it holds nothing.
    Value(Option<Value>),
    /// The subscription ended and no further values will arrive.
    Closed(ChannelError),
}

/// Called with every event of one subscription.
pub type UpdateCallback = Box<dyn Fn(ChannelEvent) + Send + 'static>;

/// Called exactly once when a write settles.
pub type CompletionCallback = Box<dyn FnOnce(Result<(), ChannelError>) + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("realtime channel is not available")]
    Unavailable,
    #[error("realtime request failed: {0}")]
    Request(String),
    #[error("realtime write rejected: {0}")]
    Rejected(String),
    #[error("realtime stream closed: {0}")]
    Closed(String),
}

#[cfg_attr(test, mockall::automock)]
pub trait RealtimeChannel {
    /// Starts continuous delivery of values at `path`.
    fn subscribe(&mut self, path: &str, on_update: UpdateCallback) -> Result<(), ChannelError>;

    fn read_once(&mut self, path: &str) -> Result<Option<Value>, ChannelError>;

    /// Replaces the value at `path`. Must return without waiting for the
    /// write to finish; `on_complete` reports the result.
    fn write(&mut self, path: &str, value: Value, on_complete: CompletionCallback);
}

/// Null object for viewers without a realtime backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOnlyChannel;

impl RealtimeChannel for LocalOnlyChannel {
    fn subscribe(&mut self, _path: &str, _on_update: UpdateCallback) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable)
    }

    fn read_once(&mut self, _path: &str) -> Result<Option<Value>, ChannelError> {
        Ok(None)
    }

    fn write(&mut self, _path: &str, _value: Value, on_complete: CompletionCallback) {
        on_complete(Err(ChannelError::Unavailable));
    }
}

#[derive(Default)]
struct HubState {
    values: HashMap<String, Value>,
    subscribers: Vec<(String, UpdateCallback)>,
    unavailable: bool,
    fail_writes: bool,
    hold_completions: bool,
    held: Vec<(CompletionCallback, Result<(), ChannelError>)>,
    writes: usize,
}

impl HubState {
    fn broadcast(&self, path: &str) {
        let value = self.values.get(path).cloned();
        for (subscribed, callback) in &self.subscribers {
            if subscribed == path {
                callback(ChannelEvent::Value(value.clone()));
            }
        }
    }
}

/// In-process realtime hub. Clones share one state, so each clone acts as
/// another viewer connected to the same database.
///
/// Writes are delivered to every subscriber, the writer included, before
/// the write completes. Callbacks run while the hub is locked and must not
/// call back into it.
#[derive(Clone, Default)]
pub struct InMemoryRealtime {
    state: Arc<Mutex<HubState>>,
}

impl InMemoryRealtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hub whose subscriptions fail, as if the service were unreachable.
    pub fn unavailable() -> Self {
        let hub = Self::new();
        hub.lock().unavailable = true;
        hub
    }

    /// Rejects every following write without touching stored values.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Keeps write completions pending until [`release_completions`] runs,
    /// which models a push still in flight.
    ///
    /// [`release_completions`]: InMemoryRealtime::release_completions
    pub fn set_hold_completions(&self, hold: bool) {
        self.lock().hold_completions = hold;
    }

    /// Settles held writes in the order they were issued. Returns how many.
    pub fn release_completions(&self) -> usize {
        let held = std::mem::take(&mut self.lock().held);
        let count = held.len();
        for (callback, result) in held {
            callback(result);
        }
        count
    }

    /// Stores a value as if another viewer wrote it.
    pub fn publish(&self, path: &str, value: Value) {
        let mut state = self.lock();
        state.values.insert(path.to_string(), value);
        state.broadcast(path);
    }

    /// Ends every subscription, as when the server drops the stream.
    /// Returns how many subscribers were told.
    pub fn disconnect(&self, reason: &str) -> usize {
        let subscribers = std::mem::take(&mut self.lock().subscribers);
        let count = subscribers.len();
        for (_, callback) in subscribers {
            callback(ChannelEvent::Closed(ChannelError::Closed(reason.to_string())));
        }
        count
    }

    pub fn value(&self, path: &str) -> Option<Value> {
        self.lock().values.get(path).cloned()
    }

    /// Number of writes accepted or rejected so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        // A poisoned hub only means a test callback panicked; keep the data.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RealtimeChannel for InMemoryRealtime {
    fn subscribe(&mut self, path: &str, on_update: UpdateCallback) -> Result<(), ChannelError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(ChannelError::Unavailable);
        }

        on_update(ChannelEvent::Value(state.values.get(path).cloned()));
        state.subscribers.push((path.to_string(), on_update));
        Ok(())
    }

    fn read_once(&mut self, path: &str) -> Result<Option<Value>, ChannelError> {
        let state = self.lock();
        if state.unavailable {
            return Err(ChannelError::Unavailable);
        }
        Ok(state.values.get(path).cloned())
    }

    fn write(&mut self, path: &str, value: Value, on_complete: CompletionCallback) {
        let mut state = self.lock();
        state.writes += 1;

        let result = if state.unavailable {
            Err(ChannelError::Unavailable)
        } else if state.fail_writes {
            Err(ChannelError::Rejected("permission denied".to_string()))
        } else {
            state.values.insert(path.to_string(), value);
            state.broadcast(path);
            Ok(())
        };

        if state.hold_completions {
            state.held.push((on_complete, result));
        } else {
            drop(state);
            on_complete(result);
        }
    }
}
