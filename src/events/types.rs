//! Change feed types.

use crate::types::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};

/// Configuration for a watcher.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Max buffered events before the watcher is dropped.
    /// Default: 1000
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: WatchFilter,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            filter: WatchFilter::default(),
        }
    }
}

/// Filter criteria for watchers.
#[derive(Clone, Debug)]
pub struct WatchFilter {
    /// Entity kinds to report (None = all kinds).
    pub kinds: Option<Vec<EntityKind>>,

    /// Include record create/update/delete events.
    pub include_records: bool,

    /// Include follower edge events.
    pub include_edges: bool,
}

impl Default for WatchFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl WatchFilter {
    /// Everything.
    pub fn all() -> Self {
        Self {
            kinds: None,
            include_records: true,
            include_edges: true,
        }
    }

    /// Record events for specific kinds only.
    pub fn kinds(kinds: Vec<EntityKind>) -> Self {
        Self {
            kinds: Some(kinds),
            include_records: true,
            include_edges: false,
        }
    }

    /// Follower edge events only.
    pub fn edges() -> Self {
        Self {
            kinds: None,
            include_records: false,
            include_edges: true,
        }
    }
}

/// Events emitted to watchers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    // --- Record Events ---
    Created {
        kind: EntityKind,
        id: RecordId,
        /// The stored record as JSON.
        record: serde_json::Value,
    },

    Updated {
        kind: EntityKind,
        id: RecordId,
        record: serde_json::Value,
    },

    Deleted {
        kind: EntityKind,
        id: RecordId,
    },

    // --- Edge Events ---
    /// `subscriber` now follows `target`.
    Followed {
        subscriber: RecordId,
        target: RecordId,
    },

    Unfollowed {
        subscriber: RecordId,
        target: RecordId,
    },

    // --- Lifecycle Events ---
    /// The watcher was dropped.
    Dropped {
        reason: DropReason,
    },
}

impl ChangeEvent {
    /// Kind of record the event concerns, if it is a record event.
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            ChangeEvent::Created { kind, .. }
            | ChangeEvent::Updated { kind, .. }
            | ChangeEvent::Deleted { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Why a watcher was dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly removed.
    Unwatched,
}

/// Unique identifier for a watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Handle held by a watcher.
pub struct WatchHandle {
    pub id: WatchId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<ChangeEvent>,
}

impl WatchHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<ChangeEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<ChangeEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<ChangeEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything currently buffered, without blocking.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.receiver.try_iter().collect()
    }
}
