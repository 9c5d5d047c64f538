//! Event bus broadcasting store changes to watchers.

use crate::types::{Record, RecordId};
use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use super::types::{ChangeEvent, DropReason, WatchConfig, WatchHandle, WatchId};

/// Internal watcher state.
struct Watcher {
    config: WatchConfig,
    sender: Sender<ChangeEvent>,
}

impl Watcher {
    /// Try to send an event. Returns false if the buffer is full or the
    /// handle is gone.
    fn try_send(&self, event: ChangeEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    fn wants(&self, event: &ChangeEvent) -> bool {
        let filter = &self.config.filter;
        match event.kind() {
            Some(kind) => {
                filter.include_records
                    && filter.kinds.as_ref().map_or(true, |kinds| kinds.contains(&kind))
            }
            None => filter.include_edges,
        }
    }
}

/// Manages watchers and broadcasts events.
pub struct EventBus {
    watchers: RwLock<HashMap<WatchId, Watcher>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            watchers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a watcher and return its handle.
    pub fn watch(&self, config: WatchConfig) -> WatchHandle {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size);

        self.watchers.write().insert(id, Watcher { config, sender });

        WatchHandle { id, receiver }
    }

    /// Remove a watcher.
    pub fn unwatch(&self, id: WatchId) {
        if let Some(watcher) = self.watchers.write().remove(&id) {
            // Best effort; the buffer may be full.
            let _ = watcher.sender.try_send(ChangeEvent::Dropped {
                reason: DropReason::Unwatched,
            });
        }
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.read().len()
    }

    // --- Broadcasting ---

    pub fn record_created<T: Record>(&self, record: &T) {
        self.broadcast(ChangeEvent::Created {
            kind: T::KIND,
            id: record.id().clone(),
            record: to_json(record),
        });
    }

    pub fn record_updated<T: Record>(&self, record: &T) {
        self.broadcast(ChangeEvent::Updated {
            kind: T::KIND,
            id: record.id().clone(),
            record: to_json(record),
        });
    }

    pub fn record_deleted<T: Record>(&self, record: &T) {
        self.broadcast(ChangeEvent::Deleted {
            kind: T::KIND,
            id: record.id().clone(),
        });
    }

    pub fn followed(&self, subscriber: &RecordId, target: &RecordId) {
        self.broadcast(ChangeEvent::Followed {
            subscriber: subscriber.clone(),
            target: target.clone(),
        });
    }

    pub fn unfollowed(&self, subscriber: &RecordId, target: &RecordId) {
        self.broadcast(ChangeEvent::Unfollowed {
            subscriber: subscriber.clone(),
            target: target.clone(),
        });
    }

    /// Send to every interested watcher. Drops watchers that fail to
    /// receive.
    fn broadcast(&self, event: ChangeEvent) {
        let mut to_remove = Vec::new();

        {
            let watchers = self.watchers.read();
            if watchers.is_empty() {
                return;
            }
            for (id, watcher) in watchers.iter() {
                if watcher.wants(&event) && !watcher.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut watchers = self.watchers.write();
            for id in to_remove {
                if let Some(watcher) = watchers.remove(&id) {
                    warn!(watcher = id.0, "dropping slow watcher");
                    let _ = watcher.sender.try_send(ChangeEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json<T: Record>(record: &T) -> serde_json::Value {
    serde_json::to_value(record).unwrap_or_else(|e| {
        warn!(kind = %T::KIND, error = %e, "could not encode record for watchers");
        serde_json::Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WatchFilter;
    use crate::types::{EntityKind, Post, User};
    use std::time::Duration;

    fn make_user(id: &str) -> User {
        User {
            id: id.into(),
            first_name: "Test".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_watch_unwatch() {
        let bus = EventBus::new();

        let handle = bus.watch(WatchConfig::default());
        assert_eq!(bus.watcher_count(), 1);

        bus.unwatch(handle.id);
        assert_eq!(bus.watcher_count(), 0);
        assert!(matches!(
            handle.try_recv(),
            Ok(ChangeEvent::Dropped {
                reason: DropReason::Unwatched
            })
        ));
    }

    #[test]
    fn test_broadcast_to_matching_kind() {
        let bus = EventBus::new();
        let handle = bus.watch(WatchConfig {
            filter: WatchFilter::kinds(vec![EntityKind::User]),
            ..Default::default()
        });

        bus.record_created(&make_user("u1"));

        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        match event {
            ChangeEvent::Created { kind, id, record } => {
                assert_eq!(kind, EntityKind::User);
                assert_eq!(id, RecordId::from("u1"));
                assert_eq!(record["firstName"], "Test");
            }
            other => panic!("Expected Created event, got {:?}", other),
        }
    }

    #[test]
    fn test_filters_non_matching() {
        let bus = EventBus::new();
        let handle = bus.watch(WatchConfig {
            filter: WatchFilter::kinds(vec![EntityKind::User]),
            ..Default::default()
        });

        bus.record_deleted(&Post::default());
        bus.followed(&"a".into(), &"b".into());

        assert!(handle.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_edge_events() {
        let bus = EventBus::new();
        let handle = bus.watch(WatchConfig {
            filter: WatchFilter::edges(),
            ..Default::default()
        });

        bus.record_created(&make_user("u1"));
        bus.followed(&"a".into(), &"b".into());
        bus.unfollowed(&"a".into(), &"b".into());

        let events = handle.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ChangeEvent::Followed { .. }));
        assert!(matches!(events[1], ChangeEvent::Unfollowed { .. }));
    }

    #[test]
    fn test_drop_slow_watcher() {
        let bus = EventBus::new();
        let _handle = bus.watch(WatchConfig {
            buffer_size: 2,
            filter: WatchFilter::all(),
        });

        for i in 0..10 {
            bus.record_updated(&make_user(&format!("u{}", i)));
        }

        assert_eq!(bus.watcher_count(), 0);
    }
}
