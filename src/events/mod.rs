//! In-process change feed.
//!
//! Every successful mutation made through [`Database`](crate::Database) is
//! broadcast as a [`ChangeEvent`] to the watchers whose filter matches:
//! - Record creation, update and deletion
//! - Follower edges added or removed
//!
//! Watchers get a bounded buffer; a watcher that falls behind is dropped
//! rather than slowing down writers.
//!
//! # Example
//!
//! ```ignore
//! let handle = db.watch(WatchConfig {
//!     filter: WatchFilter::kinds(vec![EntityKind::User]),
//!     ..Default::default()
//! });
//!
//! while let Ok(event) = handle.recv() {
//!     match event {
//!         ChangeEvent::Deleted { kind, id, .. } => println!("{kind} {id} gone"),
//!         ChangeEvent::Dropped { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{ChangeEvent, DropReason, WatchConfig, WatchFilter, WatchHandle, WatchId};
