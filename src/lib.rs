//! # Relational Store
//!
//! A small multi-entity record store that keeps references between its
//! records consistent.
//!
//! ## Core Concepts
//!
//! - **Records**: Users, Posts, Profiles and MemberTypes, each kept in its
//!   own keyed [`Collection`]
//! - **Predicates**: single-field `equals` / `inArray` filters used for every lookup
//! - **Integrity**: owners and member types must exist, one profile per user,
//!   and deleting a user cascades into everything that references it
//! - **Follower graph**: who follows whom, stored on the followed user
//!
//! ## Example
//!
//! ```ignore
//! use relstore::{Database, NewPost, NewProfile, NewUser};
//!
//! let db = Database::in_memory();
//!
//! let ada = db.create_user(NewUser::new("Ada", "Lovelace", "ada@example.com"))?;
//! let bob = db.create_user(NewUser::new("Bob", "Babbage", "bob@example.com"))?;
//!
//! db.create_profile(NewProfile::new(&ada.id, "basic"))?;
//! db.create_post(NewPost::new(&ada.id, "Notes", "On the analytical engine"))?;
//!
//! // Bob follows Ada; Ada's record now lists Bob.
//! db.subscribe(&bob.id, &ada.id)?;
//!
//! // Removes Ada from follower lists, then her post, profile and record.
//! db.delete_user(&ada.id)?;
//! ```

pub mod collection;
pub mod database;
pub mod error;
pub mod events;
pub mod graph;
pub mod integrity;
pub mod query;
pub mod snapshot;
pub mod types;

// Re-exports
pub use collection::{Collection, CollectionFor, MemoryCollection, MemoryStore, RecordStore};
pub use database::{Database, DatabaseConfig};
pub use error::{Result, StoreError};
pub use events::{ChangeEvent, DropReason, EventBus, WatchConfig, WatchFilter, WatchHandle, WatchId};
pub use graph::{EdgeState, SubscriptionGraph};
pub use integrity::{IntegrityController, PostCascade, UserRemoval};
pub use query::{FieldRef, Predicate, Value};
pub use snapshot::Snapshot;
pub use types::*;
