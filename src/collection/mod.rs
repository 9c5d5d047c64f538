//! Keyed record collections.
//!
//! The integrity and follower-graph logic only talk to storage through the
//! [`Collection`] and [`RecordStore`] traits, so any backend offering
//! insert / lookup / replace / remove can host them. [`MemoryStore`] is the
//! default backend.

mod memory;

pub use memory::{MemoryCollection, MemoryStore};

use crate::error::Result;
use crate::query::Predicate;
use crate::types::{MemberType, Post, Profile, Record, RecordId, User};

/// A keyed, ordered collection of one record type.
///
/// Each call is atomic on its own; nothing spans calls.
pub trait Collection<T: Record>: Send + Sync {
    /// Insert a record. An empty id is replaced by a fresh one; an explicit
    /// id that is already taken fails with `Conflict`.
    fn insert(&self, record: T) -> Result<T>;

    /// First record matching `predicate`, in iteration order.
    fn find_one(&self, predicate: &Predicate) -> Option<T>;

    /// All records matching `predicate` (all records when `None`).
    fn find_many(&self, predicate: Option<&Predicate>) -> Vec<T>;

    /// Replace the record stored under `id`. Fails with `NotFound` if absent.
    fn replace(&self, id: &RecordId, record: T) -> Result<T>;

    /// Remove the record stored under `id`. Fails with `NotFound` if absent.
    fn remove(&self, id: &RecordId) -> Result<T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point lookup by id.
    fn get(&self, id: &RecordId) -> Option<T> {
        self.find_one(&Predicate::id(id))
    }
}

/// One collection per entity kind.
pub trait RecordStore: Send + Sync {
    fn users(&self) -> &dyn Collection<User>;
    fn posts(&self) -> &dyn Collection<Post>;
    fn profiles(&self) -> &dyn Collection<Profile>;
    fn member_types(&self) -> &dyn Collection<MemberType>;
}

/// Typed access to the collection holding `T`.
pub trait CollectionFor<T: Record> {
    fn collection(&self) -> &dyn Collection<T>;
}

impl<S: RecordStore + ?Sized> CollectionFor<User> for S {
    fn collection(&self) -> &dyn Collection<User> {
        self.users()
    }
}

impl<S: RecordStore + ?Sized> CollectionFor<Post> for S {
    fn collection(&self) -> &dyn Collection<Post> {
        self.posts()
    }
}

impl<S: RecordStore + ?Sized> CollectionFor<Profile> for S {
    fn collection(&self) -> &dyn Collection<Profile> {
        self.profiles()
    }
}

impl<S: RecordStore + ?Sized> CollectionFor<MemberType> for S {
    fn collection(&self) -> &dyn Collection<MemberType> {
        self.member_types()
    }
}
