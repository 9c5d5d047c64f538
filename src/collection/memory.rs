//! In-memory collections.

use super::{Collection, RecordStore};
use crate::error::{Result, StoreError};
use crate::query::{filter, Predicate};
use crate::types::{MemberType, Post, Profile, Record, RecordId, User};
use parking_lot::RwLock;

/// An ordered in-memory table. Iteration order is insertion order.
pub struct MemoryCollection<T> {
    rows: RwLock<Vec<T>>,
}

impl<T: Record> MemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Build a collection from existing rows, keeping their ids.
    pub fn from_rows(rows: Vec<T>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Copy of every row, in order.
    pub fn rows(&self) -> Vec<T> {
        self.rows.read().clone()
    }

    fn position(rows: &[T], id: &RecordId) -> Option<usize> {
        rows.iter().position(|r| r.id() == id)
    }
}

impl<T: Record> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Collection<T> for MemoryCollection<T> {
    fn insert(&self, mut record: T) -> Result<T> {
        let mut rows = self.rows.write();

        if record.id().is_empty() {
            record.set_id(RecordId::generate());
        } else if Self::position(&rows, record.id()).is_some() {
            return Err(StoreError::Conflict(format!(
                "{} {} already exists",
                T::KIND,
                record.id()
            )));
        }

        rows.push(record.clone());
        Ok(record)
    }

    fn find_one(&self, predicate: &Predicate) -> Option<T> {
        self.rows
            .read()
            .iter()
            .find(|r| predicate.matches(*r))
            .cloned()
    }

    fn find_many(&self, predicate: Option<&Predicate>) -> Vec<T> {
        filter(self.rows.read().iter(), predicate)
    }

    fn replace(&self, id: &RecordId, mut record: T) -> Result<T> {
        let mut rows = self.rows.write();
        let pos = Self::position(&rows, id).ok_or_else(|| StoreError::not_found(T::KIND, id))?;

        // The key never changes through a replace.
        record.set_id(id.clone());
        rows[pos] = record.clone();
        Ok(record)
    }

    fn remove(&self, id: &RecordId) -> Result<T> {
        let mut rows = self.rows.write();
        let pos = Self::position(&rows, id).ok_or_else(|| StoreError::not_found(T::KIND, id))?;
        Ok(rows.remove(pos))
    }

    fn len(&self) -> usize {
        self.rows.read().len()
    }
}

/// The default backend: one in-memory collection per entity kind.
#[derive(Default)]
pub struct MemoryStore {
    users: MemoryCollection<User>,
    posts: MemoryCollection<Post>,
    profiles: MemoryCollection<Profile>,
    member_types: MemoryCollection<MemberType>,
}

impl MemoryStore {
    /// An empty store with no member types.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store holding the default member types.
    pub fn seeded() -> Self {
        Self {
            member_types: MemoryCollection::from_rows(MemberType::defaults()),
            ..Default::default()
        }
    }

    pub fn from_parts(
        users: Vec<User>,
        posts: Vec<Post>,
        profiles: Vec<Profile>,
        member_types: Vec<MemberType>,
    ) -> Self {
        Self {
            users: MemoryCollection::from_rows(users),
            posts: MemoryCollection::from_rows(posts),
            profiles: MemoryCollection::from_rows(profiles),
            member_types: MemoryCollection::from_rows(member_types),
        }
    }

    pub fn user_rows(&self) -> Vec<User> {
        self.users.rows()
    }

    pub fn post_rows(&self) -> Vec<Post> {
        self.posts.rows()
    }

    pub fn profile_rows(&self) -> Vec<Profile> {
        self.profiles.rows()
    }

    pub fn member_type_rows(&self) -> Vec<MemberType> {
        self.member_types.rows()
    }
}

impl RecordStore for MemoryStore {
    fn users(&self) -> &dyn Collection<User> {
        &self.users
    }

    fn posts(&self) -> &dyn Collection<Post> {
        &self.posts
    }

    fn profiles(&self) -> &dyn Collection<Profile> {
        &self.profiles
    }

    fn member_types(&self) -> &dyn Collection<MemberType> {
        &self.member_types
    }
}
