//! Main Database struct tying all components together.

use crate::collection::{Collection, CollectionFor, MemoryStore, RecordStore};
use crate::error::{Result, StoreError};
use crate::events::{EventBus, WatchConfig, WatchHandle, WatchId};
use crate::graph::{EdgeState, SubscriptionGraph};
use crate::integrity::{IntegrityController, PostCascade, UserRemoval};
use crate::query::Predicate;
use crate::snapshot::{self, Snapshot, SNAPSHOT_FILE};
use crate::types::{
    AnyRecord, MemberType, MemberTypePatch, NewPost, NewProfile, NewUser, Post, PostPatch,
    Profile, ProfilePatch, Record, RecordId, RecordPatch, StoreStats, User, UserPatch,
};
use parking_lot::RwLock;
use std::fs::{self, File};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Database configuration.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    /// Directory for snapshots. `None` keeps everything in memory.
    pub path: Option<PathBuf>,

    /// Whether to create the directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Install the default member types into a new database.
    pub seed_member_types: bool,

    /// How many posts a user deletion removes.
    pub post_cascade: PostCascade,

    /// Write a snapshot after every successful mutation. A failed write is
    /// logged and does not fail the mutation, which has already applied.
    pub flush_on_write: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            create_if_missing: true,
            seed_member_types: true,
            post_cascade: PostCascade::FirstOnly,
            flush_on_write: false,
        }
    }
}

/// The relational store.
///
/// Provides a unified interface for:
/// - Creating records with their references checked
/// - Deleting users along with their posts, profile and follower entries
/// - Following and unfollowing between users
/// - Watching changes as they happen
///
/// All mutations are serialized through one gate; reads share it, so a
/// reader never sees a user deletion half done.
pub struct Database<S: RecordStore = MemoryStore> {
    config: DatabaseConfig,

    /// Lock file for exclusive access to `config.path`. Snapshots are only
    /// written while it is held.
    lock_file: Option<File>,

    store: S,

    /// Write guard for mutations, read guard for lookups.
    gate: RwLock<()>,

    events: EventBus,
}

impl Database<MemoryStore> {
    /// A fresh in-memory database with the default member types.
    pub fn in_memory() -> Self {
        Self::with_store(MemoryStore::seeded(), DatabaseConfig::default())
    }

    /// Open an existing database or create a new one.
    pub fn open_or_create(config: DatabaseConfig) -> Result<Self> {
        let Some(path) = config.path.clone() else {
            let store = if config.seed_member_types {
                MemoryStore::seeded()
            } else {
                MemoryStore::new()
            };
            return Ok(Self::with_store(store, config));
        };

        if path.join(SNAPSHOT_FILE).exists() {
            Self::open(config)
        } else if path.exists() || config.create_if_missing {
            Self::create(config)
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Create a new database in `config.path`, writing an initial snapshot.
    pub fn create(config: DatabaseConfig) -> Result<Self> {
        let path = config.path.clone().ok_or(StoreError::NotInitialized)?;
        fs::create_dir_all(&path)?;

        let lock_file = snapshot::acquire_lock(&path)?;

        let store = if config.seed_member_types {
            MemoryStore::seeded()
        } else {
            MemoryStore::new()
        };
        Snapshot::capture(&store).write_to(&path.join(SNAPSHOT_FILE))?;

        info!(path = %path.display(), "created database");

        let mut db = Self::with_store(store, config);
        db.lock_file = Some(lock_file);
        Ok(db)
    }

    /// Open an existing database directory.
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        let path = config.path.clone().ok_or(StoreError::NotInitialized)?;
        let lock_file = snapshot::acquire_lock(&path)?;

        let snapshot = Snapshot::read_from(&path.join(SNAPSHOT_FILE))?;
        info!(
            path = %path.display(),
            records = snapshot.record_count(),
            "opened database"
        );

        let mut db = Self::with_store(snapshot.into_store(), config);
        db.lock_file = Some(lock_file);
        Ok(db)
    }
}

impl<S: RecordStore> Database<S> {
    /// Wrap an existing backend. No directory lock is taken, so no
    /// snapshot is ever written, even when `config.path` is set.
    pub fn with_store(store: S, config: DatabaseConfig) -> Self {
        Self {
            config,
            lock_file: None,
            store,
            gate: RwLock::new(()),
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Direct access to the backend, bypassing the gate.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn integrity(&self) -> IntegrityController<'_, S> {
        IntegrityController::new(&self.store).with_post_cascade(self.config.post_cascade)
    }

    fn graph(&self) -> SubscriptionGraph<'_, S> {
        SubscriptionGraph::new(&self.store)
    }

    // --- Watchers ---

    pub fn watch(&self, config: WatchConfig) -> WatchHandle {
        self.events.watch(config)
    }

    pub fn unwatch(&self, id: WatchId) {
        self.events.unwatch(id)
    }

    // --- Creation ---

    pub fn create_user(&self, input: NewUser) -> Result<User> {
        let _gate = self.gate.write();
        let user = self.integrity().create_user(input)?;
        self.events.record_created(&user);
        self.committed();
        Ok(user)
    }

    /// Create a post. Fails with `InvalidReference` if the owner is unknown.
    pub fn create_post(&self, input: NewPost) -> Result<Post> {
        let _gate = self.gate.write();
        let post = self.integrity().create_post(input)?;
        self.events.record_created(&post);
        self.committed();
        Ok(post)
    }

    /// Create a profile. Fails with `InvalidReference` if the owner or
    /// member type is unknown, `Conflict` if the owner already has one.
    pub fn create_profile(&self, input: NewProfile) -> Result<Profile> {
        let _gate = self.gate.write();
        let profile = self.integrity().create_profile(input)?;
        self.events.record_created(&profile);
        self.committed();
        Ok(profile)
    }

    // --- Lookup ---

    /// Fetch one record by id.
    pub fn get<T: Record>(&self, id: &RecordId) -> Result<T>
    where
        S: CollectionFor<T>,
    {
        let _gate = self.gate.read();
        <S as CollectionFor<T>>::collection(&self.store)
            .get(id)
            .ok_or_else(|| StoreError::not_found(T::KIND, id))
    }

    /// Records of one kind matching `predicate` (all when `None`).
    pub fn find<T: Record>(&self, predicate: Option<&Predicate>) -> Vec<T>
    where
        S: CollectionFor<T>,
    {
        let _gate = self.gate.read();
        <S as CollectionFor<T>>::collection(&self.store).find_many(predicate)
    }

    pub fn get_user(&self, id: &RecordId) -> Result<User> {
        self.get(id)
    }

    pub fn get_post(&self, id: &RecordId) -> Result<Post> {
        self.get(id)
    }

    pub fn get_profile(&self, id: &RecordId) -> Result<Profile> {
        self.get(id)
    }

    pub fn get_member_type(&self, id: &RecordId) -> Result<MemberType> {
        self.get(id)
    }

    pub fn list_users(&self) -> Vec<User> {
        self.find(None)
    }

    pub fn list_posts(&self) -> Vec<Post> {
        self.find(None)
    }

    pub fn list_profiles(&self) -> Vec<Profile> {
        self.find(None)
    }

    pub fn list_member_types(&self) -> Vec<MemberType> {
        self.find(None)
    }

    // --- Update ---

    /// Merge `patch` into the stored record. References are not re-checked.
    pub fn update<T: Record>(&self, id: &RecordId, patch: T::Patch) -> Result<T>
    where
        S: CollectionFor<T>,
    {
        let _gate = self.gate.write();
        let updated = self.integrity().update::<T>(id, patch)?;
        self.events.record_updated(&updated);
        self.committed();
        Ok(updated)
    }

    pub fn update_user(&self, id: &RecordId, patch: UserPatch) -> Result<User> {
        self.update(id, patch)
    }

    pub fn update_post(&self, id: &RecordId, patch: PostPatch) -> Result<Post> {
        self.update(id, patch)
    }

    pub fn update_profile(&self, id: &RecordId, patch: ProfilePatch) -> Result<Profile> {
        self.update(id, patch)
    }

    pub fn update_member_type(&self, id: &RecordId, patch: MemberTypePatch) -> Result<MemberType> {
        self.update(id, patch)
    }

    /// Kind-tagged form of [`update`](Self::update).
    pub fn update_record(&self, id: &RecordId, patch: RecordPatch) -> Result<AnyRecord> {
        Ok(match patch {
            RecordPatch::User(p) => AnyRecord::User(self.update(id, p)?),
            RecordPatch::Post(p) => AnyRecord::Post(self.update(id, p)?),
            RecordPatch::Profile(p) => AnyRecord::Profile(self.update(id, p)?),
            RecordPatch::MemberType(p) => AnyRecord::MemberType(self.update(id, p)?),
        })
    }

    // --- Deletion ---

    /// Delete a user, clearing it from follower lists and removing its
    /// posts (per [`PostCascade`]) and profile.
    pub fn delete_user(&self, id: &RecordId) -> Result<UserRemoval> {
        let _gate = self.gate.write();
        let removal = self.integrity().delete_user(id)?;

        // A self-follower is reported only as deleted.
        for user in removal.unfollowed.iter().filter(|u| u.id != removal.user.id) {
            self.events.record_updated(user);
        }
        for post in &removal.posts {
            self.events.record_deleted(post);
        }
        if let Some(profile) = &removal.profile {
            self.events.record_deleted(profile);
        }
        self.events.record_deleted(&removal.user);

        self.committed();
        Ok(removal)
    }

    pub fn delete_post(&self, id: &RecordId) -> Result<Post> {
        let _gate = self.gate.write();
        let post = self.integrity().delete_post(id)?;
        self.events.record_deleted(&post);
        self.committed();
        Ok(post)
    }

    pub fn delete_profile(&self, id: &RecordId) -> Result<Profile> {
        let _gate = self.gate.write();
        let profile = self.integrity().delete_profile(id)?;
        self.events.record_deleted(&profile);
        self.committed();
        Ok(profile)
    }

    // --- Follower Graph ---

    /// `subscriber_id` follows `target_id`. Returns the updated target.
    pub fn subscribe(&self, subscriber_id: &RecordId, target_id: &RecordId) -> Result<User> {
        let _gate = self.gate.write();
        let target = self.graph().subscribe(subscriber_id, target_id)?;
        self.events.followed(subscriber_id, target_id);
        self.events.record_updated(&target);
        self.committed();
        Ok(target)
    }

    /// `subscriber_id` stops following `target_id`. Returns the updated
    /// target.
    pub fn unsubscribe(&self, subscriber_id: &RecordId, target_id: &RecordId) -> Result<User> {
        let _gate = self.gate.write();
        let target = self.graph().unsubscribe(subscriber_id, target_id)?;
        self.events.unfollowed(subscriber_id, target_id);
        self.events.record_updated(&target);
        self.committed();
        Ok(target)
    }

    pub fn edge(&self, subscriber_id: &RecordId, target_id: &RecordId) -> Result<EdgeState> {
        let _gate = self.gate.read();
        self.graph().edge(subscriber_id, target_id)
    }

    /// Ids of the users following `user_id`.
    pub fn followers(&self, user_id: &RecordId) -> Result<Vec<RecordId>> {
        let _gate = self.gate.read();
        self.graph().followers(user_id)
    }

    /// Users that `user_id` follows.
    pub fn following(&self, user_id: &RecordId) -> Vec<User> {
        let _gate = self.gate.read();
        self.graph().following(user_id)
    }

    // --- Maintenance ---

    pub fn stats(&self) -> StoreStats {
        let _gate = self.gate.read();
        StoreStats {
            user_count: self.store.users().len(),
            post_count: self.store.posts().len(),
            profile_count: self.store.profiles().len(),
            member_type_count: self.store.member_types().len(),
        }
    }

    /// Write a snapshot to `config.path`. No-op for in-memory databases and
    /// for databases that do not hold the directory lock.
    pub fn flush(&self) -> Result<()> {
        let _gate = self.gate.read();
        self.write_snapshot()
    }

    fn committed(&self) {
        if !self.config.flush_on_write {
            return;
        }
        if let Err(e) = self.write_snapshot() {
            warn!(error = %e, "snapshot after write failed; change kept in memory");
        }
    }

    fn write_snapshot(&self) -> Result<()> {
        let (Some(path), Some(_)) = (&self.config.path, &self.lock_file) else {
            return Ok(());
        };

        let snapshot = Snapshot::capture(&self.store);
        snapshot.write_to(&path.join(SNAPSHOT_FILE))?;
        debug!(records = snapshot.record_count(), "wrote snapshot");
        Ok(())
    }
}

impl<S: RecordStore> Drop for Database<S> {
    fn drop(&mut self) {
        // Best-effort flush on drop
        if let Err(e) = self.write_snapshot() {
            warn!(error = %e, "final snapshot failed");
        }
    }
}
