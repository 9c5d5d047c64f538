//! Integrity controller.

use crate::collection::{Collection, CollectionFor, RecordStore};
use crate::error::{Result, StoreError};
use crate::graph::SubscriptionGraph;
use crate::query::Predicate;
use crate::types::{
    fields, EntityKind, MemberType, NewPost, NewProfile, NewUser, Owned, Post, Profile, Record,
    RecordId, User,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How many of a deleted user's posts the cascade removes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostCascade {
    /// Remove only the first post found, leaving any others in place.
    #[default]
    FirstOnly,
    /// Remove every post owned by the user.
    All,
}

/// What a user deletion removed or rewrote.
#[derive(Clone, Debug)]
pub struct UserRemoval {
    /// The deleted user record.
    pub user: User,
    /// Users whose follower list no longer holds the deleted user.
    pub unfollowed: Vec<User>,
    /// Posts removed with the user.
    pub posts: Vec<Post>,
    /// The user's profile, if there was one.
    pub profile: Option<Profile>,
}

/// Enforces references and cascades for one store.
///
/// Does no locking of its own; [`Database`](crate::Database) serializes
/// calls.
pub struct IntegrityController<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    post_cascade: PostCascade,
}

impl<'a, S: RecordStore + ?Sized> IntegrityController<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            post_cascade: PostCascade::default(),
        }
    }

    pub fn with_post_cascade(mut self, post_cascade: PostCascade) -> Self {
        self.post_cascade = post_cascade;
        self
    }

    // --- Creation ---

    /// Users carry no references, so this is a plain insert.
    pub fn create_user(&self, input: NewUser) -> Result<User> {
        let user = self.store.users().insert(input.into_record())?;
        debug!(id = %user.id, "created user");
        Ok(user)
    }

    /// Insert a post after checking that its owner exists.
    pub fn create_post(&self, input: NewPost) -> Result<Post> {
        self.require_reference::<User>(&input.user_id)?;

        let post = self.store.posts().insert(input.into_record())?;
        debug!(id = %post.id, owner = %post.user_id, "created post");
        Ok(post)
    }

    /// Insert a profile after checking its owner, its member type, and that
    /// the owner has no profile yet.
    pub fn create_profile(&self, input: NewProfile) -> Result<Profile> {
        self.require_reference::<User>(&input.user_id)?;
        self.require_reference::<MemberType>(&input.member_type_id)?;

        if self.profile_of(&input.user_id).is_some() {
            return Err(StoreError::Conflict(format!(
                "User {} already has a profile",
                input.user_id
            )));
        }

        let profile = self.store.profiles().insert(input.into_record())?;
        debug!(id = %profile.id, owner = %profile.user_id, "created profile");
        Ok(profile)
    }

    // --- Deletion ---

    /// Delete a user and everything that points at it.
    ///
    /// Steps run in order: follower lists, posts, profile, the user. A
    /// failure part way leaves the earlier steps applied.
    pub fn delete_user(&self, id: &RecordId) -> Result<UserRemoval> {
        if self.store.users().get(id).is_none() {
            return Err(StoreError::not_found(EntityKind::User, id));
        }

        let unfollowed = SubscriptionGraph::new(self.store).remove_user_from_all_follower_lists(id)?;

        let owned = self.store.posts().find_many(Some(&owner_is(id)));
        let take = match self.post_cascade {
            PostCascade::FirstOnly => owned.len().min(1),
            PostCascade::All => owned.len(),
        };
        let mut posts = Vec::with_capacity(take);
        for post in &owned[..take] {
            posts.push(self.store.posts().remove(&post.id)?);
        }
        if owned.len() > take {
            warn!(
                user = %id,
                remaining = owned.len() - take,
                "posts left behind by user deletion"
            );
        }

        let profile = match self.profile_of(id) {
            Some(profile) => Some(self.store.profiles().remove(&profile.id)?),
            None => None,
        };

        let user = self.store.users().remove(id)?;

        info!(
            user = %id,
            unfollowed = unfollowed.len(),
            posts = posts.len(),
            profile = profile.is_some(),
            "deleted user"
        );

        Ok(UserRemoval {
            user,
            unfollowed,
            posts,
            profile,
        })
    }

    /// Delete a post whose owner still exists.
    pub fn delete_post(&self, id: &RecordId) -> Result<Post> {
        self.delete_owned::<Post>(id)
    }

    /// Delete a profile whose owner still exists.
    pub fn delete_profile(&self, id: &RecordId) -> Result<Profile> {
        self.delete_owned::<Profile>(id)
    }

    // --- Update ---

    /// Overlay `patch` on the stored record and persist it.
    ///
    /// References changed by the patch are not re-validated.
    pub fn update<T: Record>(&self, id: &RecordId, patch: T::Patch) -> Result<T>
    where
        S: CollectionFor<T>,
    {
        let collection = <S as CollectionFor<T>>::collection(self.store);
        let mut record = collection
            .get(id)
            .ok_or_else(|| StoreError::not_found(T::KIND, id))?;

        record.apply_patch(patch);
        let updated = collection.replace(id, record)?;
        debug!(kind = %T::KIND, id = %id, "updated record");
        Ok(updated)
    }

    // --- Helpers ---

    fn delete_owned<T: Owned>(&self, id: &RecordId) -> Result<T>
    where
        S: CollectionFor<T>,
    {
        let collection = <S as CollectionFor<T>>::collection(self.store);
        let record = collection
            .get(id)
            .ok_or_else(|| StoreError::not_found(T::KIND, id))?;

        // An orphaned record is reported as missing.
        if self.store.users().get(record.owner_id()).is_none() {
            return Err(StoreError::not_found(T::KIND, id));
        }

        let removed = collection.remove(id)?;
        debug!(kind = %T::KIND, id = %id, "deleted record");
        Ok(removed)
    }

    fn require_reference<T: Record>(&self, id: &RecordId) -> Result<()>
    where
        S: CollectionFor<T>,
    {
        if id.is_empty() || <S as CollectionFor<T>>::collection(self.store).get(id).is_none() {
            return Err(StoreError::invalid_reference(T::KIND, id));
        }
        Ok(())
    }

    fn profile_of(&self, user_id: &RecordId) -> Option<Profile> {
        self.store.profiles().find_one(&owner_is(user_id))
    }
}

fn owner_is(user_id: &RecordId) -> Predicate {
    Predicate::equals(fields::USER_ID, user_id)
}
