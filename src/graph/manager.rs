//! Subscription graph manager.

use crate::collection::{Collection, RecordStore};
use crate::error::{Result, StoreError};
use crate::query::Predicate;
use crate::types::{fields, EntityKind, RecordId, User};
use tracing::debug;

/// State of a single `subscriber -> target` edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeState {
    Absent,
    Present,
}

/// Mutates the follower relation stored on user records.
///
/// Callers are expected to serialize mutations; see
/// [`Database`](crate::Database).
pub struct SubscriptionGraph<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> SubscriptionGraph<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Make `subscriber_id` a follower of `target_id`.
    ///
    /// Repeating the call leaves a single membership. The subscriber itself
    /// is not looked up, and subscribing to oneself is allowed.
    pub fn subscribe(&self, subscriber_id: &RecordId, target_id: &RecordId) -> Result<User> {
        let mut target = self.require_user(target_id)?;

        let mut followers = without(&target.subscribed_to_user_ids, subscriber_id);
        followers.push(subscriber_id.clone());
        target.subscribed_to_user_ids = followers;

        let updated = self.store.users().replace(target_id, target)?;
        debug!(subscriber = %subscriber_id, target = %target_id, "subscribed");
        Ok(updated)
    }

    /// Remove the edge `subscriber_id -> target_id`.
    ///
    /// Fails with `InvalidState` when the edge does not exist.
    pub fn unsubscribe(&self, subscriber_id: &RecordId, target_id: &RecordId) -> Result<User> {
        let mut target = self.require_user(target_id)?;

        if !target.is_followed_by(subscriber_id) {
            return Err(StoreError::InvalidState(format!(
                "{} is not subscribed to {}",
                subscriber_id, target_id
            )));
        }

        target.subscribed_to_user_ids = without(&target.subscribed_to_user_ids, subscriber_id);

        let updated = self.store.users().replace(target_id, target)?;
        debug!(subscriber = %subscriber_id, target = %target_id, "unsubscribed");
        Ok(updated)
    }

    /// Strip `user_id` from every follower list that holds it.
    ///
    /// Full scan over users. Returns the rewritten users.
    pub fn remove_user_from_all_follower_lists(&self, user_id: &RecordId) -> Result<Vec<User>> {
        let users = self.store.users();
        let followed = users.find_many(Some(&Predicate::in_array(
            fields::SUBSCRIBED_TO_USER_IDS,
            user_id,
        )));

        let mut rewritten = Vec::with_capacity(followed.len());
        for mut user in followed {
            user.subscribed_to_user_ids = without(&user.subscribed_to_user_ids, user_id);
            let id = user.id.clone();
            rewritten.push(users.replace(&id, user)?);
        }

        debug!(user = %user_id, rewritten = rewritten.len(), "removed from follower lists");
        Ok(rewritten)
    }

    /// Current state of the edge `subscriber_id -> target_id`.
    pub fn edge(&self, subscriber_id: &RecordId, target_id: &RecordId) -> Result<EdgeState> {
        let target = self.require_user(target_id)?;
        Ok(if target.is_followed_by(subscriber_id) {
            EdgeState::Present
        } else {
            EdgeState::Absent
        })
    }

    /// Ids of the users following `user_id`.
    pub fn followers(&self, user_id: &RecordId) -> Result<Vec<RecordId>> {
        Ok(self.require_user(user_id)?.subscribed_to_user_ids)
    }

    /// Users that `user_id` follows, in store order.
    pub fn following(&self, user_id: &RecordId) -> Vec<User> {
        self.store.users().find_many(Some(&Predicate::in_array(
            fields::SUBSCRIBED_TO_USER_IDS,
            user_id,
        )))
    }

    fn require_user(&self, id: &RecordId) -> Result<User> {
        self.store
            .users()
            .get(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::User, id))
    }
}

fn without(ids: &[RecordId], id: &RecordId) -> Vec<RecordId> {
    ids.iter().filter(|i| *i != id).cloned().collect()
}
