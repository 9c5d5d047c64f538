//! Referential integrity on top of a [`RecordStore`](crate::collection::RecordStore).
//!
//! Creation checks that owners and member types exist and that a user has
//! at most one profile. Deleting a user cascades into follower lists, posts
//! and the profile. Every check runs before the first write; only the
//! user-deletion cascade can stop half way, and nothing is rolled back.

mod controller;

pub use controller::{IntegrityController, PostCascade, UserRemoval};
