//! Follower graph between users.
//!
//! An edge `subscriber -> target` is stored on the target user, as the
//! subscriber's id inside `target.subscribed_to_user_ids`. There is no
//! separate edge table and no reverse index.

mod manager;

pub use manager::{EdgeState, SubscriptionGraph};
