//! Property tests: follower graph and integrity invariants hold for
//! arbitrary operation sequences.

use proptest::prelude::*;
use relstore::{
    fields, Database, NewPost, NewProfile, NewUser, Post, Predicate, RecordId, StoreError, User,
};

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum Op {
    Subscribe(usize, usize),
    Unsubscribe(usize, usize),
    Post(usize),
    Delete(usize),
}

fn arb_op(users: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..users, 0..users).prop_map(|(a, b)| Op::Subscribe(a, b)),
        2 => (0..users, 0..users).prop_map(|(a, b)| Op::Unsubscribe(a, b)),
        2 => (0..users).prop_map(Op::Post),
        1 => (0..users).prop_map(Op::Delete),
    ]
}

fn populate(db: &Database, count: usize) -> Vec<RecordId> {
    (0..count)
        .map(|i| {
            db.create_user(NewUser::new(format!("user{}", i), "", ""))
                .unwrap()
                .id
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn follower_lists_never_hold_duplicates(ops in prop::collection::vec(arb_op(5), 1..60)) {
        let db = Database::in_memory();
        let ids = populate(&db, 5);

        for op in ops {
            let _ = match op {
                Op::Subscribe(a, b) => db.subscribe(&ids[a], &ids[b]).map(|_| ()),
                Op::Unsubscribe(a, b) => db.unsubscribe(&ids[a], &ids[b]).map(|_| ()),
                Op::Post(a) => db.create_post(NewPost::new(&ids[a], "t", "")).map(|_| ()),
                Op::Delete(a) => db.delete_user(&ids[a]).map(|_| ()),
            };
        }

        for user in db.list_users() {
            let mut seen = user.subscribed_to_user_ids.clone();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), user.subscribed_to_user_ids.len());
        }
    }

    #[test]
    fn deleted_users_leave_no_follower_entries(ops in prop::collection::vec(arb_op(6), 1..60)) {
        let db = Database::in_memory();
        let ids = populate(&db, 6);

        for op in ops {
            match op {
                Op::Subscribe(a, b) => { let _ = db.subscribe(&ids[a], &ids[b]); }
                Op::Unsubscribe(a, b) => { let _ = db.unsubscribe(&ids[a], &ids[b]); }
                Op::Post(a) => { let _ = db.create_post(NewPost::new(&ids[a], "t", "")); }
                Op::Delete(a) => {
                    if db.delete_user(&ids[a]).is_ok() {
                        let holders = db.find::<User>(Some(&Predicate::in_array(
                            fields::SUBSCRIBED_TO_USER_IDS,
                            &ids[a],
                        )));
                        prop_assert!(holders.is_empty());
                        prop_assert!(db.get_user(&ids[a]).is_err());
                    }
                }
            }
        }
    }

    #[test]
    fn subscribe_is_idempotent(repeats in 1usize..5) {
        let db = Database::in_memory();
        let ids = populate(&db, 2);

        for _ in 0..repeats {
            db.subscribe(&ids[0], &ids[1]).unwrap();
        }

        let target = db.get_user(&ids[1]).unwrap();
        prop_assert_eq!(target.subscribed_to_user_ids, vec![ids[0].clone()]);
    }

    #[test]
    fn second_profile_always_conflicts(first in 0usize..2, second in 0usize..2) {
        let member_types = ["basic", "business"];
        let db = Database::in_memory();
        let ids = populate(&db, 1);

        db.create_profile(NewProfile::new(&ids[0], member_types[first])).unwrap();
        let result = db.create_profile(NewProfile::new(&ids[0], member_types[second]));

        prop_assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn user_deletion_removes_at_most_one_post(posts in 0usize..6) {
        let db = Database::in_memory();
        let ids = populate(&db, 1);
        for i in 0..posts {
            db.create_post(NewPost::new(&ids[0], format!("post{}", i), "")).unwrap();
        }

        let removal = db.delete_user(&ids[0]).unwrap();
        prop_assert_eq!(removal.posts.len(), posts.min(1));

        let left = db.find::<Post>(Some(&Predicate::equals(fields::USER_ID, &ids[0])));
        prop_assert_eq!(left.len(), posts.saturating_sub(1));
    }

    #[test]
    fn bad_owner_leaves_store_unchanged(owner in "[a-z]{0,12}") {
        let db = Database::in_memory();
        populate(&db, 2);
        let before = db.stats();

        let post = db.create_post(NewPost::new(owner.as_str(), "t", ""));
        let profile = db.create_profile(NewProfile::new(owner.as_str(), "basic"));

        prop_assert!(matches!(post, Err(StoreError::InvalidReference { .. })), "post: {:?}", post);
        prop_assert!(matches!(profile, Err(StoreError::InvalidReference { .. })), "profile: {:?}", profile);
        prop_assert_eq!(db.stats(), before);
    }
}
