//! Error handling and edge case tests.

use relstore::{
    Database, EntityKind, NewPost, NewProfile, NewUser, PostPatch, RecordId, StoreError,
    WatchConfig,
};

fn db_with_user() -> (Database, RecordId) {
    let db = Database::in_memory();
    let user = db
        .create_user(NewUser::new("Ada", "Lovelace", "ada@example.com"))
        .unwrap();
    (db, user.id)
}

// --- Reference Errors ---

#[test]
fn test_post_with_unknown_owner() {
    let (db, _) = db_with_user();
    let before = db.stats();

    let result = db.create_post(NewPost::new("nobody", "t", "c"));
    assert!(matches!(
        result,
        Err(StoreError::InvalidReference {
            kind: EntityKind::User,
            ..
        })
    ));
    assert_eq!(db.stats(), before);
}

#[test]
fn test_post_with_empty_owner() {
    let (db, _) = db_with_user();

    let result = db.create_post(NewPost::new("", "t", "c"));
    assert!(matches!(result, Err(StoreError::InvalidReference { .. })));
    assert!(db.list_posts().is_empty());
}

#[test]
fn test_profile_with_unknown_owner() {
    let (db, _) = db_with_user();
    let before = db.stats();

    let result = db.create_profile(NewProfile::new("nobody", "basic"));
    assert!(matches!(
        result,
        Err(StoreError::InvalidReference {
            kind: EntityKind::User,
            ..
        })
    ));
    assert_eq!(db.stats(), before);
}

#[test]
fn test_profile_with_unknown_member_type() {
    let (db, user) = db_with_user();

    let result = db.create_profile(NewProfile::new(&user, "gold"));
    assert!(matches!(
        result,
        Err(StoreError::InvalidReference {
            kind: EntityKind::MemberType,
            ..
        })
    ));
    assert!(db.list_profiles().is_empty());
}

// --- Missing Subjects ---

#[test]
fn test_delete_unknown_records() {
    let (db, _) = db_with_user();
    let ghost = RecordId::from("ghost");

    assert!(matches!(
        db.delete_user(&ghost),
        Err(StoreError::NotFound {
            kind: EntityKind::User,
            ..
        })
    ));
    assert!(matches!(
        db.delete_post(&ghost),
        Err(StoreError::NotFound {
            kind: EntityKind::Post,
            ..
        })
    ));
    assert!(matches!(
        db.delete_profile(&ghost),
        Err(StoreError::NotFound {
            kind: EntityKind::Profile,
            ..
        })
    ));
}

#[test]
fn test_update_unknown_record() {
    let (db, _) = db_with_user();

    let result = db.update_post(&"ghost".into(), PostPatch::default());
    assert!(matches!(
        result,
        Err(StoreError::NotFound {
            kind: EntityKind::Post,
            ..
        })
    ));
}

#[test]
fn test_update_post_owner_is_not_checked() {
    let (db, user) = db_with_user();
    let post = db.create_post(NewPost::new(&user, "t", "c")).unwrap();

    let moved = db
        .update_post(
            &post.id,
            PostPatch {
                user_id: Some("ghost".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(moved.user_id, RecordId::from("ghost"));
}

// --- Follower Graph Errors ---

#[test]
fn test_subscribe_to_unknown_user() {
    let (db, user) = db_with_user();

    assert!(matches!(
        db.subscribe(&user, &"ghost".into()),
        Err(StoreError::NotFound {
            kind: EntityKind::User,
            ..
        })
    ));
}

#[test]
fn test_unsubscribe_without_edge_leaves_followers() {
    let db = Database::in_memory();
    let a = db.create_user(NewUser::new("a", "", "")).unwrap();
    let b = db.create_user(NewUser::new("b", "", "")).unwrap();
    let c = db.create_user(NewUser::new("c", "", "")).unwrap();
    db.subscribe(&c.id, &b.id).unwrap();

    let handle = db.watch(WatchConfig::default());
    let result = db.unsubscribe(&a.id, &b.id);

    assert!(matches!(result, Err(StoreError::InvalidState(_))));
    assert_eq!(db.followers(&b.id).unwrap(), vec![c.id]);
    assert!(handle.drain().is_empty());
}

#[test]
fn test_unsubscribe_from_unknown_user() {
    let (db, user) = db_with_user();

    assert!(matches!(
        db.unsubscribe(&user, &"ghost".into()),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn test_error_messages() {
    let err = StoreError::NotFound {
        kind: EntityKind::Profile,
        id: "p1".into(),
    };
    assert_eq!(err.to_string(), "Profile not found: p1");

    let err = StoreError::InvalidReference {
        kind: EntityKind::MemberType,
        id: "gold".into(),
    };
    assert!(err.to_string().contains("MemberType"));
}
