//! Core types for the relational store.

use crate::query::FieldRef;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque record identifier, assigned by the store on creation.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        RecordId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

impl From<&RecordId> for RecordId {
    fn from(id: &RecordId) -> Self {
        id.clone()
    }
}

/// The four entity kinds held by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Post,
    Profile,
    MemberType,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Post,
        EntityKind::Profile,
        EntityKind::MemberType,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "User",
            EntityKind::Post => "Post",
            EntityKind::Profile => "Profile",
            EntityKind::MemberType => "MemberType",
        };
        f.write_str(name)
    }
}

/// A record that can live in a [`Collection`](crate::collection::Collection).
pub trait Record: Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Partial update applied by `update`; `None` fields are retained.
    type Patch: Clone + fmt::Debug + Default + Send;

    const KIND: EntityKind;

    fn id(&self) -> &RecordId;

    fn set_id(&mut self, id: RecordId);

    /// Look up a field by its wire name. Unknown names yield `None`.
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;

    /// Overwrite every field the patch carries.
    fn apply_patch(&mut self, patch: Self::Patch);
}

/// A record that references an owning [`User`].
pub trait Owned: Record {
    fn owner_id(&self) -> &RecordId;
}

/// Field names shared between the wire format and predicates.
pub mod fields {
    pub const ID: &str = "id";
    pub const USER_ID: &str = "userId";
    pub const MEMBER_TYPE_ID: &str = "memberTypeId";
    pub const SUBSCRIBED_TO_USER_IDS: &str = "subscribedToUserIds";
}

// --- Users ---

/// A user account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    /// Ids of the users subscribed *to* this user.
    ///
    /// Despite the name this is a followers list: `subscribe(a, b)` stores
    /// `a` here on `b`. Kept under this name because clients read it.
    #[serde(default)]
    pub subscribed_to_user_ids: Vec<RecordId>,
}

impl User {
    pub fn is_followed_by(&self, id: &RecordId) -> bool {
        self.subscribed_to_user_ids.contains(id)
    }
}

/// Input for creating a user.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    pub(crate) fn into_record(self) -> User {
        User {
            id: RecordId::default(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            subscribed_to_user_ids: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl Record for User {
    type Patch = UserPatch;

    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            fields::ID => Some(FieldRef::Text(self.id.as_str())),
            "firstName" => Some(FieldRef::Text(&self.first_name)),
            "lastName" => Some(FieldRef::Text(&self.last_name)),
            "email" => Some(FieldRef::Text(&self.email)),
            fields::SUBSCRIBED_TO_USER_IDS => Some(FieldRef::List(&self.subscribed_to_user_ids)),
            _ => None,
        }
    }

    fn apply_patch(&mut self, patch: UserPatch) {
        if let Some(v) = patch.first_name {
            self.first_name = v;
        }
        if let Some(v) = patch.last_name {
            self.last_name = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
    }
}

// --- Posts ---

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    pub user_id: RecordId,
}

/// Input for creating a post owned by `user_id`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: RecordId,
}

impl NewPost {
    pub fn new(
        user_id: impl Into<RecordId>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user_id: user_id.into(),
        }
    }

    pub(crate) fn into_record(self) -> Post {
        Post {
            id: RecordId::default(),
            title: self.title,
            content: self.content,
            user_id: self.user_id,
        }
    }
}

/// Partial post update. Changing `user_id` is not re-validated.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub user_id: Option<RecordId>,
}

impl Record for Post {
    type Patch = PostPatch;

    const KIND: EntityKind = EntityKind::Post;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            fields::ID => Some(FieldRef::Text(self.id.as_str())),
            "title" => Some(FieldRef::Text(&self.title)),
            "content" => Some(FieldRef::Text(&self.content)),
            fields::USER_ID => Some(FieldRef::Text(self.user_id.as_str())),
            _ => None,
        }
    }

    fn apply_patch(&mut self, patch: PostPatch) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.content {
            self.content = v;
        }
        if let Some(v) = patch.user_id {
            self.user_id = v;
        }
    }
}

impl Owned for Post {
    fn owner_id(&self) -> &RecordId {
        &self.user_id
    }
}

// --- Profiles ---

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: RecordId,
    pub avatar: String,
    pub sex: String,
    pub birthday: i64,
    pub country: String,
    pub street: String,
    pub city: String,
    pub member_type_id: RecordId,
    pub user_id: RecordId,
}

/// Input for creating the profile of `user_id`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub avatar: String,
    pub sex: String,
    pub birthday: i64,
    pub country: String,
    pub street: String,
    pub city: String,
    pub member_type_id: RecordId,
    pub user_id: RecordId,
}

impl NewProfile {
    /// Profile with empty content fields.
    pub fn new(user_id: impl Into<RecordId>, member_type_id: impl Into<RecordId>) -> Self {
        Self {
            user_id: user_id.into(),
            member_type_id: member_type_id.into(),
            ..Default::default()
        }
    }

    pub(crate) fn into_record(self) -> Profile {
        Profile {
            id: RecordId::default(),
            avatar: self.avatar,
            sex: self.sex,
            birthday: self.birthday,
            country: self.country,
            street: self.street,
            city: self.city,
            member_type_id: self.member_type_id,
            user_id: self.user_id,
        }
    }
}

/// Partial profile update. References are not re-validated.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub avatar: Option<String>,
    pub sex: Option<String>,
    pub birthday: Option<i64>,
    pub country: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub member_type_id: Option<RecordId>,
}

impl Record for Profile {
    type Patch = ProfilePatch;

    const KIND: EntityKind = EntityKind::Profile;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            fields::ID => Some(FieldRef::Text(self.id.as_str())),
            "avatar" => Some(FieldRef::Text(&self.avatar)),
            "sex" => Some(FieldRef::Text(&self.sex)),
            "birthday" => Some(FieldRef::Int(self.birthday)),
            "country" => Some(FieldRef::Text(&self.country)),
            "street" => Some(FieldRef::Text(&self.street)),
            "city" => Some(FieldRef::Text(&self.city)),
            fields::MEMBER_TYPE_ID => Some(FieldRef::Text(self.member_type_id.as_str())),
            fields::USER_ID => Some(FieldRef::Text(self.user_id.as_str())),
            _ => None,
        }
    }

    fn apply_patch(&mut self, patch: ProfilePatch) {
        if let Some(v) = patch.avatar {
            self.avatar = v;
        }
        if let Some(v) = patch.sex {
            self.sex = v;
        }
        if let Some(v) = patch.birthday {
            self.birthday = v;
        }
        if let Some(v) = patch.country {
            self.country = v;
        }
        if let Some(v) = patch.street {
            self.street = v;
        }
        if let Some(v) = patch.city {
            self.city = v;
        }
        if let Some(v) = patch.member_type_id {
            self.member_type_id = v;
        }
    }
}

impl Owned for Profile {
    fn owner_id(&self) -> &RecordId {
        &self.user_id
    }
}

// --- Member types ---

/// Static reference data, seeded when a database is created.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberType {
    pub id: RecordId,
    pub discount: f64,
    pub month_posts_limited: i64,
}

impl MemberType {
    pub fn new(id: impl Into<RecordId>, discount: f64, month_posts_limited: i64) -> Self {
        Self {
            id: id.into(),
            discount,
            month_posts_limited,
        }
    }

    /// The member types every new database starts with.
    pub fn defaults() -> Vec<MemberType> {
        vec![
            MemberType::new("basic", 0.0, 20),
            MemberType::new("business", 5.0, 100),
        ]
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTypePatch {
    pub discount: Option<f64>,
    pub month_posts_limited: Option<i64>,
}

impl Record for MemberType {
    type Patch = MemberTypePatch;

    const KIND: EntityKind = EntityKind::MemberType;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            fields::ID => Some(FieldRef::Text(self.id.as_str())),
            "discount" => Some(FieldRef::Float(self.discount)),
            "monthPostsLimited" => Some(FieldRef::Int(self.month_posts_limited)),
            _ => None,
        }
    }

    fn apply_patch(&mut self, patch: MemberTypePatch) {
        if let Some(v) = patch.discount {
            self.discount = v;
        }
        if let Some(v) = patch.month_posts_limited {
            self.month_posts_limited = v;
        }
    }
}

// --- Kind-tagged forms ---

/// A patch tagged with the kind of record it applies to.
#[derive(Clone, Debug)]
pub enum RecordPatch {
    User(UserPatch),
    Post(PostPatch),
    Profile(ProfilePatch),
    MemberType(MemberTypePatch),
}

impl RecordPatch {
    pub fn kind(&self) -> EntityKind {
        match self {
            RecordPatch::User(_) => EntityKind::User,
            RecordPatch::Post(_) => EntityKind::Post,
            RecordPatch::Profile(_) => EntityKind::Profile,
            RecordPatch::MemberType(_) => EntityKind::MemberType,
        }
    }
}

/// A record of any kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnyRecord {
    User(User),
    Post(Post),
    Profile(Profile),
    MemberType(MemberType),
}

impl AnyRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            AnyRecord::User(_) => EntityKind::User,
            AnyRecord::Post(_) => EntityKind::Post,
            AnyRecord::Profile(_) => EntityKind::Profile,
            AnyRecord::MemberType(_) => EntityKind::MemberType,
        }
    }

    pub fn id(&self) -> &RecordId {
        match self {
            AnyRecord::User(r) => &r.id,
            AnyRecord::Post(r) => &r.id,
            AnyRecord::Profile(r) => &r.id,
            AnyRecord::MemberType(r) => &r.id,
        }
    }
}

/// Store statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub user_count: usize,
    pub post_count: usize,
    pub profile_count: usize,
    pub member_type_count: usize,
}
