//! Predicate evaluation.

use crate::types::{Record, RecordId};
use serde::{Deserialize, Serialize};

/// Borrowed view of a record field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldRef<'a> {
    Text(&'a str),
    Int(i64),
    Float(f64),
    List(&'a [RecordId]),
}

/// Target value of a predicate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&RecordId> for Value {
    fn from(id: &RecordId) -> Self {
        Value::Text(id.0.clone())
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        Value::Text(id.0)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

/// A filter over exactly one record field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
    /// `record[key] == equals`.
    Equals { key: String, equals: Value },
    /// `record[key]` is a list containing `in_array`.
    InArray {
        key: String,
        #[serde(rename = "inArray")]
        in_array: Value,
    },
}

impl Predicate {
    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Equals {
            key: key.into(),
            equals: value.into(),
        }
    }

    pub fn in_array(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::InArray {
            key: key.into(),
            in_array: value.into(),
        }
    }

    /// Equality on the `id` field.
    pub fn id(id: &RecordId) -> Self {
        Self::equals(crate::types::fields::ID, id)
    }

    pub fn key(&self) -> &str {
        match self {
            Predicate::Equals { key, .. } | Predicate::InArray { key, .. } => key,
        }
    }

    /// Evaluate against a record. A missing field never matches.
    pub fn matches<T: Record>(&self, record: &T) -> bool {
        let Some(field) = record.field(self.key()) else {
            return false;
        };

        match self {
            Predicate::Equals { equals, .. } => scalar_eq(field, equals),
            Predicate::InArray { in_array, .. } => match (field, in_array) {
                (FieldRef::List(items), Value::Text(target)) => {
                    items.iter().any(|item| item.as_str() == target)
                }
                _ => false,
            },
        }
    }
}

fn scalar_eq(field: FieldRef<'_>, value: &Value) -> bool {
    match (field, value) {
        (FieldRef::Text(a), Value::Text(b)) => a == b,
        (FieldRef::Int(a), Value::Int(b)) => a == *b,
        (FieldRef::Float(a), Value::Float(b)) => a == *b,
        (FieldRef::Int(a), Value::Float(b)) => (a as f64) == *b,
        (FieldRef::Float(a), Value::Int(b)) => a == (*b as f64),
        _ => false,
    }
}

/// Keep the records matching `predicate`, in store order.
/// `None` keeps everything.
pub fn filter<'a, T, I>(records: I, predicate: Option<&Predicate>) -> Vec<T>
where
    T: Record,
    I: IntoIterator<Item = &'a T>,
{
    records
        .into_iter()
        .filter(|r| predicate.map_or(true, |p| p.matches(*r)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemberType, Post, User};

    fn user(id: &str, followers: &[&str]) -> User {
        User {
            id: id.into(),
            first_name: "first".into(),
            last_name: "last".into(),
            email: format!("{}@example.com", id),
            subscribed_to_user_ids: followers.iter().map(|f| RecordId::from(*f)).collect(),
        }
    }

    #[test]
    fn test_equals_on_text() {
        let post = Post {
            id: "p1".into(),
            user_id: "u1".into(),
            ..Default::default()
        };

        assert!(Predicate::equals("userId", "u1").matches(&post));
        assert!(!Predicate::equals("userId", "u2").matches(&post));
    }

    #[test]
    fn test_equals_on_numbers() {
        let basic = MemberType::new("basic", 0.0, 20);

        assert!(Predicate::equals("monthPostsLimited", 20i64).matches(&basic));
        assert!(Predicate::equals("discount", 0i64).matches(&basic));
        assert!(!Predicate::equals("discount", "0").matches(&basic));
    }

    #[test]
    fn test_in_array() {
        let u = user("u1", &["a", "b"]);

        assert!(Predicate::in_array("subscribedToUserIds", "a").matches(&u));
        assert!(!Predicate::in_array("subscribedToUserIds", "c").matches(&u));
    }

    #[test]
    fn test_in_array_on_scalar_field_never_matches() {
        let u = user("u1", &[]);
        assert!(!Predicate::in_array("email", "u1@example.com").matches(&u));
    }

    #[test]
    fn test_equals_on_list_field_never_matches() {
        let u = user("u1", &["a"]);
        assert!(!Predicate::equals("subscribedToUserIds", "a").matches(&u));
    }

    #[test]
    fn test_missing_field_is_non_match() {
        let u = user("u1", &[]);
        assert!(!Predicate::equals("nickname", "x").matches(&u));
        assert!(!Predicate::in_array("nickname", "x").matches(&u));
    }

    #[test]
    fn test_filter_preserves_order() {
        let users = vec![user("u1", &["x"]), user("u2", &[]), user("u3", &["x"])];

        let hits = filter(&users, Some(&Predicate::in_array("subscribedToUserIds", "x")));
        let ids: Vec<&str> = hits.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u3"]);

        assert_eq!(filter(&users, None).len(), 3);
    }

    #[test]
    fn test_predicate_wire_shape() {
        let p: Predicate = serde_json::from_str(r#"{"key":"id","equals":"u1"}"#).unwrap();
        assert_eq!(p, Predicate::equals("id", "u1"));

        let p: Predicate =
            serde_json::from_str(r#"{"key":"subscribedToUserIds","inArray":"u1"}"#).unwrap();
        assert_eq!(p, Predicate::in_array("subscribedToUserIds", "u1"));
    }
}
