//! Single-field predicates over stored records.
//!
//! Exactly two predicate shapes exist: equality on a field, and membership
//! of a value inside a list-valued field. Every lookup the integrity and
//! follower-graph logic performs is expressed with one of them.

mod predicate;

pub use predicate::{filter, FieldRef, Predicate, Value};
