//! Sass maps.

use std::slice::Iter;
use std::vec::IntoIter;

use crate::value::{ListSeparator, Value};

/// An insertion-ordered mapping from [`Value`] to [`Value`].
///
/// Keys compare with Sass value equality, so `1in` and `96px` are the same
/// key.  Equality between maps ignores insertion order.
#[derive(Debug, Clone, Default)]
pub struct SassMap(Vec<(Value, Value)>);

impl SassMap {
    pub const fn new() -> SassMap {
        SassMap(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &Value) {
        self.0.retain(|(k, _)| k != key);
    }

    pub fn merge(&mut self, other: SassMap) {
        for (key, value) in other {
            self.insert(key, value);
        }
    }

    pub fn iter(&self) -> Iter<'_, (Value, Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    /// Views the map as a list of `(key value)` pairs.
    pub fn as_list(&self) -> Vec<Value> {
        self.0
            .iter()
            .map(|(k, v)| Value::List {
                elements: vec![k.clone(), v.clone()],
                separator: ListSeparator::Space,
                bracketed: false,
            })
            .collect()
    }

    /// Inserts `value` under `key`, replacing any existing binding.
    /// Returns true if the key already existed.
    pub fn insert(&mut self, key: Value, value: Value) -> bool {
        for (k, v) in &mut self.0 {
            if *k == key {
                *v = value;
                return true;
            }
        }
        self.0.push((key, value));
        false
    }
}

impl PartialEq for SassMap {
    fn eq(&self, other: &SassMap) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| ov == v))
    }
}

impl IntoIterator for SassMap {
    type Item = (Value, Value);
    type IntoIter = IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(Value, Value)> for SassMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> SassMap {
        let mut map = SassMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SassNumber;

    #[test]
    fn insert_replaces_equal_key() {
        let mut map = SassMap::new();
        map.insert(
            Value::Number(SassNumber::with_unit(1.0, "in")),
            Value::test_string("a"),
        );
        let replaced = map.insert(
            Value::Number(SassNumber::with_unit(96.0, "px")),
            Value::test_string("b"),
        );
        assert!(replaced);
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get(&Value::Number(SassNumber::with_unit(1.0, "in"))),
            Some(&Value::test_string("b"))
        );
    }

    #[test]
    fn equality_ignores_order() {
        let a: SassMap = vec![
            (Value::test_string("x"), Value::test_string("1")),
            (Value::test_string("y"), Value::test_string("2")),
        ]
        .into_iter()
        .collect();
        let b: SassMap = vec![
            (Value::test_string("y"), Value::test_string("2")),
            (Value::test_string("x"), Value::test_string("1")),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);
    }
}
