use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Fold a key or literal for case-insensitive comparison.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Case-insensitive string equality.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// A set of route values keyed case-insensitively.
///
/// The original spelling of each key is preserved for display and
/// iteration; lookups ignore case. Iteration order is the folded key order,
/// which keeps generated query strings deterministic.
#[derive(Clone, Default)]
pub struct RouteValues {
    entries: BTreeMap<String, (String, String)>,
}

impl RouteValues {
    /// Create an empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any existing value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        self.entries
            .insert(fold_case(&key), (key, value.into()))
            .map(|(_, previous)| previous)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&fold_case(key)).map(|(_, v)| v.as_str())
    }

    /// Like [`RouteValues::get`], treating an empty value as missing.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold_case(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(&fold_case(key)).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, value)` pairs with the keys' original spelling.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.values(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    /// Copy every value of `other` into `self`, overwriting on conflict.
    pub fn merge(&mut self, other: &RouteValues) {
        for (key, value) in other {
            self.insert(key, value);
        }
    }
}

impl PartialEq for RouteValues {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((ka, (_, va)), (kb, (_, vb)))| ka == kb && va == vb)
    }
}

impl Eq for RouteValues {}

impl fmt::Debug for RouteValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over route values.
pub struct Iter<'a> {
    inner: btree_map::Values<'a, String, (String, String)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a RouteValues {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for RouteValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = RouteValues::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

impl Serialize for RouteValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RouteValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}
