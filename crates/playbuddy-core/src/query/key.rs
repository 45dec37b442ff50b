//! Structured cache keys and the filters that select them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One element of a [`QueryKey`].
///
/// Keys mirror the array keys used by the apps: a resource name followed by
/// ids or a parameter object such as `{"includeAll": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    /// An optional id that is not known yet (renders as `null`)
    Missing,
    Flag(bool),
    Number(i64),
    Text(String),
    Params(BTreeMap<String, KeyPart>),
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Text(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Text(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        KeyPart::Text(value.clone())
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Number(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Number(value.into())
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Flag(value)
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(value: Option<T>) -> Self {
        value.map_or(KeyPart::Missing, Into::into)
    }
}

/// Ordered sequence of [`KeyPart`]s addressing one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    /// Start a key with its resource name.
    pub fn new(resource: impl Into<String>) -> Self {
        Self(vec![KeyPart::Text(resource.into())])
    }

    pub fn from_parts(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    /// Append one part.
    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    /// Append a parameter object. Parameter order does not matter.
    pub fn with_params<K, V, I>(mut self, params: I) -> Self
    where
        K: Into<String>,
        V: Into<KeyPart>,
        I: IntoIterator<Item = (K, V)>,
    {
        let map = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.0.push(KeyPart::Params(map));
        self
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Resource name, if the key starts with one.
    pub fn resource(&self) -> Option<&str> {
        match self.0.first() {
            Some(KeyPart::Text(name)) => Some(name),
            _ => None,
        }
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl From<&str> for QueryKey {
    fn from(resource: &str) -> Self {
        QueryKey::new(resource)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// Selects cache entries for invalidation or removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Only the entry stored under exactly this key
    Exact(QueryKey),
    /// Every entry whose key begins with these parts
    Prefix(QueryKey),
    All,
}

impl QueryFilter {
    pub fn exact(key: impl Into<QueryKey>) -> Self {
        QueryFilter::Exact(key.into())
    }

    pub fn prefix(key: impl Into<QueryKey>) -> Self {
        QueryFilter::Prefix(key.into())
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            QueryFilter::Exact(target) => target == key,
            QueryFilter::Prefix(prefix) => key.starts_with(prefix),
            QueryFilter::All => true,
        }
    }
}

/// Resource names convert to prefix filters, so `"events"` covers every
/// parameterized events query.
impl From<&str> for QueryFilter {
    fn from(resource: &str) -> Self {
        QueryFilter::Prefix(QueryKey::new(resource))
    }
}

impl From<QueryKey> for QueryFilter {
    fn from(key: QueryKey) -> Self {
        QueryFilter::Prefix(key)
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryFilter::Exact(key) => write!(f, "exact {key}"),
            QueryFilter::Prefix(key) => write!(f, "prefix {key}"),
            QueryFilter::All => f.write_str("all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_renders_as_json_array() {
        let key = QueryKey::new("import_sources").with_params([("includeAll", true)]);
        assert_eq!(key.to_string(), r#"["import_sources",{"includeAll":true}]"#);

        let key = QueryKey::new("buddies").with(None::<String>);
        assert_eq!(key.to_string(), r#"["buddies",null]"#);
    }

    #[test]
    fn test_key_roundtrips_through_json() {
        let key = QueryKey::new("buddyWishlist")
            .with("user-1")
            .with(42)
            .with_params([("q", "rope")]);
        let json = serde_json::to_string(&key).unwrap();
        let back: QueryKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_param_order_is_irrelevant() {
        let a = QueryKey::new("events").with_params([("a", 1), ("b", 2)]);
        let b = QueryKey::new("events").with_params([("b", 2), ("a", 1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_parts_same_key() {
        assert_eq!(QueryKey::new("kinks"), QueryKey::from("kinks"));
        assert_ne!(
            QueryKey::new("import_sources").with_params([("includeAll", true)]),
            QueryKey::new("import_sources").with_params([("includeAll", false)])
        );
    }

    #[test]
    fn test_filters() {
        let events = QueryKey::new("events");
        let filtered = QueryKey::new("events").with_params([("page", 2)]);
        let organizers = QueryKey::new("organizers");

        let prefix = QueryFilter::from("events");
        assert!(prefix.matches(&events));
        assert!(prefix.matches(&filtered));
        assert!(!prefix.matches(&organizers));

        let exact = QueryFilter::exact(events.clone());
        assert!(exact.matches(&events));
        assert!(!exact.matches(&filtered));

        assert!(QueryFilter::All.matches(&organizers));
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(QueryKey::new("kinks").resource(), Some("kinks"));
        assert_eq!(QueryKey::from_parts(vec![KeyPart::Number(1)]).resource(), None);
    }
}
