//! Identifier management using string interning for efficient string storage and comparison
//!
//! This module provides the [`Id`] type with an efficient string-interner based approach.
//! Node ids, hierarchy ids, level ids and edge type discriminators are all [`Id`]s, which
//! keeps element keys `Copy` and cheap to hash.

use std::{
    cmp::Ordering,
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for efficient identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock")
}

/// Efficient identifier type using string interning
///
/// Equality and hashing work on the interned symbol. Ordering is lexical on the
/// underlying string so that anything sorted by [`Id`] is reproducible across
/// runs, regardless of the order in which strings were first interned.
///
/// # Examples
///
/// ```
/// use strata_core::identifier::Id;
///
/// let node = Id::new("n1");
/// let same: Id = "n1".into();
///
/// assert_eq!(node, same);
/// assert_eq!(node, "n1");
/// assert!(Id::new("a") < Id::new("b"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::identifier::Id;
    ///
    /// let hierarchy = Id::new("hierarchy1");
    /// let edge_type = Id::new("structural");
    /// ```
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Creates an `Id` derived from this one by appending `suffix` with a '/' separator.
    ///
    /// Used for identifiers synthesised from an existing one, such as the
    /// placeholder id of a child node created under a parent.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::identifier::Id;
    ///
    /// let parent = Id::new("topic");
    /// assert_eq!(parent.derive("child"), "topic/child");
    /// ```
    pub fn derive(&self, suffix: &str) -> Self {
        let mut interner = interner();
        let base = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner")
            .to_string();
        Self(interner.get_or_intern(format!("{base}/{suffix}")))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let str_value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        write!(f, "{str_value}")
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        let interner = interner();
        let lhs = interner.resolve(self.0).expect("Symbol should exist in interner");
        let rhs = interner.resolve(other.0).expect("Symbol should exist in interner");
        lhs.cmp(rhs)
    }
}

impl std::str::FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    /// Creates an `Id` from a string slice
    ///
    /// This is a convenience implementation that calls `Id::new`.
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Id {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "string"`
    fn eq(&self, other: &str) -> bool {
        let interner = interner();
        let self_str = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        self_str == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let id1 = Id::new("concept");
        let id2 = Id::new("concept");
        let id3 = Id::new("example");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "concept");
    }

    #[test]
    fn test_derive() {
        let parent = Id::new("root");
        let child = parent.derive("1");

        assert_eq!(child, "root/1");
        assert_eq!(child.derive("2"), "root/1/2");
    }

    #[test]
    fn test_ordering_is_lexical() {
        // Intern in reverse order so symbol order and string order disagree.
        let z = Id::new("zz-ordering");
        let a = Id::new("aa-ordering");

        assert!(a < z);
        assert_eq!(a.cmp(&a), Ordering::Equal);

        let mut ids = vec![z, a];
        ids.sort();
        assert_eq!(ids, vec![a, z]);
    }

    #[test]
    fn test_display_trait() {
        let id = Id::new("display_test");
        assert_eq!(format!("{id}"), "display_test");
    }

    #[test]
    fn test_hash_and_eq() {
        use std::collections::HashMap;

        let id1 = Id::new("key1");
        let id2 = Id::new("key1");
        let id3 = Id::new("key2");

        let mut map = HashMap::new();
        map.insert(id1, "value1");
        map.insert(id3, "value2");

        assert_eq!(map.get(&id2), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_partial_eq_str() {
        let id = Id::new("n1");

        assert!(id == "n1");
        assert!(id != "n2");

        let empty = Id::new("");
        assert!(empty == "");
    }

    #[test]
    fn test_serde_as_plain_string() {
        let id = Id::new("serde-node");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"serde-node\"");

        let back: Id = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
