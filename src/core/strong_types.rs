// Strong Types - newtypes for topic identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strongly-typed topic identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicId(pub i64);

impl TopicId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Identifiers issued by a graph are always positive.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TopicId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<TopicId> for i64 {
    fn from(id: TopicId) -> Self {
        id.0
    }
}

/// Addresses a topic either by identifier or by its colon-delimited unique key
/// (e.g. `Root:Web:About`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicLocator {
    Id(TopicId),
    UniqueKey(String),
}

impl fmt::Display for TopicLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicLocator::Id(id) => write!(f, "#{}", id),
            TopicLocator::UniqueKey(key) => write!(f, "{}", key),
        }
    }
}

impl From<TopicId> for TopicLocator {
    fn from(id: TopicId) -> Self {
        TopicLocator::Id(id)
    }
}

impl From<&str> for TopicLocator {
    fn from(key: &str) -> Self {
        TopicLocator::UniqueKey(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_id_roundtrip() {
        let id = TopicId::new(42);
        assert!(id.is_valid());
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
        assert!(!TopicId::new(0).is_valid());
    }

    #[test]
    fn test_locator_display() {
        assert_eq!(TopicLocator::from(TopicId::new(7)).to_string(), "#7");
        assert_eq!(TopicLocator::from("Root:Web").to_string(), "Root:Web");
    }
}
