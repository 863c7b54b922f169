use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of subscription target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TopicKind {
    Table,
    Restaurant,
    User,
}

impl TopicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicKind::Table => "table",
            TopicKind::Restaurant => "restaurant",
            TopicKind::User => "user",
        }
    }
}

/// A real-time subscription target, unique per (kind, id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Topic {
    Table(String),
    Restaurant(String),
    User(String),
}

impl Topic {
    pub fn table(id: impl Into<String>) -> Self {
        Topic::Table(id.into())
    }

    pub fn restaurant(id: impl Into<String>) -> Self {
        Topic::Restaurant(id.into())
    }

    pub fn user(id: impl Into<String>) -> Self {
        Topic::User(id.into())
    }

    pub fn kind(&self) -> TopicKind {
        match self {
            Topic::Table(_) => TopicKind::Table,
            Topic::Restaurant(_) => TopicKind::Restaurant,
            Topic::User(_) => TopicKind::User,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Topic::Table(id) | Topic::Restaurant(id) | Topic::User(id) => id,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind().as_str(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_topic_identity_is_kind_and_id() {
        let mut topics = HashSet::new();
        topics.insert(Topic::table("42"));
        topics.insert(Topic::table("42"));
        topics.insert(Topic::restaurant("42"));

        assert_eq!(topics.len(), 2);
    }

    #[test]
    fn test_topic_display() {
        assert_eq!(Topic::user("u-7").to_string(), "user:u-7");
        assert_eq!(Topic::table("5").kind(), TopicKind::Table);
        assert_eq!(Topic::table("5").id(), "5");
    }

    #[test]
    fn test_topic_serialization_shape() {
        let json = serde_json::to_value(Topic::restaurant("3")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "restaurant", "id": "3"}));
    }
}
