use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed edge kinds emitted by the graph builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Describes,
    Contains,
    DependsOn,
}

impl RelationshipType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipType::Describes => "DESCRIBES",
            RelationshipType::Contains => "CONTAINS",
            RelationshipType::DependsOn => "DEPENDS_ON",
        }
    }

    /// Edges that carry reachability below a described package
    pub fn is_structural(self) -> bool {
        matches!(self, RelationshipType::Contains | RelationshipType::DependsOn)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed edge between two SPDX IDs of the same document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relationship {
    pub from: String,
    pub relationship_type: RelationshipType,
    pub to: String,
}

impl Relationship {
    pub fn new(from: impl Into<String>, relationship_type: RelationshipType, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            relationship_type,
            to: to.into(),
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.from, self.relationship_type, self.to)
    }
}
