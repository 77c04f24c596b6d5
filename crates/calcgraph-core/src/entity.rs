//! Entity kinds shared by the dependency checks

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of entity a pointer can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Constant,
    Calculation,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Constant => f.write_str("constant"),
            EntityKind::Calculation => f.write_str("calculation"),
        }
    }
}

/// Identity fields of an entity; frozen while it is referenced
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityFields {
    pub unique_id: String,
    pub unit: String,
}

impl IdentityFields {
    /// Name of the first field that differs from `other`
    pub fn first_difference(&self, other: &IdentityFields) -> Option<&'static str> {
        if self.unique_id != other.unique_id {
            Some("uniqueId")
        } else if self.unit != other.unit {
            Some("unit")
        } else {
            None
        }
    }
}
