//! Calculation definitions and their revisions

use crate::entity::IdentityFields;
use crate::pointer::Pointer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage id of one calculation row (one revision)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One stored revision of a calculation.
///
/// All revisions of a calculation share its `unique_id`. At most one of them
/// has `latest == true` and it carries the highest version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub id: RecordId,
    pub unique_id: String,
    pub version: u32,
    pub latest: bool,
    pub unit: String,
    pub expression: Vec<Pointer>,
    pub created_at: DateTime<Utc>,
}

impl Calculation {
    /// Pointers that reference other entities, in expression order
    pub fn references(&self) -> impl Iterator<Item = &Pointer> {
        self.expression
            .iter()
            .filter(|p| p.referenced_unique_id().is_some())
    }

    /// Check if any pointer references the given unique id
    pub fn references_unique_id(&self, unique_id: &str) -> bool {
        self.references()
            .any(|p| p.referenced_unique_id() == Some(unique_id))
    }

    /// Expression rendered with pointer labels, space separated
    pub fn display_expression(&self) -> String {
        self.expression
            .iter()
            .map(Pointer::display_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The editable content of this revision
    pub fn data(&self) -> CalculationData {
        CalculationData {
            unit: self.unit.clone(),
            expression: self.expression.clone(),
        }
    }

    /// Fields that may not change while the calculation is referenced
    pub fn identity(&self) -> IdentityFields {
        IdentityFields {
            unique_id: self.unique_id.clone(),
            unit: self.unit.clone(),
        }
    }
}

/// Editable content of a calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationData {
    pub unit: String,
    pub expression: Vec<Pointer>,
}

impl CalculationData {
    pub fn new<S: Into<String>>(unit: S, expression: Vec<Pointer>) -> Self {
        Self {
            unit: unit.into(),
            expression,
        }
    }
}

/// Row handed to [`Store::insert_calculation`](crate::Store::insert_calculation)
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalculationRow {
    pub unique_id: String,
    pub version: u32,
    pub latest: bool,
    pub data: CalculationData,
}

impl NewCalculationRow {
    /// Version 1, marked latest
    pub fn first<S: Into<String>>(unique_id: S, data: CalculationData) -> Self {
        Self {
            unique_id: unique_id.into(),
            version: 1,
            latest: true,
            data,
        }
    }
}
