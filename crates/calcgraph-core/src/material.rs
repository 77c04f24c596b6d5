//! Material sheets: company/period scoped input grids

use crate::pointer::AggregateScope;
use serde::{Deserialize, Serialize};

/// A single material cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl MaterialValue {
    /// Numeric value of the cell; text is parsed after trimming.
    ///
    /// Returns `None` for empty cells, non-numeric text and non-finite values.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            MaterialValue::Number(n) => *n,
            MaterialValue::Text(s) => s.trim().parse::<f64>().ok()?,
            MaterialValue::Empty => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Textual form of the cell, empty for empty cells
    pub fn as_text(&self) -> String {
        match self {
            MaterialValue::Number(n) => n.to_string(),
            MaterialValue::Text(s) => s.clone(),
            MaterialValue::Empty => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, MaterialValue::Empty)
    }
}

impl From<f64> for MaterialValue {
    fn from(n: f64) -> Self {
        MaterialValue::Number(n)
    }
}

impl From<&str> for MaterialValue {
    fn from(s: &str) -> Self {
        MaterialValue::Text(s.to_string())
    }
}

impl From<String> for MaterialValue {
    fn from(s: String) -> Self {
        MaterialValue::Text(s)
    }
}

/// Grid of material cells, rows of possibly uneven length
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSheet {
    pub material_id: String,
    #[serde(default)]
    pub rows: Vec<Vec<MaterialValue>>,
}

impl MaterialSheet {
    pub fn new<S: Into<String>>(material_id: S, rows: Vec<Vec<MaterialValue>>) -> Self {
        Self {
            material_id: material_id.into(),
            rows,
        }
    }

    /// Cell at (row, col), 0-based
    pub fn get(&self, row: usize, col: usize) -> Option<&MaterialValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// All cells of one row
    pub fn row(&self, row: usize) -> Vec<&MaterialValue> {
        self.rows.get(row).map(|r| r.iter().collect()).unwrap_or_default()
    }

    /// All cells of one column; short rows are skipped
    pub fn column(&self, col: usize) -> Vec<&MaterialValue> {
        self.rows.iter().filter_map(|r| r.get(col)).collect()
    }

    /// All cells, row-major
    pub fn cells(&self) -> Vec<&MaterialValue> {
        self.rows.iter().flatten().collect()
    }

    /// Cells covered by an aggregate scope
    pub fn scope(&self, scope: AggregateScope) -> Vec<&MaterialValue> {
        match scope {
            AggregateScope::Sheet => self.cells(),
            AggregateScope::Row(r) => self.row(r),
            AggregateScope::Column(c) => self.column(c),
        }
    }
}
