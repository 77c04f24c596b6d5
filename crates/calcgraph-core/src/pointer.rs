//! Expression pointers
//!
//! A calculation's expression is an ordered list of [`Pointer`]s. Every pointer
//! carries a display [`Label`] plus exactly the fields of its own variant.
//!
//! On the wire pointers travel as a flat [`RawPointer`] record in which every
//! field is optional. Decoding rejects records with missing required fields or
//! fields that belong to another variant, so an invalid combination can never
//! reach the resolver.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const LITERAL_ALPHABET: &str = "0123456789.+-*/() ";

/// Display text of a pointer with optional `{{key}}` substitutions
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    /// Text shown to humans; may contain `{{key}}` placeholders
    pub text: String,
    /// Values substituted into the placeholders
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub payload: BTreeMap<String, String>,
}

impl Label {
    /// Create a label without payload
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            payload: BTreeMap::new(),
        }
    }

    /// Add a payload entry
    pub fn with_entry<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Render the text, replacing `{{key}}` with payload values.
    ///
    /// Placeholders without a payload entry are left as written.
    pub fn render(&self) -> String {
        if self.payload.is_empty() {
            return self.text.clone();
        }
        lazy_regex::regex!(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}")
            .replace_all(&self.text, |caps: &regex::Captures| {
                match self.payload.get(&caps[1]) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Cells an aggregate pointer ranges over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateScope {
    /// Every cell of the sheet
    Sheet,
    /// Every cell of one row (0-based)
    Row(usize),
    /// Every cell of one column (0-based)
    Column(usize),
}

/// The fixed set of aggregate functions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// Total of numeric-parseable cells
    Sum,
    /// Count of cells whose text contains `criteria`, case-insensitive
    CountIf { criteria: String },
}

impl AggregateFunction {
    /// Wire name of the function
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::CountIf { .. } => "countif",
        }
    }
}

/// Variant-specific content of a pointer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Digits, decimal point, operators or parentheses, passed through verbatim
    Literal(String),
    /// Reference to a constant by unique id
    ConstantRef { unique_id: String },
    /// Reference to the latest revision of another calculation
    CalculationRef { unique_id: String },
    /// A single material cell (0-based row/column)
    MaterialCellRef {
        material_id: String,
        row: usize,
        col: usize,
    },
    /// An aggregate over a range of material cells
    AggregateRef {
        material_id: String,
        scope: AggregateScope,
        function: AggregateFunction,
    },
}

impl PointerKind {
    /// Wire tag of the variant
    pub fn tag(&self) -> &'static str {
        match self {
            PointerKind::Literal(_) => "literal",
            PointerKind::ConstantRef { .. } => "constant",
            PointerKind::CalculationRef { .. } => "calculation",
            PointerKind::MaterialCellRef { .. } => "material_cell",
            PointerKind::AggregateRef { .. } => "aggregate",
        }
    }

    fn default_text(&self) -> String {
        match self {
            PointerKind::Literal(value) => value.clone(),
            PointerKind::ConstantRef { unique_id } | PointerKind::CalculationRef { unique_id } => {
                unique_id.clone()
            }
            PointerKind::MaterialCellRef {
                material_id,
                row,
                col,
            } => format!("{}[{},{}]", material_id, row, col),
            PointerKind::AggregateRef {
                material_id,
                scope,
                function,
            } => {
                let range = match scope {
                    AggregateScope::Sheet => "*".to_string(),
                    AggregateScope::Row(r) => format!("row {}", r),
                    AggregateScope::Column(c) => format!("col {}", c),
                };
                format!("{}({}[{}])", function.name(), material_id, range)
            }
        }
    }
}

/// One token of a calculation's expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPointer", into = "RawPointer")]
pub struct Pointer {
    pub label: Label,
    pub kind: PointerKind,
}

impl Pointer {
    /// Create a pointer whose label is derived from its content
    pub fn new(kind: PointerKind) -> Self {
        let label = Label::new(kind.default_text());
        Self { label, kind }
    }

    /// Literal pointer (digits, operators, parentheses)
    pub fn literal<S: Into<String>>(value: S) -> Self {
        Self::new(PointerKind::Literal(value.into()))
    }

    /// Constant reference
    pub fn constant<S: Into<String>>(unique_id: S) -> Self {
        Self::new(PointerKind::ConstantRef {
            unique_id: unique_id.into(),
        })
    }

    /// Calculation reference
    pub fn calculation<S: Into<String>>(unique_id: S) -> Self {
        Self::new(PointerKind::CalculationRef {
            unique_id: unique_id.into(),
        })
    }

    /// Single material cell reference
    pub fn material_cell<S: Into<String>>(material_id: S, row: usize, col: usize) -> Self {
        Self::new(PointerKind::MaterialCellRef {
            material_id: material_id.into(),
            row,
            col,
        })
    }

    /// Aggregate over material cells
    pub fn aggregate<S: Into<String>>(
        material_id: S,
        scope: AggregateScope,
        function: AggregateFunction,
    ) -> Self {
        Self::new(PointerKind::AggregateRef {
            material_id: material_id.into(),
            scope,
            function,
        })
    }

    /// Replace the label
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    /// Text for human display, placeholders substituted
    pub fn display_text(&self) -> String {
        self.label.render()
    }

    /// Unique id of the constant or calculation this pointer references
    pub fn referenced_unique_id(&self) -> Option<&str> {
        match &self.kind {
            PointerKind::ConstantRef { unique_id } | PointerKind::CalculationRef { unique_id } => {
                Some(unique_id)
            }
            _ => None,
        }
    }

    /// Check if this pointer is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, PointerKind::Literal(_))
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

/// Flat wire shape of a pointer; every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPointer {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub payload: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
}

fn require<T>(value: Option<T>, kind: &'static str, field: &'static str) -> Result<T> {
    value.ok_or(Error::MissingField { kind, field })
}

fn require_text(value: Option<String>, kind: &'static str, field: &'static str) -> Result<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(Error::MissingField { kind, field }),
    }
}

/// Like [`require_text`] but keeps surrounding whitespace
fn require_verbatim(value: Option<String>, kind: &'static str, field: &'static str) -> Result<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(Error::MissingField { kind, field }),
    }
}

fn forbid(kind: &'static str, fields: &[(&'static str, bool)]) -> Result<()> {
    match fields.iter().find(|(_, present)| *present) {
        Some((field, _)) => Err(Error::ForeignField { kind, field }),
        None => Ok(()),
    }
}

impl TryFrom<RawPointer> for Pointer {
    type Error = Error;

    fn try_from(raw: RawPointer) -> Result<Self> {
        let RawPointer {
            kind: tag,
            text,
            payload,
            value,
            unique_id,
            material_id,
            row,
            col,
            function,
            criteria,
        } = raw;

        let kind = match tag.as_str() {
            "literal" => {
                forbid(
                    "literal",
                    &[
                        ("uniqueId", unique_id.is_some()),
                        ("materialId", material_id.is_some()),
                        ("row", row.is_some()),
                        ("col", col.is_some()),
                        ("function", function.is_some()),
                        ("criteria", criteria.is_some()),
                    ],
                )?;
                let value = require(value, "literal", "value")?;
                let trimmed = value.trim();
                if trimmed.is_empty() || !trimmed.chars().all(|c| LITERAL_ALPHABET.contains(c)) {
                    return Err(Error::InvalidLiteral(value));
                }
                PointerKind::Literal(trimmed.to_string())
            }
            "constant" | "calculation" => {
                let kind_name = if tag == "constant" {
                    "constant"
                } else {
                    "calculation"
                };
                forbid(
                    kind_name,
                    &[
                        ("value", value.is_some()),
                        ("materialId", material_id.is_some()),
                        ("row", row.is_some()),
                        ("col", col.is_some()),
                        ("function", function.is_some()),
                        ("criteria", criteria.is_some()),
                    ],
                )?;
                let unique_id = require_text(unique_id, kind_name, "uniqueId")?;
                if kind_name == "constant" {
                    PointerKind::ConstantRef { unique_id }
                } else {
                    PointerKind::CalculationRef { unique_id }
                }
            }
            "material_cell" => {
                forbid(
                    "material_cell",
                    &[
                        ("value", value.is_some()),
                        ("uniqueId", unique_id.is_some()),
                        ("function", function.is_some()),
                        ("criteria", criteria.is_some()),
                    ],
                )?;
                PointerKind::MaterialCellRef {
                    material_id: require_text(material_id, "material_cell", "materialId")?,
                    row: require(row, "material_cell", "row")?,
                    col: require(col, "material_cell", "col")?,
                }
            }
            "aggregate" => {
                forbid(
                    "aggregate",
                    &[
                        ("value", value.is_some()),
                        ("uniqueId", unique_id.is_some()),
                    ],
                )?;
                let material_id = require_text(material_id, "aggregate", "materialId")?;
                let function_name = require(function, "aggregate", "function")?;
                let function = match function_name.trim().to_lowercase().as_str() {
                    "sum" => {
                        forbid("aggregate", &[("criteria", criteria.is_some())])?;
                        AggregateFunction::Sum
                    }
                    "countif" => AggregateFunction::CountIf {
                        criteria: require_verbatim(criteria, "aggregate", "criteria")?,
                    },
                    _ => return Err(Error::UnknownAggregateFunction(function_name)),
                };
                let scope = match (row, col) {
                    (None, None) => AggregateScope::Sheet,
                    (Some(r), None) => AggregateScope::Row(r),
                    (None, Some(c)) => AggregateScope::Column(c),
                    (Some(_), Some(_)) => return Err(Error::AmbiguousAggregateScope(material_id)),
                };
                PointerKind::AggregateRef {
                    material_id,
                    scope,
                    function,
                }
            }
            _ => return Err(Error::UnknownPointerType(tag)),
        };

        let text = if text.is_empty() {
            kind.default_text()
        } else {
            text
        };

        Ok(Pointer {
            label: Label { text, payload },
            kind,
        })
    }
}

impl From<Pointer> for RawPointer {
    fn from(pointer: Pointer) -> Self {
        let mut raw = RawPointer {
            kind: pointer.kind.tag().to_string(),
            text: pointer.label.text,
            payload: pointer.label.payload,
            ..Default::default()
        };
        match pointer.kind {
            PointerKind::Literal(value) => raw.value = Some(value),
            PointerKind::ConstantRef { unique_id } | PointerKind::CalculationRef { unique_id } => {
                raw.unique_id = Some(unique_id)
            }
            PointerKind::MaterialCellRef {
                material_id,
                row,
                col,
            } => {
                raw.material_id = Some(material_id);
                raw.row = Some(row);
                raw.col = Some(col);
            }
            PointerKind::AggregateRef {
                material_id,
                scope,
                function,
            } => {
                raw.material_id = Some(material_id);
                match scope {
                    AggregateScope::Sheet => {}
                    AggregateScope::Row(r) => raw.row = Some(r),
                    AggregateScope::Column(c) => raw.col = Some(c),
                }
                raw.function = Some(function.name().to_string());
                if let AggregateFunction::CountIf { criteria } = function {
                    raw.criteria = Some(criteria);
                }
            }
        }
        raw
    }
}

/// Decode a whole expression, reporting the index of the first bad pointer
pub fn decode_expression(raw: Vec<RawPointer>) -> Result<Vec<Pointer>> {
    raw.into_iter()
        .enumerate()
        .map(|(index, raw)| {
            Pointer::try_from(raw).map_err(|e| Error::PointerAt {
                index,
                source: Box::new(e),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(kind: &str) -> RawPointer {
        RawPointer {
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_literal() {
        let pointer = Pointer::try_from(RawPointer {
            value: Some(" 12.5 ".into()),
            ..raw("literal")
        })
        .unwrap();
        assert_eq!(pointer.kind, PointerKind::Literal("12.5".into()));
        assert_eq!(pointer.display_text(), "12.5");
    }

    #[test]
    fn test_decode_literal_rejects_letters() {
        let err = Pointer::try_from(RawPointer {
            value: Some("2x".into()),
            ..raw("literal")
        })
        .unwrap_err();
        assert_eq!(err, Error::InvalidLiteral("2x".into()));
    }

    #[test]
    fn test_decode_rejects_foreign_fields() {
        let err = Pointer::try_from(RawPointer {
            unique_id: Some("c1".into()),
            row: Some(1),
            ..raw("constant")
        })
        .unwrap_err();
        assert_eq!(
            err,
            Error::ForeignField {
                kind: "constant",
                field: "row"
            }
        );
    }

    #[test]
    fn test_decode_countif_requires_criteria() {
        let err = Pointer::try_from(RawPointer {
            material_id: Some("m1".into()),
            function: Some("countif".into()),
            ..raw("aggregate")
        })
        .unwrap_err();
        assert_eq!(
            err,
            Error::MissingField {
                kind: "aggregate",
                field: "criteria"
            }
        );
    }

    #[test]
    fn test_decode_countif_keeps_criteria_whitespace() {
        let pointer = Pointer::try_from(RawPointer {
            material_id: Some("m1".into()),
            function: Some("countif".into()),
            criteria: Some(" pie".into()),
            ..raw("aggregate")
        })
        .unwrap();
        assert!(matches!(
            pointer.kind,
            PointerKind::AggregateRef {
                function: AggregateFunction::CountIf { ref criteria },
                ..
            } if criteria == " pie"
        ));

        let err = Pointer::try_from(RawPointer {
            material_id: Some("m1".into()),
            function: Some("countif".into()),
            criteria: Some("   ".into()),
            ..raw("aggregate")
        })
        .unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "criteria", .. }));
    }

    #[test]
    fn test_pointers_are_hashable() {
        let set: std::collections::HashSet<Pointer> = [
            Pointer::constant("rate").with_label(Label::new("Tax rate")),
            Pointer::constant("rate").with_label(Label::new("Tax rate")),
            Pointer::literal("*"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_decode_sum_rejects_criteria() {
        let err = Pointer::try_from(RawPointer {
            material_id: Some("m1".into()),
            function: Some("sum".into()),
            criteria: Some("x".into()),
            ..raw("aggregate")
        })
        .unwrap_err();
        assert!(matches!(err, Error::ForeignField { field: "criteria", .. }));
    }

    #[test]
    fn test_decode_aggregate_scope() {
        let pointer = Pointer::try_from(RawPointer {
            material_id: Some("m1".into()),
            function: Some("SUM".into()),
            col: Some(2),
            ..raw("aggregate")
        })
        .unwrap();
        assert_eq!(
            pointer.kind,
            PointerKind::AggregateRef {
                material_id: "m1".into(),
                scope: AggregateScope::Column(2),
                function: AggregateFunction::Sum,
            }
        );

        let err = Pointer::try_from(RawPointer {
            material_id: Some("m1".into()),
            function: Some("sum".into()),
            row: Some(0),
            col: Some(2),
            ..raw("aggregate")
        })
        .unwrap_err();
        assert_eq!(err, Error::AmbiguousAggregateScope("m1".into()));
    }

    #[test]
    fn test_decode_unknown_type() {
        let err = Pointer::try_from(raw("operator")).unwrap_err();
        assert_eq!(err, Error::UnknownPointerType("operator".into()));
    }

    #[test]
    fn test_decode_expression_reports_index() {
        let err = decode_expression(vec![
            RawPointer {
                value: Some("1".into()),
                ..raw("literal")
            },
            raw("calculation"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::PointerAt { index: 1, .. }));
    }

    #[test]
    fn test_json_roundtrip_keeps_wire_shape() {
        let pointer = Pointer::aggregate(
            "sales",
            AggregateScope::Row(3),
            AggregateFunction::CountIf {
                criteria: "apple".into(),
            },
        );
        let json = serde_json::to_value(&pointer).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "aggregate",
                "text": "countif(sales[row 3])",
                "materialId": "sales",
                "row": 3,
                "function": "countif",
                "criteria": "apple"
            })
        );
        let back: Pointer = serde_json::from_value(json).unwrap();
        assert_eq!(back, pointer);
    }

    #[test]
    fn test_label_render_substitutes_payload() {
        let label = Label::new("Revenue of {{company}} in {{ year }} ({{unit}})")
            .with_entry("company", "ACME")
            .with_entry("year", "2024");
        assert_eq!(label.render(), "Revenue of ACME in 2024 ({{unit}})");
    }

    #[test]
    fn test_referenced_unique_id() {
        assert_eq!(Pointer::constant("c1").referenced_unique_id(), Some("c1"));
        assert_eq!(Pointer::calculation("u1").referenced_unique_id(), Some("u1"));
        assert_eq!(Pointer::literal("+").referenced_unique_id(), None);
        assert_eq!(Pointer::material_cell("m", 0, 0).referenced_unique_id(), None);
    }
}
