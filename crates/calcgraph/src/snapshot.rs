//! JSON snapshots of a whole calculation graph
//!
//! A snapshot holds constants, calculations, material sheets and reports in
//! one document. Reports name calculations by unique id; loading points them
//! at the latest row. Used for fixtures and by the `calc` binary.
//!
//! ```json
//! {
//!   "constants": [{ "uniqueId": "price", "year": 2024, "unit": "USD",
//!                   "samples": [{ "location": "default", "value": 4.0 }] }],
//!   "calculations": [{ "uniqueId": "revenue", "unit": "USD", "expression": [
//!       { "type": "constant", "uniqueId": "price" },
//!       { "type": "literal", "value": "*" },
//!       { "type": "aggregate", "materialId": "units", "function": "sum", "col": 1 }
//!   ]}],
//!   "materials": [{ "companyId": "acme", "period": "2024", "materialId": "units",
//!                   "rows": [["north", 10], ["south", 5]] }],
//!   "reports": [{ "name": "q1", "calculations": ["revenue"] }]
//! }
//! ```

use crate::error::{Error, Result};
use crate::versioning::VersionManager;
use calcgraph_core::{
    decode_expression, CalculationData, Constant, FinancialPeriod, MaterialSheet, MemoryMaterials,
    MemoryStore, RawPointer, Report, Store,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Calculation entry of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCalculation {
    pub unique_id: String,
    pub unit: String,
    pub expression: Vec<RawPointer>,
}

/// Material sheet entry of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMaterial {
    pub company_id: String,
    pub period: FinancialPeriod,
    #[serde(flatten)]
    pub sheet: MaterialSheet,
}

/// Report entry of a snapshot; calculations by unique id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReport {
    pub name: String,
    #[serde(default)]
    pub calculations: Vec<String>,
}

/// Whole-graph document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub constants: Vec<Constant>,
    pub calculations: Vec<SnapshotCalculation>,
    pub materials: Vec<SnapshotMaterial>,
    pub reports: Vec<SnapshotReport>,
}

impl Snapshot {
    /// Parse a snapshot from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a snapshot file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&text)?;
        tracing::debug!(
            path = %path.display(),
            constants = snapshot.constants.len(),
            calculations = snapshot.calculations.len(),
            materials = snapshot.materials.len(),
            reports = snapshot.reports.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Build in-memory stores from the snapshot.
    ///
    /// Every entry goes through the same validation as an interactive
    /// create, so a bad snapshot fails here rather than at evaluation.
    pub fn into_stores(self) -> Result<(MemoryStore, MemoryMaterials)> {
        let store = MemoryStore::new();
        let manager = VersionManager::new(&store);

        for constant in self.constants {
            manager.create_constant(constant)?;
        }

        for calc in self.calculations {
            let expression = decode_expression(calc.expression)?;
            manager.create_calculation(&calc.unique_id, CalculationData::new(calc.unit, expression))?;
        }

        let mut materials = MemoryMaterials::new();
        for material in self.materials {
            materials.insert(material.company_id, material.period, material.sheet);
        }

        for report in self.reports {
            let mut ids = Vec::with_capacity(report.calculations.len());
            for unique_id in &report.calculations {
                let calc = store
                    .latest_calculation(unique_id)?
                    .ok_or_else(|| Error::CalculationNotFound(unique_id.clone()))?;
                ids.push(calc.id);
            }
            store.insert_report(Report::new(report.name, ids))?;
        }

        Ok((store, materials))
    }
}
