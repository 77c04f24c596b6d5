//! Calculation engine
//!
//! [`Calculator`] ties a store, material data and a translator together and
//! evaluates calculations for one company context at a time. Evaluation
//! never fails on bad data: unresolved inputs and arithmetic failures come
//! back as reasons next to the value (or `ERROR!`).
//!
//! # Example
//!
//! ```rust
//! use calcgraph::prelude::*;
//!
//! let store = MemoryStore::new();
//! store
//!     .insert_constant(Constant::new("price", 2024, "USD").with_sample("default", 4.0))
//!     .unwrap();
//! VersionManager::new(&store)
//!     .create_calculation(
//!         "revenue",
//!         CalculationData::new(
//!             "USD",
//!             vec![Pointer::constant("price"), Pointer::literal("*"), Pointer::literal("3")],
//!         ),
//!     )
//!     .unwrap();
//!
//! let materials = MemoryMaterials::new();
//! let calculator = Calculator::new(&store, &materials);
//! let company = CompanyContext::new("acme", "2024".parse().unwrap(), "berlin");
//!
//! let result = calculator.evaluate_latest(&company, "revenue").unwrap();
//! assert_eq!(result.value, CalcValue::Number(12.0));
//! ```

use crate::config::CalculatorOptions;
use crate::error::{Error, Result};
use calcgraph_core::{
    Calculation, CompanyContext, IdentityTranslator, MaterialProvider, RecordId, Store,
    Translator,
};
use calcgraph_formula::{
    Evaluation, RefKey, ReferenceGraph, ResolutionContext, Resolver,
};
use serde::Serialize;

static IDENTITY: IdentityTranslator = IdentityTranslator;

/// Statistics from a report run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Rows evaluated
    pub evaluated: usize,
    /// Rows whose value is `ERROR!`
    pub errors: usize,
    /// Rows with at least one reason
    pub with_reasons: usize,
    /// Listed row ids that no longer exist
    pub missing: usize,
}

/// One row of a report result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub id: RecordId,
    /// `None` when the listed row no longer exists
    pub unique_id: Option<String>,
    pub version: Option<u32>,
    pub unit: Option<String>,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

/// Evaluated report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEvaluation {
    pub report: String,
    pub rows: Vec<ReportRow>,
    pub stats: BatchStats,
}

/// Evaluates calculations against a store and material data
pub struct Calculator<'a> {
    store: &'a dyn Store,
    materials: &'a dyn MaterialProvider,
    translator: &'a dyn Translator,
    options: CalculatorOptions,
}

impl<'a> Calculator<'a> {
    /// Calculator with default options and untranslated reasons
    pub fn new(store: &'a dyn Store, materials: &'a dyn MaterialProvider) -> Self {
        Self {
            store,
            materials,
            translator: &IDENTITY,
            options: CalculatorOptions::default(),
        }
    }

    /// Use a translator for reasons
    pub fn with_translator(mut self, translator: &'a dyn Translator) -> Self {
        self.translator = translator;
        self
    }

    /// Replace the options
    pub fn with_options(mut self, options: CalculatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CalculatorOptions {
        &self.options
    }

    fn resolver<'c>(&'c self, company: &'c CompanyContext) -> Resolver<'c> {
        Resolver::new(ResolutionContext {
            store: self.store,
            materials: self.materials,
            translator: self.translator,
            company,
            options: &self.options.resolution,
        })
    }

    /// Resolve and evaluate one calculation row for a company
    pub fn resolve_and_evaluate(&self, company: &CompanyContext, calc: &Calculation) -> Evaluation {
        self.resolver(company).resolve_and_evaluate(calc)
    }

    /// Evaluate the latest revision of `unique_id`
    pub fn evaluate_latest(&self, company: &CompanyContext, unique_id: &str) -> Result<Evaluation> {
        let calc = self
            .store
            .latest_calculation(unique_id)?
            .ok_or_else(|| Error::CalculationNotFound(unique_id.to_string()))?;
        Ok(self.resolve_and_evaluate(company, &calc))
    }

    /// Evaluate every row a report lists, in report order.
    ///
    /// One row failing never stops the batch. A listed row that is not the
    /// latest revision of its calculation is still evaluated, with a reason
    /// noting the newer version.
    pub fn evaluate_report(
        &self,
        company: &CompanyContext,
        report_name: &str,
    ) -> Result<ReportEvaluation> {
        let report = self
            .store
            .report(report_name)?
            .ok_or_else(|| Error::ReportNotFound(report_name.to_string()))?;

        let mut stats = BatchStats::default();
        let mut rows = Vec::with_capacity(report.calculations.len());

        for &id in &report.calculations {
            let Some(calc) = self.store.calculation(id)? else {
                stats.missing += 1;
                if self.options.skip_missing_report_rows {
                    continue;
                }
                let reason = format!("{}: {}", self.translator.translate("row missing"), id);
                rows.push(ReportRow {
                    id,
                    unique_id: None,
                    version: None,
                    unit: None,
                    evaluation: Evaluation::error(vec![reason]),
                });
                continue;
            };

            let mut evaluation = self.resolve_and_evaluate(company, &calc);
            if !calc.latest {
                evaluation.reasons.push(format!(
                    "{}: {} v{}",
                    self.translator.translate("stale revision"),
                    calc.unique_id,
                    calc.version
                ));
            }

            stats.evaluated += 1;
            if evaluation.is_error() {
                stats.errors += 1;
            }
            if !evaluation.reasons.is_empty() {
                stats.with_reasons += 1;
            }
            rows.push(ReportRow {
                id,
                unique_id: Some(calc.unique_id),
                version: Some(calc.version),
                unit: Some(calc.unit),
                evaluation,
            });
        }

        tracing::info!(
            report = report_name,
            evaluated = stats.evaluated,
            errors = stats.errors,
            missing = stats.missing,
            "evaluated report"
        );

        Ok(ReportEvaluation {
            report: report.name,
            rows,
            stats,
        })
    }

    /// Entities the latest revision of `unique_id` references directly
    pub fn dependencies(&self, unique_id: &str) -> Result<Vec<RefKey>> {
        let calc = self
            .store
            .latest_calculation(unique_id)?
            .ok_or_else(|| Error::CalculationNotFound(unique_id.to_string()))?;
        let graph = ReferenceGraph::from_calculations([&calc]);
        Ok(graph.references(unique_id).cloned().collect())
    }

    /// Reference graph over all latest revisions
    pub fn reference_graph(&self) -> Result<ReferenceGraph> {
        let latest = self.store.latest_calculations()?;
        Ok(ReferenceGraph::from_calculations(&latest))
    }
}
