//! Pointer resolution
//!
//! Walks a calculation's pointers for one company context and produces the
//! literal infix text the evaluator understands. Every symbolic reference is
//! replaced by a number. A reference that cannot be resolved contributes `0`
//! and leaves a reason behind; resolution itself never fails.
//!
//! Calculation references recurse into the referenced calculation's latest
//! revision. The resolver keeps the set of unique ids currently being
//! resolved, so a cycle is reported instead of recursing forever.

use crate::evaluator::{evaluate_literal, Evaluation};
use crate::functions;
use ahash::AHashSet;
use calcgraph_core::{
    AggregateFunction, AggregateScope, Calculation, CompanyContext, MaterialProvider,
    MaterialValue, Pointer, PointerKind, Store, Translator,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Resolution options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverOptions {
    /// Sample location used when a constant has no sample for the company's
    /// location
    pub default_location: String,
    /// Fall back to `default_location` at all
    pub fallback_to_default: bool,
    /// Copy reasons of successfully evaluated nested calculations into the
    /// parent's reasons
    pub include_nested_reasons: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            default_location: "default".to_string(),
            fallback_to_default: true,
            include_nested_reasons: true,
        }
    }
}

/// Collaborators and settings for one resolution run
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub store: &'a dyn Store,
    pub materials: &'a dyn MaterialProvider,
    pub translator: &'a dyn Translator,
    pub company: &'a CompanyContext,
    pub options: &'a ResolverOptions,
}

/// Literal expression plus reasons collected while producing it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub expression: String,
    pub reasons: Vec<String>,
}

/// Resolver for one company context
pub struct Resolver<'a> {
    ctx: ResolutionContext<'a>,
    resolving: AHashSet<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(ctx: ResolutionContext<'a>) -> Self {
        Self {
            ctx,
            resolving: AHashSet::new(),
        }
    }

    /// Resolve and evaluate a calculation row.
    ///
    /// The row's own unique id is part of the resolving set while its
    /// expression is walked, so a self reference is reported as a cycle.
    pub fn resolve_and_evaluate(&mut self, calc: &Calculation) -> Evaluation {
        let inserted = self.resolving.insert(calc.unique_id.clone());
        let resolution = self.resolve(&calc.expression);
        if inserted {
            self.resolving.remove(&calc.unique_id);
        }

        tracing::debug!(
            unique_id = %calc.unique_id,
            version = calc.version,
            expression = %resolution.expression,
            "resolved calculation"
        );
        evaluate_literal(
            &resolution.expression,
            resolution.reasons,
            self.ctx.translator,
        )
    }

    /// Resolve pointers into literal text
    pub fn resolve(&mut self, pointers: &[Pointer]) -> Resolution {
        let mut parts = Vec::with_capacity(pointers.len());
        let mut reasons = Vec::new();

        for pointer in pointers {
            let part = match &pointer.kind {
                PointerKind::Literal(text) => text.clone(),
                PointerKind::ConstantRef { unique_id } => {
                    self.resolve_constant(unique_id, &mut reasons)
                }
                PointerKind::CalculationRef { unique_id } => {
                    self.resolve_calculation(unique_id, &mut reasons)
                }
                PointerKind::MaterialCellRef {
                    material_id,
                    row,
                    col,
                } => self.resolve_cell(material_id, *row, *col, &mut reasons),
                PointerKind::AggregateRef {
                    material_id,
                    scope,
                    function,
                } => self.resolve_aggregate(material_id, *scope, function, &mut reasons),
            };
            parts.push(part);
        }

        Resolution {
            expression: parts.join(" "),
            reasons,
        }
    }

    fn resolve_constant(&self, unique_id: &str, reasons: &mut Vec<String>) -> String {
        let constant = match self.ctx.store.constant(unique_id) {
            Ok(constant) => constant,
            Err(e) => {
                tracing::warn!(unique_id, error = %e, "constant lookup failed");
                reasons.push(self.reason("lookup failed", unique_id));
                return zero();
            }
        };

        let options = self.ctx.options;
        let default = options
            .fallback_to_default
            .then_some(options.default_location.as_str());
        match constant
            .as_ref()
            .and_then(|c| c.resolve(&self.ctx.company.location, default))
        {
            Some(sample) => self.contribute(sample.value, unique_id, reasons),
            None => {
                reasons.push(self.reason("constant unresolved", unique_id));
                zero()
            }
        }
    }

    fn resolve_calculation(&mut self, unique_id: &str, reasons: &mut Vec<String>) -> String {
        if self.resolving.contains(unique_id) {
            tracing::debug!(unique_id, "cycle detected");
            reasons.push(self.reason("cycle detected", unique_id));
            return zero();
        }

        let target = match self.ctx.store.latest_calculation(unique_id) {
            Ok(Some(target)) => target,
            Ok(None) => {
                reasons.push(self.reason("calculation unresolved", unique_id));
                return zero();
            }
            Err(e) => {
                tracing::warn!(unique_id, error = %e, "calculation lookup failed");
                reasons.push(self.reason("lookup failed", unique_id));
                return zero();
            }
        };

        let nested = self.resolve_and_evaluate(&target);
        match nested.value.as_number() {
            Some(value) => {
                if self.ctx.options.include_nested_reasons {
                    reasons.extend(nested.reasons);
                }
                self.contribute(value, unique_id, reasons)
            }
            None => {
                reasons.extend(nested.reasons);
                zero()
            }
        }
    }

    fn resolve_cell(
        &self,
        material_id: &str,
        row: usize,
        col: usize,
        reasons: &mut Vec<String>,
    ) -> String {
        let subject = format!("{}[{},{}]", material_id, row, col);
        let ctx = self.ctx.company;
        let sheet = self
            .ctx
            .materials
            .cells(&ctx.company_id, &ctx.period, material_id);

        let Some(cell) = sheet.as_ref().and_then(|s| s.get(row, col)) else {
            reasons.push(self.reason("cell unresolved", &subject));
            return zero();
        };

        match cell {
            MaterialValue::Empty => zero(),
            other => match other.as_number() {
                Some(value) => self.contribute(value, &subject, reasons),
                None => {
                    reasons.push(self.reason("cell not numeric", &subject));
                    zero()
                }
            },
        }
    }

    fn resolve_aggregate(
        &self,
        material_id: &str,
        scope: AggregateScope,
        function: &AggregateFunction,
        reasons: &mut Vec<String>,
    ) -> String {
        let ctx = self.ctx.company;
        let Some(sheet) = self
            .ctx
            .materials
            .cells(&ctx.company_id, &ctx.period, material_id)
        else {
            reasons.push(self.reason("material unresolved", material_id));
            return zero();
        };

        let cells = sheet.scope(scope);
        let value = functions::aggregate(function, &cells);
        tracing::debug!(
            material_id,
            function = function.name(),
            cells = cells.len(),
            value,
            "aggregated material"
        );
        self.contribute(value, material_id, reasons)
    }

    fn contribute(&self, value: f64, subject: &str, reasons: &mut Vec<String>) -> String {
        if !value.is_finite() {
            reasons.push(self.reason("value not finite", subject));
            return zero();
        }
        format_literal(value)
    }

    fn reason(&self, key: &str, subject: &str) -> String {
        format!("{}: {}", self.ctx.translator.translate(key), subject)
    }
}

fn zero() -> String {
    "0".to_string()
}

/// Write a number so the evaluator can read it back without unary minus
pub fn format_literal(value: f64) -> String {
    let mut out = String::new();
    if value == 0.0 {
        out.push('0');
    } else if value < 0.0 {
        let _ = write!(out, "(0-{})", -value);
    } else {
        let _ = write!(out, "{}", value);
    }
    out
}
