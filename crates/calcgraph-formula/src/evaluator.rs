//! Expression evaluator
//!
//! Evaluates literal expression ASTs. Failures never escape as errors from
//! [`evaluate_literal`]; they become an `ERROR!` value plus a reason.

use crate::ast::{BinaryOperator, Expr};
use crate::error::{FormulaError, FormulaResult};
use crate::parser::parse_expression;
use calcgraph_core::Translator;
use serde::{Serialize, Serializer};
use std::fmt;

/// Marker written in place of a number when evaluation fails
pub const ERROR_MARKER: &str = "ERROR!";

/// Outcome value of an evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalcValue {
    Number(f64),
    Error,
}

impl CalcValue {
    /// Numeric value, `None` for `ERROR!`
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CalcValue::Number(n) => Some(*n),
            CalcValue::Error => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CalcValue::Error)
    }
}

impl fmt::Display for CalcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcValue::Number(n) => write!(f, "{}", n),
            CalcValue::Error => f.write_str(ERROR_MARKER),
        }
    }
}

impl Serialize for CalcValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CalcValue::Number(n) => serializer.serialize_f64(*n),
            CalcValue::Error => serializer.serialize_str(ERROR_MARKER),
        }
    }
}

/// Value plus every reason collected while producing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub value: CalcValue,
    pub reasons: Vec<String>,
}

impl Evaluation {
    pub fn number(value: f64, reasons: Vec<String>) -> Self {
        Self {
            value: CalcValue::Number(value),
            reasons,
        }
    }

    pub fn error(reasons: Vec<String>) -> Self {
        Self {
            value: CalcValue::Error,
            reasons,
        }
    }

    pub fn is_error(&self) -> bool {
        self.value.is_error()
    }
}

/// Evaluate an AST
pub fn evaluate(expr: &Expr) -> FormulaResult<f64> {
    let value = match expr {
        Expr::Number(n) => *n,
        Expr::Binary { op, left, right } => {
            let left = evaluate(left)?;
            let right = evaluate(right)?;
            match op {
                BinaryOperator::Add => left + right,
                BinaryOperator::Subtract => left - right,
                BinaryOperator::Multiply => left * right,
                BinaryOperator::Divide => {
                    if right == 0.0 {
                        return Err(FormulaError::DivisionByZero);
                    }
                    left / right
                }
            }
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite)
    }
}

/// Parse and evaluate literal text, appending any failure to `reasons`.
///
/// Reasons gathered earlier (e.g. during resolution) are kept whether or not
/// evaluation succeeds.
pub fn evaluate_literal(
    text: &str,
    mut reasons: Vec<String>,
    translator: &dyn Translator,
) -> Evaluation {
    match parse_expression(text).and_then(|expr| evaluate(&expr)) {
        Ok(value) => Evaluation::number(value, reasons),
        Err(e) => {
            tracing::debug!(expression = text, error = %e, "evaluation failed");
            reasons.push(translator.translate(&e.to_string()));
            Evaluation::error(reasons)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcgraph_core::{CatalogTranslator, IdentityTranslator};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn eval(text: &str) -> Evaluation {
        evaluate_literal(text, Vec::new(), &IdentityTranslator)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2+3*4").value, CalcValue::Number(14.0));
        assert_eq!(eval("(2+3)*4").value, CalcValue::Number(20.0));
        assert_eq!(eval("10 - 4 / 2").value, CalcValue::Number(8.0));
        assert_eq!(eval("(0-3) * 2").value, CalcValue::Number(-6.0));
    }

    #[test]
    fn test_division_by_zero() {
        let result = eval("5/0");
        assert_eq!(result.value, CalcValue::Error);
        assert_eq!(result.reasons, vec!["division by zero"]);

        // Zero only reached after evaluation of the divisor
        assert!(eval("1/(2-2)").is_error());
    }

    #[test]
    fn test_non_finite() {
        let big = format!("{}*{}", f64::MAX, f64::MAX);
        assert_eq!(eval(&big).reasons, vec!["result is not finite"]);
    }

    #[test]
    fn test_prior_reasons_carried_forward() {
        let prior = vec!["constant unresolved: rate".to_string()];
        let ok = evaluate_literal("0*2", prior.clone(), &IdentityTranslator);
        assert_eq!(ok.value, CalcValue::Number(0.0));
        assert_eq!(ok.reasons, prior);

        let err = evaluate_literal("(", prior, &IdentityTranslator);
        assert_eq!(
            err.reasons,
            vec!["constant unresolved: rate", "unbalanced parentheses"]
        );
    }

    #[test]
    fn test_reason_translated() {
        let mut messages = HashMap::new();
        messages.insert("empty expression".to_string(), "leerer Ausdruck".to_string());
        let translator = CatalogTranslator::new(messages);
        let result = evaluate_literal("", Vec::new(), &translator);
        assert_eq!(result.reasons, vec!["leerer Ausdruck"]);
    }

    #[test]
    fn test_serialize_value() {
        let ok = serde_json_value(&Evaluation::number(1.5, vec![]));
        assert_eq!(ok, r#"{"value":1.5,"reasons":[]}"#);
        let err = serde_json_value(&Evaluation::error(vec!["division by zero".into()]));
        assert_eq!(err, r#"{"value":"ERROR!","reasons":["division by zero"]}"#);
    }

    fn serde_json_value(e: &Evaluation) -> String {
        serde_json::to_string(e).unwrap()
    }

    proptest! {
        #[test]
        fn prop_sum_of_integers(a in 0u32..1_000_000, b in 0u32..1_000_000) {
            let result = eval(&format!("{} + {}", a, b));
            prop_assert_eq!(result.value, CalcValue::Number(a as f64 + b as f64));
        }

        #[test]
        fn prop_never_panics(text in "[0-9+*/(). -]{0,24}") {
            let result = eval(&text);
            prop_assert!(result.is_error() || result.reasons.is_empty());
        }

        #[test]
        fn prop_deterministic(text in "[0-9+*/() -]{1,16}") {
            prop_assert_eq!(eval(&text), eval(&text));
        }
    }
}
