//! # calcgraph-formula
//!
//! Expression resolution and arithmetic evaluation for calcgraph.
//!
//! This crate provides:
//! - Pointer resolution (pointers → literal infix text plus reasons)
//! - Literal expression parsing (text → AST)
//! - Evaluation (AST → number, or `ERROR!` with a reason)
//! - The fixed aggregate functions `sum` and `countif`
//! - A reference graph over latest calculations
//!
//! ## Example
//!
//! ```rust
//! use calcgraph_core::IdentityTranslator;
//! use calcgraph_formula::{evaluate_literal, CalcValue};
//!
//! let result = evaluate_literal("2+3*4", Vec::new(), &IdentityTranslator);
//! assert_eq!(result.value, CalcValue::Number(14.0));
//!
//! let result = evaluate_literal("5/0", Vec::new(), &IdentityTranslator);
//! assert!(result.value.is_error());
//! assert_eq!(result.reasons, vec!["division by zero".to_string()]);
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod resolver;

pub use ast::{BinaryOperator, Expr};
pub use dependency::{RefKey, ReferenceGraph};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_literal, CalcValue, Evaluation};
pub use parser::parse_expression;
pub use resolver::{Resolution, ResolutionContext, Resolver, ResolverOptions};
