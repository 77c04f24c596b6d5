//! # calcgraph
//!
//! Versioned calculation graphs.
//!
//! A calculation is an arithmetic expression over pointers to constants,
//! material data cells and other calculations. calcgraph resolves those
//! pointers for a company and financial period, evaluates the result, and
//! keeps the reference graph consistent while calculations and constants are
//! edited.
//!
//! ## Features
//!
//! - Pointer resolution with cycle detection and per-value reasons
//! - Arithmetic evaluation that degrades to `ERROR!` instead of failing
//! - Copy-on-write versioning of calculations that are in use
//! - Delete and identity-edit guards while references exist
//! - Report reference rewriting after a version bump
//! - JSON snapshots for fixtures and the `calc` binary
//!
//! ## Example
//!
//! ```rust
//! use calcgraph::prelude::*;
//!
//! let store = MemoryStore::new();
//! let manager = VersionManager::new(&store);
//! manager
//!     .create_calculation(
//!         "base",
//!         CalculationData::new("USD", vec![Pointer::literal("40")]),
//!     )
//!     .unwrap();
//! manager
//!     .create_calculation(
//!         "total",
//!         CalculationData::new(
//!             "USD",
//!             vec![Pointer::calculation("base"), Pointer::literal("+"), Pointer::literal("2")],
//!         ),
//!     )
//!     .unwrap();
//!
//! // "base" is referenced by "total", so it cannot be deleted
//! assert!(manager.delete_calculation("base").is_err());
//!
//! // Editing it creates version 2
//! let outcome = manager
//!     .edit_calculation("base", CalculationData::new("USD", vec![Pointer::literal("50")]))
//!     .unwrap();
//! assert!(matches!(outcome, EditOutcome::Versioned { version: 2, .. }));
//!
//! let materials = MemoryMaterials::new();
//! let company = CompanyContext::new("acme", "2024".parse().unwrap(), "berlin");
//! let result = Calculator::new(&store, &materials)
//!     .evaluate_latest(&company, "total")
//!     .unwrap();
//! assert_eq!(result.value, CalcValue::Number(52.0));
//! ```

pub mod calculation;
pub mod config;
pub mod error;
pub mod prelude;
pub mod references;
pub mod snapshot;
pub mod versioning;

// Re-export engine types
pub use calculation::{BatchStats, Calculator, ReportEvaluation, ReportRow};
pub use config::CalculatorOptions;
pub use error::{Error, Referrer, Result};
pub use references::rewrite_report_references;
pub use snapshot::{Snapshot, SnapshotCalculation, SnapshotMaterial, SnapshotReport};
pub use versioning::{EditOutcome, VersionManager};

// Re-export core types
pub use calcgraph_core::{
    decode_expression, AggregateFunction, AggregateScope, Calculation, CalculationData,
    CatalogTranslator, CompanyContext, Constant, EntityKind, FinancialPeriod, IdentityFields,
    IdentityTranslator, Label, MaterialProvider, MaterialSheet, MaterialValue, MemoryMaterials,
    MemoryStore, NewCalculationRow, Pointer, PointerKind, RawPointer, RecordId, Report, Sample,
    Store, StoreError, StoreResult, Translator,
};

// Re-export formula types
pub use calcgraph_formula::{
    evaluate_literal, parse_expression, CalcValue, Evaluation, RefKey, ReferenceGraph,
    Resolution, ResolverOptions,
};
