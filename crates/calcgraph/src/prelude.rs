//! Prelude module - common imports for calcgraph users
//!
//! ```rust
//! use calcgraph::prelude::*;
//! ```

pub use crate::{
    // Pointer model
    AggregateFunction,
    AggregateScope,
    // Engine
    CalcValue,
    Calculation,
    CalculationData,
    Calculator,
    CalculatorOptions,
    CompanyContext,
    Constant,
    EditOutcome,
    EntityKind,
    // Error types
    Error,
    Evaluation,
    FinancialPeriod,
    MaterialProvider,
    MaterialSheet,
    MaterialValue,
    // In-memory collaborators
    MemoryMaterials,
    MemoryStore,
    Pointer,
    RecordId,
    Report,
    Result,
    Snapshot,
    Store,
    Translator,
    VersionManager,
};
