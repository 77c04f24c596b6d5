//! # calcgraph-core
//!
//! Core data structures for the calcgraph calculation engine.
//!
//! This crate provides the fundamental types used throughout calcgraph:
//! - [`Pointer`] - One token of a calculation's expression
//! - [`Calculation`], [`Constant`], [`Report`] - The stored entities
//! - [`MaterialSheet`] - Company/period scoped input data
//! - [`Store`], [`MaterialProvider`], [`Translator`] - Collaborator seams
//!
//! ## Example
//!
//! ```rust
//! use calcgraph_core::{CalculationData, MemoryStore, NewCalculationRow, Pointer, Store};
//!
//! let store = MemoryStore::new();
//! let data = CalculationData::new(
//!     "USD",
//!     vec![Pointer::constant("price"), Pointer::literal("*"), Pointer::literal("2")],
//! );
//! let id = store
//!     .insert_calculation(NewCalculationRow::first("revenue", data))
//!     .unwrap();
//! assert_eq!(store.latest_calculation("revenue").unwrap().unwrap().id, id);
//! ```

pub mod calculation;
pub mod constant;
pub mod context;
pub mod entity;
pub mod error;
pub mod material;
pub mod pointer;
pub mod provider;
pub mod report;
pub mod store;

// Re-exports for convenience
pub use calculation::{Calculation, CalculationData, NewCalculationRow, RecordId};
pub use constant::{Constant, Sample};
pub use context::{CompanyContext, FinancialPeriod};
pub use entity::{EntityKind, IdentityFields};
pub use error::{Error, Result};
pub use material::{MaterialSheet, MaterialValue};
pub use pointer::{
    decode_expression, AggregateFunction, AggregateScope, Label, Pointer, PointerKind, RawPointer,
};
pub use provider::{
    CatalogTranslator, IdentityTranslator, MaterialProvider, MemoryMaterials, Translator,
};
pub use report::Report;
pub use store::{MemoryStore, Store, StoreError, StoreResult};
