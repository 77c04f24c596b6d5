//! Built-in aggregate functions
//!
//! The set is closed: `sum` and `countif`. Both take the cells covered by an
//! aggregate pointer's scope and always produce a number.

pub mod criteria;
pub mod math;
pub mod statistical;

use calcgraph_core::{AggregateFunction, MaterialValue};

/// Aggregate implementation signature
pub type AggregateImpl = fn(&[&MaterialValue], &AggregateFunction) -> f64;

/// Look up the implementation of an aggregate function
pub fn lookup(function: &AggregateFunction) -> AggregateImpl {
    match function {
        AggregateFunction::Sum => math::fn_sum,
        AggregateFunction::CountIf { .. } => statistical::fn_countif,
    }
}

/// Apply an aggregate function to a set of cells
pub fn aggregate(function: &AggregateFunction, cells: &[&MaterialValue]) -> f64 {
    lookup(function)(cells, function)
}
