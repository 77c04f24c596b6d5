//! Math aggregates

use calcgraph_core::{AggregateFunction, MaterialValue};

/// SUM: total of numeric-parseable cells; text and empty cells are skipped
pub fn fn_sum(cells: &[&MaterialValue], _function: &AggregateFunction) -> f64 {
    cells.iter().filter_map(|cell| cell.as_number()).sum()
}
