//! Counting aggregates

use super::criteria::CriteriaMatcher;
use calcgraph_core::{AggregateFunction, MaterialValue};

/// COUNTIF: number of cells whose text contains the criteria (case-insensitive)
pub fn fn_countif(cells: &[&MaterialValue], function: &AggregateFunction) -> f64 {
    let AggregateFunction::CountIf { criteria } = function else {
        return 0.0;
    };
    let matcher = CriteriaMatcher::new(criteria);
    cells.iter().filter(|cell| matcher.matches(cell)).count() as f64
}
