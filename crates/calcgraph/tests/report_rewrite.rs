//! Report reference rewriting after version bumps

use calcgraph::prelude::*;
use calcgraph::rewrite_report_references;
use pretty_assertions::assert_eq;

fn data(value: &str) -> CalculationData {
    CalculationData::new("USD", vec![Pointer::literal(value)])
}

#[test]
fn test_bump_rewrites_reports_in_order() {
    let store = MemoryStore::new();
    let manager = VersionManager::new(&store);
    let first = manager.create_calculation("first", data("1")).unwrap();
    let target = manager.create_calculation("target", data("2")).unwrap();
    let last = manager.create_calculation("last", data("3")).unwrap();

    store
        .insert_report(Report::new("annual", vec![first, target, last]))
        .unwrap();
    store
        .insert_report(Report::new("summary", vec![target]))
        .unwrap();
    store
        .insert_report(Report::new("other", vec![first]))
        .unwrap();

    let outcome = manager.edit_calculation("target", data("20")).unwrap();
    let EditOutcome::Versioned {
        previous,
        current,
        version,
        reports_rewritten,
    } = outcome
    else {
        panic!("expected a new version, got {:?}", outcome);
    };
    assert_eq!(previous, target);
    assert_eq!(version, 2);
    assert_eq!(reports_rewritten, 2);

    assert_eq!(
        store.report("annual").unwrap().unwrap().calculations,
        vec![first, current, last]
    );
    assert_eq!(
        store.report("summary").unwrap().unwrap().calculations,
        vec![current]
    );
    assert_eq!(
        store.report("other").unwrap().unwrap().calculations,
        vec![first]
    );

    let history = manager.history("target").unwrap();
    assert!(!history[0].latest);
    assert!(history[1].latest);
}

#[test]
fn test_rewritten_report_evaluates_new_version() {
    let store = MemoryStore::new();
    let manager = VersionManager::new(&store);
    let id = manager.create_calculation("revenue", data("100")).unwrap();
    store
        .insert_report(Report::new("q1", vec![id]))
        .unwrap();

    manager.edit_calculation("revenue", data("150")).unwrap();

    let materials = MemoryMaterials::new();
    let company = CompanyContext::new("acme", "2024".parse().unwrap(), "berlin");
    let result = Calculator::new(&store, &materials)
        .evaluate_report(&company, "q1")
        .unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].version, Some(2));
    assert_eq!(result.rows[0].evaluation.value, CalcValue::Number(150.0));
    assert!(result.rows[0].evaluation.reasons.is_empty());
}

#[test]
fn test_rewrite_counts_reports_not_entries() {
    let store = MemoryStore::new();
    store
        .insert_report(Report::new("dup", vec![RecordId(1), RecordId(2), RecordId(1)]))
        .unwrap();
    assert_eq!(
        rewrite_report_references(&store, RecordId(1), RecordId(5)).unwrap(),
        1
    );
    assert_eq!(
        store.report("dup").unwrap().unwrap().calculations,
        vec![RecordId(5), RecordId(2), RecordId(5)]
    );
}
