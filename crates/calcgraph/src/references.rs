//! Report reference rewriting

use crate::error::Result;
use calcgraph_core::{RecordId, Store};

/// Point every report that lists `old` at `new` instead.
///
/// Entries are replaced in place so report order is kept. Returns the number
/// of reports changed.
pub fn rewrite_report_references(store: &dyn Store, old: RecordId, new: RecordId) -> Result<usize> {
    if old == new {
        return Ok(0);
    }

    let mut changed = 0;
    for mut report in store.scan_reports(&|r| r.contains(old))? {
        if report.replace(old, new) > 0 {
            store.update_report(report)?;
            changed += 1;
        }
    }

    if changed > 0 {
        tracing::info!(%old, %new, reports = changed, "rewrote report references");
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcgraph_core::{MemoryStore, Report};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rewrite_preserves_order() {
        let store = MemoryStore::new();
        store
            .insert_report(Report::new("a", vec![RecordId(1), RecordId(2), RecordId(3)]))
            .unwrap();
        store
            .insert_report(Report::new("b", vec![RecordId(2)]))
            .unwrap();
        store
            .insert_report(Report::new("c", vec![RecordId(3)]))
            .unwrap();

        let changed = rewrite_report_references(&store, RecordId(2), RecordId(7)).unwrap();
        assert_eq!(changed, 2);
        assert_eq!(
            store.report("a").unwrap().unwrap().calculations,
            vec![RecordId(1), RecordId(7), RecordId(3)]
        );
        assert_eq!(
            store.report("b").unwrap().unwrap().calculations,
            vec![RecordId(7)]
        );
        assert_eq!(
            store.report("c").unwrap().unwrap().calculations,
            vec![RecordId(3)]
        );
    }

    #[test]
    fn test_rewrite_nothing_to_do() {
        let store = MemoryStore::new();
        store
            .insert_report(Report::new("a", vec![RecordId(1)]))
            .unwrap();
        assert_eq!(
            rewrite_report_references(&store, RecordId(5), RecordId(6)).unwrap(),
            0
        );
        assert_eq!(
            rewrite_report_references(&store, RecordId(1), RecordId(1)).unwrap(),
            0
        );
    }
}
