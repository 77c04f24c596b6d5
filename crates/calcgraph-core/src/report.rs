//! Reports: named lists of calculation rows

use crate::calculation::RecordId;
use serde::{Deserialize, Serialize};

/// A report lists concrete calculation rows by storage id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    #[serde(default)]
    pub calculations: Vec<RecordId>,
}

impl Report {
    pub fn new<S: Into<String>>(name: S, calculations: Vec<RecordId>) -> Self {
        Self {
            name: name.into(),
            calculations,
        }
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.calculations.contains(&id)
    }

    /// Replace every occurrence of `old` with `new` in place; returns the
    /// count. Other entries are left as they are, even if `new` is already
    /// listed.
    pub fn replace(&mut self, old: RecordId, new: RecordId) -> usize {
        let mut count = 0;
        for id in self.calculations.iter_mut().filter(|id| **id == old) {
            *id = new;
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_keeps_position() {
        let mut r = Report::new("q1", vec![RecordId(1), RecordId(2), RecordId(3)]);
        assert_eq!(r.replace(RecordId(2), RecordId(9)), 1);
        assert_eq!(r.calculations, vec![RecordId(1), RecordId(9), RecordId(3)]);
        assert_eq!(r.replace(RecordId(2), RecordId(10)), 0);
    }

    #[test]
    fn test_replace_touches_only_old_entries() {
        let mut r = Report::new("q1", vec![RecordId(1), RecordId(9), RecordId(1)]);
        assert_eq!(r.replace(RecordId(1), RecordId(9)), 2);
        assert_eq!(r.calculations, vec![RecordId(9), RecordId(9), RecordId(9)]);
    }
}
