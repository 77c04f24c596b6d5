//! Reference tracking between calculations and constants

use calcgraph_core::{Calculation, EntityKind, PointerKind};
use std::collections::{BTreeMap, BTreeSet};

/// Unique key for a referenced entity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefKey {
    pub kind: EntityKind,
    pub unique_id: String,
}

impl RefKey {
    /// Create a new key
    pub fn new<S: Into<String>>(kind: EntityKind, unique_id: S) -> Self {
        Self {
            kind,
            unique_id: unique_id.into(),
        }
    }

    pub fn calculation<S: Into<String>>(unique_id: S) -> Self {
        Self::new(EntityKind::Calculation, unique_id)
    }

    pub fn constant<S: Into<String>>(unique_id: S) -> Self {
        Self::new(EntityKind::Constant, unique_id)
    }
}

/// Reference graph over calculations
///
/// Tracks which calculations reference which entities, so that deletes and
/// identity edits can be checked and cycles found without resolving anything.
#[derive(Debug, Default, Clone)]
pub struct ReferenceGraph {
    /// Entity → calculations that reference it
    referrers: BTreeMap<RefKey, BTreeSet<String>>,
    /// Calculation → entities it references
    references: BTreeMap<String, BTreeSet<RefKey>>,
}

impl ReferenceGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from calculation rows (normally the latest ones)
    pub fn from_calculations<'a, I>(calculations: I) -> Self
    where
        I: IntoIterator<Item = &'a Calculation>,
    {
        let mut graph = Self::new();
        for calc in calculations {
            graph.add_calculation(calc);
        }
        graph
    }

    /// Record every reference in a calculation's expression
    pub fn add_calculation(&mut self, calc: &Calculation) {
        for pointer in &calc.expression {
            let key = match &pointer.kind {
                PointerKind::ConstantRef { unique_id } => RefKey::constant(unique_id.as_str()),
                PointerKind::CalculationRef { unique_id } => {
                    RefKey::calculation(unique_id.as_str())
                }
                _ => continue,
            };
            self.add_reference(&calc.unique_id, key);
        }
    }

    /// Add a reference: `from` references `to`
    pub fn add_reference(&mut self, from: &str, to: RefKey) {
        self.referrers
            .entry(to.clone())
            .or_default()
            .insert(from.to_string());
        self.references
            .entry(from.to_string())
            .or_default()
            .insert(to);
    }

    /// Calculations referencing `key`, sorted by unique id
    pub fn referrers(&self, key: &RefKey) -> impl Iterator<Item = &str> + '_ {
        self.referrers
            .get(key)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Entities a calculation references directly
    pub fn references(&self, unique_id: &str) -> impl Iterator<Item = &RefKey> + '_ {
        self.references.get(unique_id).into_iter().flatten()
    }

    /// Check if anything references `key`
    pub fn is_referenced(&self, key: &RefKey) -> bool {
        self.referrers.get(key).map_or(false, |set| !set.is_empty())
    }

    /// Check if following calculation references from `unique_id` leads back
    /// to it
    pub fn has_cycle(&self, unique_id: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<&str> = self.calculation_targets(unique_id).collect();

        while let Some(current) = stack.pop() {
            if current == unique_id {
                return true;
            }
            if visited.insert(current) {
                stack.extend(self.calculation_targets(current));
            }
        }
        false
    }

    fn calculation_targets<'a>(&'a self, unique_id: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.references
            .get(unique_id)
            .into_iter()
            .flatten()
            .filter(|key| key.kind == EntityKind::Calculation)
            .map(|key| key.unique_id.as_str())
    }

    /// Number of calculations with at least one reference
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}
