//! Criteria matching for COUNTIF
//!
//! A criteria is plain text. A cell matches when its text form contains the
//! criteria, ignoring case. Whitespace in the criteria is significant.
//! Empty cells never match.

use calcgraph_core::MaterialValue;

/// Criteria matcher for COUNTIF
#[derive(Debug, Clone)]
pub struct CriteriaMatcher {
    needle: String,
}

impl CriteriaMatcher {
    /// Create a new matcher
    pub fn new(criteria: &str) -> Self {
        Self {
            needle: criteria.to_lowercase(),
        }
    }

    /// Check if a cell matches
    pub fn matches(&self, value: &MaterialValue) -> bool {
        if value.is_empty() || self.needle.trim().is_empty() {
            return false;
        }
        value.as_text().to_lowercase().contains(&self.needle)
    }
}
