//! Constants: numeric values per location

use crate::entity::IdentityFields;
use serde::{Deserialize, Serialize};

/// Value of a constant at one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub location: String,
    pub value: f64,
}

impl Sample {
    pub fn new<S: Into<String>>(location: S, value: f64) -> Self {
        Self {
            location: location.into(),
            value,
        }
    }
}

/// A named constant with one sample per location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constant {
    pub unique_id: String,
    pub year: i32,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl Constant {
    pub fn new<S: Into<String>, U: Into<String>>(unique_id: S, year: i32, unit: U) -> Self {
        Self {
            unique_id: unique_id.into(),
            year,
            unit: unit.into(),
            remarks: None,
            samples: Vec::new(),
        }
    }

    /// Add a sample (builder style)
    pub fn with_sample<S: Into<String>>(mut self, location: S, value: f64) -> Self {
        self.samples.push(Sample::new(location, value));
        self
    }

    /// Sample at exactly this location
    pub fn sample_for(&self, location: &str) -> Option<&Sample> {
        self.samples.iter().find(|s| s.location == location)
    }

    /// Sample at `location`, else at `default` when given
    pub fn resolve(&self, location: &str, default: Option<&str>) -> Option<&Sample> {
        self.sample_for(location)
            .or_else(|| default.and_then(|d| self.sample_for(d)))
    }

    /// Fields that may not change while the constant is referenced
    pub fn identity(&self) -> IdentityFields {
        IdentityFields {
            unique_id: self.unique_id.clone(),
            unit: self.unit.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_exact_location() {
        let c = Constant::new("rate", 2024, "%")
            .with_sample("default", 1.0)
            .with_sample("berlin", 2.0);
        assert_eq!(c.resolve("berlin", Some("default")).unwrap().value, 2.0);
        assert_eq!(c.resolve("paris", Some("default")).unwrap().value, 1.0);
        assert!(c.resolve("paris", None).is_none());
    }

    #[test]
    fn test_deserialize_without_samples() {
        let c: Constant =
            serde_json::from_str(r#"{"uniqueId":"x","year":2023,"unit":"kg"}"#).unwrap();
        assert!(c.samples.is_empty());
        assert_eq!(c.remarks, None);
    }
}
