//! Calculator configuration

use crate::error::Result;
use calcgraph_formula::ResolverOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for calculation runs
///
/// Loadable from JSON; missing fields take their defaults:
///
/// ```json
/// { "defaultLocation": "default", "fallbackToDefault": true, "includeNestedReasons": true }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculatorOptions {
    /// Constant fallback and nested reason handling
    #[serde(flatten)]
    pub resolution: ResolverOptions,
    /// Leave report rows whose id no longer exists out of the report result
    /// instead of listing them with a reason
    pub skip_missing_report_rows: bool,
}

impl CalculatorOptions {
    /// Read options from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CalculatorOptions::default();
        assert_eq!(options.resolution.default_location, "default");
        assert!(options.resolution.fallback_to_default);
        assert!(options.resolution.include_nested_reasons);
        assert!(!options.skip_missing_report_rows);
    }

    #[test]
    fn test_partial_json() {
        let options: CalculatorOptions =
            serde_json::from_str(r#"{"defaultLocation":"global","skipMissingReportRows":true}"#)
                .unwrap();
        assert_eq!(options.resolution.default_location, "global");
        assert!(options.resolution.fallback_to_default);
        assert!(options.skip_missing_report_rows);
    }
}
