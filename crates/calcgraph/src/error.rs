//! Error types for calcgraph

use calcgraph_core::{EntityKind, RecordId, StoreError};
use std::fmt;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Something that holds a reference to an entity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Referrer {
    /// Latest revision of a calculation, by unique id
    Calculation(String),
    /// A report, by name
    Report(String),
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Referrer::Calculation(uid) => write!(f, "calculation '{}'", uid),
            Referrer::Report(name) => write!(f, "report '{}'", name),
        }
    }
}

fn join(referrers: &[Referrer]) -> String {
    referrers
        .iter()
        .map(Referrer::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised by calcgraph operations
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed pointer, expression or input data
    #[error("Validation error: {0}")]
    Validation(#[from] calcgraph_core::Error),

    /// Entity is still referenced and cannot be deleted or re-identified
    #[error("{kind} '{unique_id}' is referenced by {}", join(.referrers))]
    Referenced {
        kind: EntityKind,
        unique_id: String,
        referrers: Vec<Referrer>,
    },

    /// Another writer created this version first; retry the edit
    #[error("Concurrent edit of calculation '{unique_id}': version {version} already exists")]
    ConcurrencyConflict { unique_id: String, version: u32 },

    /// The row the edit was based on is no longer the latest
    #[error("Calculation '{unique_id}' row {id} is no longer the latest revision")]
    StaleRevision { unique_id: String, id: RecordId },

    #[error("Calculation not found: {0}")]
    CalculationNotFound(String),

    #[error("Constant not found: {0}")]
    ConstantNotFound(String),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("{kind} '{unique_id}' already exists")]
    AlreadyExists { kind: EntityKind, unique_id: String },

    /// Store failure other than a version collision
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateVersion { unique_id, version } => {
                Error::ConcurrencyConflict { unique_id, version }
            }
            StoreError::DuplicateConstant(unique_id) => Error::AlreadyExists {
                kind: EntityKind::Constant,
                unique_id,
            },
            StoreError::ConstantNotFound(unique_id) => Error::ConstantNotFound(unique_id),
            StoreError::ReportNotFound(name) => Error::ReportNotFound(name),
            other => Error::Store(other),
        }
    }
}

impl Error {
    /// Check if retrying the whole edit may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ConcurrencyConflict { .. } | Error::StaleRevision { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_version_maps_to_conflict() {
        let err: Error = StoreError::DuplicateVersion {
            unique_id: "a".into(),
            version: 3,
        }
        .into();
        assert!(matches!(err, Error::ConcurrencyConflict { version: 3, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_referenced_message() {
        let err = Error::Referenced {
            kind: EntityKind::Constant,
            unique_id: "rate".into(),
            referrers: vec![
                Referrer::Calculation("margin".into()),
                Referrer::Report("q1".into()),
            ],
        };
        assert_eq!(
            err.to_string(),
            "constant 'rate' is referenced by calculation 'margin', report 'q1'"
        );
    }
}
