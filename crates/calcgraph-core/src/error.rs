//! Error types for calcgraph-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Validation errors raised while decoding or checking model data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Pointer type tag is not one of the known variants
    #[error("Unknown pointer type: {0}")]
    UnknownPointerType(String),

    /// A field the variant requires is absent
    #[error("{kind} pointer is missing required field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// A field belonging to another variant is present
    #[error("{kind} pointer does not accept field '{field}'")]
    ForeignField {
        kind: &'static str,
        field: &'static str,
    },

    /// Literal pointer holds characters outside the arithmetic alphabet
    #[error("Invalid literal: '{0}'")]
    InvalidLiteral(String),

    /// Aggregate function name is not supported
    #[error("Unknown aggregate function: {0}")]
    UnknownAggregateFunction(String),

    /// Aggregate addresses a single cell instead of a row, column or sheet
    #[error("Aggregate over '{0}' cannot address a single cell; use a material cell pointer")]
    AmbiguousAggregateScope(String),

    /// Pointer at a given expression position failed to decode
    #[error("Pointer {index}: {source}")]
    PointerAt {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// Expression structure is not a valid arithmetic expression
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// Financial period could not be parsed or is inverted
    #[error("Invalid financial period: {0}")]
    InvalidPeriod(String),
}
