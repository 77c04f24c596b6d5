//! Formula error types
//!
//! Display strings double as the reasons attached to an `ERROR!` result, so
//! they are lowercase and stable.

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while parsing or evaluating a literal expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("empty expression")]
    EmptyExpression,

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("parentheses nested deeper than {limit} at position {position}")]
    NestingTooDeep { limit: usize, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },

    #[error("division by zero")]
    DivisionByZero,

    /// Overflow to infinity or NaN
    #[error("result is not finite")]
    NonFinite,
}
