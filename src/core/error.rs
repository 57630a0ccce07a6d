// Copyright 2025 Streamsel Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for Streamsel
//!
//! This module defines all error types used throughout the engine.
//! Compile-time errors (syntax, semantic) are always fatal to the parse.
//! Run-time evaluation errors are recoverable per row unless classified
//! fatal; format errors abort the run.

use thiserror::Error;

/// Result type alias for Streamsel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Streamsel operations
///
/// This enum covers all error cases including both sentinel errors
/// and structured errors with context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Syntax errors
    // =========================================================================
    /// Grammar mismatch while parsing the query text
    #[error("syntax error at {position}: {message}")]
    Syntax { position: String, message: String },

    // =========================================================================
    // Semantic errors
    // =========================================================================
    /// Alias name used more than once in the same query
    #[error("alias '{0}' is already used in query")]
    DuplicateAlias(String),

    /// Alias name collides with a schema column
    #[error("alias '{0}' collides with a schema column of the same name")]
    AliasShadowsColumn(String),

    /// Aggregate call nested inside another aggregate call
    #[error("nested aggregation function is illegal, e.g. sum(...sum...)")]
    NestedAggregate,

    /// Projection mixes a bare column reference with an aggregate call
    #[error("illegal expression: mixing a column reference with an aggregate, e.g. sum(c1) + c1")]
    ColumnBesideAggregate,

    /// Aggregate call in the WHERE clause
    #[error("aggregation function is illegal in the WHERE clause")]
    AggregateInPredicate,

    /// Wrong number of arguments for a function
    #[error("function '{name}' expects between {min} and {max} arguments, got {got}")]
    WrongArity {
        name: String,
        min: usize,
        max: usize,
        got: usize,
    },

    // =========================================================================
    // Evaluation errors (recoverable unless noted)
    // =========================================================================
    /// Column not found in the current row
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Column position out of bounds for the current row
    #[error("column position {0} out of bounds")]
    ColumnPositionOutOfBounds(usize),

    /// Cannot compare incompatible types
    #[error("cannot compare incompatible types {0} and {1}")]
    IncomparableTypes(&'static str, &'static str),

    /// Type conversion error
    #[error("type conversion error: cannot convert {from} to {to}")]
    TypeConversion { from: String, to: String },

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Invalid argument for function
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Expression evaluation failed with message
    #[error("expression evaluation failed: {message}")]
    Evaluation { message: String },

    // =========================================================================
    // Fatal run-time errors
    // =========================================================================
    /// Alias definitions reference each other in a cycle
    #[error("cyclic reference while resolving alias '{0}'")]
    CyclicAlias(String),

    /// Function name does not resolve in the registry
    #[error("function '{0}' not found")]
    UnknownFunction(String),

    /// Per-row token list exceeded the caller-supplied capacity
    #[error("row has more than {0} columns")]
    TokenCapacityExceeded(usize),

    /// Too many recoverable errors for one run
    #[error("error count exceeded the limit of {0} for this run")]
    ErrorLimitReached(usize),

    /// Processing continued after aggregate finalization
    #[error("cannot stream row data after aggregate finalization")]
    RowAfterFinalize,

    // =========================================================================
    // Format errors (always fatal)
    // =========================================================================
    /// Malformed delimited-text input
    #[error("malformed delimited input at byte {offset}: {message}")]
    CsvFormat { offset: usize, message: String },

    /// Malformed JSON input
    #[error("malformed JSON at byte {offset}: {message}")]
    JsonFormat { offset: usize, message: String },

    /// Internal error for unexpected conditions
    #[error("{message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new Syntax error
    pub fn syntax(position: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Syntax {
            position: position.into(),
            message: message.into(),
        }
    }

    /// Create a new TypeConversion error
    pub fn type_conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Error::TypeConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a new Evaluation error
    pub fn evaluation(message: impl Into<String>) -> Self {
        Error::Evaluation {
            message: message.into(),
        }
    }

    /// Create a new InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Create a new CsvFormat error
    pub fn csv_format(offset: usize, message: impl Into<String>) -> Self {
        Error::CsvFormat {
            offset,
            message: message.into(),
        }
    }

    /// Create a new JsonFormat error
    pub fn json_format(offset: usize, message: impl Into<String>) -> Self {
        Error::JsonFormat {
            offset,
            message: message.into(),
        }
    }

    /// Check if this is a compile-time (syntax or semantic) error
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            Error::Syntax { .. }
                | Error::DuplicateAlias(_)
                | Error::AliasShadowsColumn(_)
                | Error::NestedAggregate
                | Error::ColumnBesideAggregate
                | Error::AggregateInPredicate
                | Error::WrongArity { .. }
        )
    }

    /// Check if this error aborts the whole run
    ///
    /// Recoverable errors abandon the current row and resume at the next
    /// row boundary; fatal errors stop processing immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::CyclicAlias(_)
                | Error::UnknownFunction(_)
                | Error::TokenCapacityExceeded(_)
                | Error::ErrorLimitReached(_)
                | Error::RowAfterFinalize
                | Error::CsvFormat { .. }
                | Error::JsonFormat { .. }
                | Error::Internal { .. }
        ) || self.is_compile_error()
    }

    /// Check if a failed row may be skipped and processing resumed
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::ColumnNotFound("price".to_string()).to_string(),
            "column 'price' not found"
        );
        assert_eq!(
            Error::DuplicateAlias("a1".to_string()).to_string(),
            "alias 'a1' is already used in query"
        );
        assert_eq!(Error::DivisionByZero.to_string(), "division by zero");
        assert_eq!(
            Error::UnknownFunction("frobnicate".to_string()).to_string(),
            "function 'frobnicate' not found"
        );
    }

    #[test]
    fn test_structured_error_display() {
        let err = Error::type_conversion("TEXT", "TIMESTAMP");
        assert_eq!(
            err.to_string(),
            "type conversion error: cannot convert TEXT to TIMESTAMP"
        );

        let err = Error::csv_format(17, "unterminated quoted field");
        assert_eq!(
            err.to_string(),
            "malformed delimited input at byte 17: unterminated quoted field"
        );

        let err = Error::syntax("line 1, column 8", "expected FROM");
        assert_eq!(err.to_string(), "syntax error at line 1, column 8: expected FROM");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::syntax("line 1, column 1", "x").is_compile_error());
        assert!(Error::NestedAggregate.is_compile_error());
        assert!(!Error::DivisionByZero.is_compile_error());

        assert!(Error::CyclicAlias("a".to_string()).is_fatal());
        assert!(Error::json_format(0, "x").is_fatal());
        assert!(Error::DivisionByZero.is_recoverable());
        assert!(Error::ColumnNotFound("c".to_string()).is_recoverable());
        assert!(!Error::TokenCapacityExceeded(128).is_recoverable());
    }
}
