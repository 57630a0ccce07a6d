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

//! Query compiler
//!
//! This module turns a SELECT statement into a checked, arena-allocated
//! expression tree:
//!
//! - [`Lexer`] - tokenizer for the query text
//! - [`Parser`] - Pratt parser building the [`ExprArena`]
//! - [`ast`] - expression node and query types
//! - [`token`] - token types
//! - [`error`] - parser error types
//!
//! # Example
//!
//! ```
//! use streamsel::parser::parse_query;
//!
//! let query = parse_query("select _1, _2 from stdin where int(_1) > 1;").unwrap();
//! assert_eq!(query.projections.len(), 2);
//! assert!(query.predicate.is_some());
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod precedence;
pub mod token;

// Expression parsing is implemented as an impl block on Parser
mod expressions;

pub use ast::{
    ArithOp, ColumnRef, CompareOp, ExprArena, ExprId, ExprNode, FromClause, LogicalOp,
    ParsedQuery, Projection,
};
pub use error::ParseError;
pub use lexer::Lexer;
pub use parser::{contains_aggregate, Parser};
pub use precedence::Precedence;
pub use token::{is_keyword, is_operator, is_punctuator, Position, Token, TokenType, KEYWORDS};

use crate::core::{Error, Result};

/// Parse and semantically check one SELECT statement
///
/// This is the main entry point for compiling query text. Both grammar
/// mismatches and semantic violations (duplicate aliases, misplaced
/// aggregates) come back as compile-classified [`Error`] values; no
/// partially checked query is ever returned.
pub fn parse_query(input: &str) -> Result<ParsedQuery> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::syntax("line 1, column 1", "empty query"));
    }

    let mut parser = Parser::new(input);
    let mut query = parser.parse_statement()?;
    parser::validate(&mut query)?;
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_roundtrip() {
        let query = parse_query("select sum(int(_1)) from stdin;").unwrap();
        assert!(query.aggregate);
        assert_eq!(query.projections.len(), 1);
    }

    #[test]
    fn test_parse_query_empty() {
        let err = parse_query("  ").unwrap_err();
        assert!(err.is_compile_error());
    }

    #[test]
    fn test_parse_query_syntax_error_is_compile_error() {
        let err = parse_query("select from stdin").unwrap_err();
        assert!(err.is_compile_error());
    }
}
