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

//! # Streamsel - embedded streaming SELECT engine
//!
//! Streamsel executes a SQL-subset SELECT statement over one logically
//! unbounded stream of delimited-text or JSON records without ever
//! materializing the stream. A caller (typically an object-storage gateway)
//! pushes successive byte chunks of an object body and pulls back successive
//! chunks of formatted result rows. Rows may straddle chunk boundaries;
//! aggregate and non-aggregate projections are supported; LIMIT is honored.
//!
//! ## Quick Start
//!
//! ```rust
//! use streamsel::api::{CsvOptions, CsvScan, Query};
//!
//! let query = Query::parse("select _1, _2 from stdin where int(_1) > 1;").unwrap();
//! let mut scan = CsvScan::new(query, CsvOptions::default()).unwrap();
//!
//! let mut out = String::new();
//! scan.process_chunk(b"1,2\n3,4\n", true, &mut out).unwrap();
//! assert_eq!(out, "3,4\n");
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Public query interface ([`api::Query`], [`api::CsvScan`], [`api::JsonScan`])
//! - [`common`] - Version information
//! - [`core`] - Core types ([`DataType`], [`Value`], [`Error`])
//! - [`parser`] - SELECT-subset parser producing an arena-allocated AST
//! - [`functions`] - Scalar and aggregate SQL functions
//! - [`csv`] - Delimited-text row/column tokenizer
//! - [`json`] - Incremental JSON event decoder and path matchers
//! - [`executor`] - Row-driving evaluation loop

pub mod api;
pub mod common;
pub mod core;
pub mod csv;
pub mod executor;
pub mod functions;
pub mod json;
pub mod parser;

// Re-export main types for convenience
pub use common::{version_info, GIT_COMMIT, VERSION};

pub use core::{DataType, Error, Result, RowContext, Value};

pub use parser::{ColumnRef, ExprArena, ExprId, ExprNode, ParsedQuery};

pub use functions::{
    AggregateFunction, FunctionDataType, FunctionInfo, FunctionRegistry, FunctionSignature,
    FunctionType, ScalarFunction,
};

pub use csv::{CsvEvent, CsvTokenizer, CsvTokenizerState, FieldSpan};

pub use json::{JsonDecoder, JsonEvent, PathMatcher, PathSegment};

pub use executor::{Evaluator, OutputFormat, OutputOptions, RecordWriter, RowSource};

pub use api::{CsvOptions, CsvScan, JsonOptions, JsonScan, Query, ScanStatus};
