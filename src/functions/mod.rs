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

//! Query function system
//!
//! This module provides the functions callable from query text:
//!
//! - [`ScalarFunction`] - per-row functions (substring, int, extract, ...)
//! - [`AggregateFunction`] - whole-stream functions (sum, count, min, max, avg)
//! - [`FunctionRegistry`] - name to factory lookup
//!
//! Aggregate instances are stateful: the executor creates one instance per
//! call site, feeds it a value per accumulated row, and reads the result
//! exactly once when the stream ends.

pub mod aggregate;
pub mod registry;
pub mod scalar;

use crate::core::{Error, Result, Value};

/// Function type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    /// Aggregate function (accumulates across rows)
    Aggregate,
    /// Scalar function (operates on a single row)
    Scalar,
}

/// Data type for function signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionDataType {
    /// Any type
    Any,
    /// Integer type
    Integer,
    /// Float type
    Float,
    /// String type
    String,
    /// Boolean type
    Boolean,
    /// Timestamp type
    Timestamp,
}

/// Function signature information
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    /// Return type
    pub return_type: FunctionDataType,
    /// Argument types
    pub argument_types: Vec<FunctionDataType>,
    /// Minimum number of arguments
    pub min_args: usize,
    /// Maximum number of arguments
    pub max_args: usize,
}

impl FunctionSignature {
    /// Create a new function signature
    pub fn new(
        return_type: FunctionDataType,
        argument_types: Vec<FunctionDataType>,
        min_args: usize,
        max_args: usize,
    ) -> Self {
        Self {
            return_type,
            argument_types,
            min_args,
            max_args,
        }
    }

    /// Create a variadic signature with no upper argument bound
    pub fn variadic(return_type: FunctionDataType, arg_type: FunctionDataType) -> Self {
        Self {
            return_type,
            argument_types: vec![arg_type],
            min_args: 1,
            max_args: usize::MAX,
        }
    }

    /// Validate the argument count at a call site
    pub fn validate_arg_count(&self, name: &str, count: usize) -> Result<()> {
        if count < self.min_args || count > self.max_args {
            return Err(Error::WrongArity {
                name: name.to_string(),
                min: self.min_args,
                max: self.max_args,
                got: count,
            });
        }
        Ok(())
    }
}

/// Function information
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    /// Function name (lower-case, as written in queries)
    pub name: String,
    /// Function type
    pub function_type: FunctionType,
    /// Description
    pub description: String,
    /// Signature
    pub signature: FunctionSignature,
}

impl FunctionInfo {
    /// Create a new function info
    pub fn new(
        name: impl Into<String>,
        function_type: FunctionType,
        description: impl Into<String>,
        signature: FunctionSignature,
    ) -> Self {
        Self {
            name: name.into(),
            function_type,
            description: description.into(),
            signature,
        }
    }
}

/// Trait for scalar functions
pub trait ScalarFunction: Send + Sync {
    /// Get the function name
    fn name(&self) -> &str;

    /// Get function information
    fn info(&self) -> FunctionInfo;

    /// Evaluate the function with the given arguments
    fn evaluate(&self, args: &[Value]) -> Result<Value>;

    /// Clone the function into a new instance
    fn clone_box(&self) -> Box<dyn ScalarFunction>;
}

/// Trait for aggregate functions
pub trait AggregateFunction: Send + Sync {
    /// Get the function name
    fn name(&self) -> &str;

    /// Get function information
    fn info(&self) -> FunctionInfo;

    /// Accumulate one row's value; NULL values are ignored
    fn accumulate(&mut self, value: &Value);

    /// Get the final result
    fn result(&self) -> Value;

    /// Reset the aggregate state
    fn reset(&mut self);

    /// Clone the function into a fresh instance
    fn clone_box(&self) -> Box<dyn AggregateFunction>;
}

/// Check whether a name resolves to an aggregate function
///
/// Used by the semantic pass; matching is case-insensitive like every
/// registry lookup.
pub fn is_aggregate_name(name: &str) -> bool {
    registry::global_registry().is_aggregate(name)
}

// Re-export main types
pub use aggregate::{AvgFunction, CountFunction, MaxFunction, MinFunction, SumFunction};
pub use registry::{global_registry, FunctionRegistry};
pub use scalar::{
    CharLengthFunction, CoalesceFunction, DateAddFunction, DateDiffFunction, ExtractFunction,
    FloatCastFunction, IntCastFunction, LowerFunction, LtrimFunction, NullIfFunction,
    RtrimFunction, StringCastFunction, SubstringFunction, ToTimestampFunction, TrimFunction,
    UpperFunction, UtcNowFunction,
};
