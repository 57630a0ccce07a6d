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

//! Cast functions
//!
//! Stream fields arrive as text; these casts give them numeric or string
//! types explicitly. A failed conversion is a recoverable per-row error,
//! not NULL.

use crate::core::{Error, Result, Value};
use crate::functions::{
    FunctionDataType, FunctionInfo, FunctionSignature, FunctionType, ScalarFunction,
};

/// int(value) - cast to 64-bit integer
///
/// Text is trimmed and parsed; a fractional text value truncates toward
/// zero. Floats truncate; booleans map to 0/1; timestamps give epoch
/// seconds.
#[derive(Default)]
pub struct IntCastFunction;

impl ScalarFunction for IntCastFunction {
    fn name(&self) -> &str {
        "int"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "int",
            FunctionType::Scalar,
            "Casts a value to a 64-bit integer",
            FunctionSignature::new(FunctionDataType::Integer, vec![FunctionDataType::Any], 1, 1),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        let value = &args[0];
        if value.is_null() {
            return Ok(Value::null_unknown());
        }
        match value.as_int64() {
            Some(v) => Ok(Value::Integer(v)),
            None => Err(Error::type_conversion(value.to_string(), "INTEGER")),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(IntCastFunction)
    }
}

/// float(value) - cast to 64-bit float
#[derive(Default)]
pub struct FloatCastFunction;

impl ScalarFunction for FloatCastFunction {
    fn name(&self) -> &str {
        "float"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "float",
            FunctionType::Scalar,
            "Casts a value to a 64-bit float",
            FunctionSignature::new(FunctionDataType::Float, vec![FunctionDataType::Any], 1, 1),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        let value = &args[0];
        if value.is_null() {
            return Ok(Value::null_unknown());
        }
        match value.as_float64() {
            Some(v) => Ok(Value::Float(v)),
            None => Err(Error::type_conversion(value.to_string(), "FLOAT")),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(FloatCastFunction)
    }
}

/// string(value) - cast to text through the value's display form
#[derive(Default)]
pub struct StringCastFunction;

impl ScalarFunction for StringCastFunction {
    fn name(&self) -> &str {
        "string"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "string",
            FunctionType::Scalar,
            "Casts a value to its text form",
            FunctionSignature::new(FunctionDataType::String, vec![FunctionDataType::Any], 1, 1),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        let value = &args[0];
        if value.is_null() {
            return Ok(Value::null_unknown());
        }
        Ok(Value::text(value.to_string()))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(StringCastFunction)
    }
}
