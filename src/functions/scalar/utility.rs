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

//! NULL-handling utility functions

use std::cmp::Ordering;

use crate::core::{Result, Value};
use crate::functions::{
    FunctionDataType, FunctionInfo, FunctionSignature, FunctionType, ScalarFunction,
};

/// coalesce(a, b, ...) - the first non-NULL argument
#[derive(Default)]
pub struct CoalesceFunction;

impl ScalarFunction for CoalesceFunction {
    fn name(&self) -> &str {
        "coalesce"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "coalesce",
            FunctionType::Scalar,
            "Returns the first non-NULL argument",
            FunctionSignature::variadic(FunctionDataType::Any, FunctionDataType::Any),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        for arg in args {
            if !arg.is_null() {
                return Ok(arg.clone());
            }
        }
        Ok(Value::null_unknown())
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(CoalesceFunction)
    }
}

/// nullif(a, b) - NULL when the arguments are equal, otherwise the first
#[derive(Default)]
pub struct NullIfFunction;

impl ScalarFunction for NullIfFunction {
    fn name(&self) -> &str {
        "nullif"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "nullif",
            FunctionType::Scalar,
            "Returns NULL when both arguments are equal, otherwise the first",
            FunctionSignature::new(
                FunctionDataType::Any,
                vec![FunctionDataType::Any, FunctionDataType::Any],
                2,
                2,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        match args[0].compare(&args[1]) {
            Ok(Some(Ordering::Equal)) => Ok(Value::null_unknown()),
            _ => Ok(args[0].clone()),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(NullIfFunction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalesce() {
        let f = CoalesceFunction;
        let r = f
            .evaluate(&[
                Value::null_unknown(),
                Value::null_unknown(),
                Value::Integer(3),
            ])
            .unwrap();
        assert_eq!(r, Value::Integer(3));

        let r = f
            .evaluate(&[Value::null_unknown(), Value::null_unknown()])
            .unwrap();
        assert!(r.is_null());
    }

    #[test]
    fn test_nullif() {
        let f = NullIfFunction;
        assert!(f
            .evaluate(&[Value::Integer(5), Value::Integer(5)])
            .unwrap()
            .is_null());
        assert_eq!(
            f.evaluate(&[Value::Integer(5), Value::Integer(6)]).unwrap(),
            Value::Integer(5)
        );
        // NULL second argument never equals, so the first comes back
        assert_eq!(
            f.evaluate(&[Value::Integer(5), Value::null_unknown()])
                .unwrap(),
            Value::Integer(5)
        );
    }
}
