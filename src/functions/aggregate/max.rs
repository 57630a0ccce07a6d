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

//! max aggregate function

use std::cmp::Ordering;

use crate::core::Value;
use crate::functions::{
    AggregateFunction, FunctionDataType, FunctionInfo, FunctionSignature, FunctionType,
};

/// max() - the largest non-NULL value by the engine's comparison rules
#[derive(Default)]
pub struct MaxFunction {
    current: Option<Value>,
}

impl AggregateFunction for MaxFunction {
    fn name(&self) -> &str {
        "max"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "max",
            FunctionType::Aggregate,
            "Returns the maximum non-NULL value",
            FunctionSignature::new(FunctionDataType::Any, vec![FunctionDataType::Any], 1, 1),
        )
    }

    fn accumulate(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        match &self.current {
            None => self.current = Some(value.clone()),
            Some(current) => {
                if let Ok(Some(Ordering::Greater)) = value.compare(current) {
                    self.current = Some(value.clone());
                }
            }
        }
    }

    fn result(&self) -> Value {
        self.current.clone().unwrap_or_else(Value::null_unknown)
    }

    fn reset(&mut self) {
        self.current = None;
    }

    fn clone_box(&self) -> Box<dyn AggregateFunction> {
        Box::new(MaxFunction::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_integers() {
        let mut max = MaxFunction::default();
        max.accumulate(&Value::Integer(5));
        max.accumulate(&Value::Integer(12));
        max.accumulate(&Value::Integer(8));
        assert_eq!(max.result(), Value::Integer(12));
    }

    #[test]
    fn test_max_skips_null() {
        let mut max = MaxFunction::default();
        max.accumulate(&Value::null_unknown());
        max.accumulate(&Value::Integer(1));
        assert_eq!(max.result(), Value::Integer(1));
    }

    #[test]
    fn test_max_empty_is_null() {
        let max = MaxFunction::default();
        assert!(max.result().is_null());
    }
}
