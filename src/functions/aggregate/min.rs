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

//! min aggregate function

use std::cmp::Ordering;

use crate::core::Value;
use crate::functions::{
    AggregateFunction, FunctionDataType, FunctionInfo, FunctionSignature, FunctionType,
};

/// min() - the smallest non-NULL value by the engine's comparison rules
///
/// Values that do not compare against the current minimum (mixed
/// incompatible kinds) are ignored. Empty input yields NULL.
#[derive(Default)]
pub struct MinFunction {
    current: Option<Value>,
}

impl AggregateFunction for MinFunction {
    fn name(&self) -> &str {
        "min"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "min",
            FunctionType::Aggregate,
            "Returns the minimum non-NULL value",
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
                if let Ok(Some(Ordering::Less)) = value.compare(current) {
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
        Box::new(MinFunction::default())
    }
}
