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

//! count aggregate function

use crate::core::Value;
use crate::functions::{
    AggregateFunction, FunctionDataType, FunctionInfo, FunctionSignature, FunctionType,
};

/// count() - the number of accumulated non-NULL values
///
/// For `count(*)` and bare `count()` the executor feeds a constant TRUE
/// per row, so every row counts. The result over zero rows is 0, not NULL.
#[derive(Default)]
pub struct CountFunction {
    count: i64,
}

impl AggregateFunction for CountFunction {
    fn name(&self) -> &str {
        "count"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "count",
            FunctionType::Aggregate,
            "Returns the number of non-NULL values, or of rows for count(*)",
            FunctionSignature::new(FunctionDataType::Integer, vec![FunctionDataType::Any], 0, 1),
        )
    }

    fn accumulate(&mut self, value: &Value) {
        if !value.is_null() {
            self.count += 1;
        }
    }

    fn result(&self) -> Value {
        Value::Integer(self.count)
    }

    fn reset(&mut self) {
        self.count = 0;
    }

    fn clone_box(&self) -> Box<dyn AggregateFunction> {
        Box::new(CountFunction::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_values() {
        let mut count = CountFunction::default();
        count.accumulate(&Value::Integer(1));
        count.accumulate(&Value::text("x"));
        assert_eq!(count.result(), Value::Integer(2));
    }

    #[test]
    fn test_count_skips_null() {
        let mut count = CountFunction::default();
        count.accumulate(&Value::Integer(1));
        count.accumulate(&Value::null_unknown());
        assert_eq!(count.result(), Value::Integer(1));
    }

    #[test]
    fn test_count_empty_is_zero() {
        let count = CountFunction::default();
        assert_eq!(count.result(), Value::Integer(0));
    }
}
