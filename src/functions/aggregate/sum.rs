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

//! sum aggregate function

use crate::core::Value;
use crate::functions::{
    AggregateFunction, FunctionDataType, FunctionInfo, FunctionSignature, FunctionType,
};

/// Sum state - stays integer until a float arrives
#[derive(Clone, Copy, Default)]
enum SumState {
    #[default]
    Empty,
    Integer(i64),
    Float(f64),
}

/// sum() - the sum of all non-NULL numeric values
///
/// Integer inputs keep an integer sum; any float input, or an integer
/// sum overflowing i64, promotes the whole sum to float. With no
/// accumulated values the result is NULL.
#[derive(Default)]
pub struct SumFunction {
    state: SumState,
}

impl AggregateFunction for SumFunction {
    fn name(&self) -> &str {
        "sum"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "sum",
            FunctionType::Aggregate,
            "Returns the sum of all non-NULL values",
            FunctionSignature::new(FunctionDataType::Any, vec![FunctionDataType::Any], 1, 1),
        )
    }

    fn accumulate(&mut self, value: &Value) {
        match value {
            Value::Integer(i) => {
                self.state = match self.state {
                    SumState::Empty => SumState::Integer(*i),
                    SumState::Integer(sum) => match sum.checked_add(*i) {
                        Some(total) => SumState::Integer(total),
                        None => SumState::Float(sum as f64 + *i as f64),
                    },
                    SumState::Float(sum) => SumState::Float(sum + *i as f64),
                };
            }
            Value::Float(f) => match &mut self.state {
                SumState::Empty => self.state = SumState::Float(*f),
                SumState::Integer(sum) => self.state = SumState::Float(*sum as f64 + f),
                SumState::Float(sum) => *sum += f,
            },
            // NULLs and non-numeric values are ignored
            _ => {}
        }
    }

    fn result(&self) -> Value {
        match &self.state {
            SumState::Empty => Value::null_unknown(),
            SumState::Integer(sum) => Value::Integer(*sum),
            SumState::Float(sum) => Value::Float(*sum),
        }
    }

    fn reset(&mut self) {
        self.state = SumState::Empty;
    }

    fn clone_box(&self) -> Box<dyn AggregateFunction> {
        Box::new(SumFunction::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_integers() {
        let mut sum = SumFunction::default();
        sum.accumulate(&Value::Integer(1));
        sum.accumulate(&Value::Integer(3));
        assert_eq!(sum.result(), Value::Integer(4));
    }

    #[test]
    fn test_sum_mixed_promotes_to_float() {
        let mut sum = SumFunction::default();
        sum.accumulate(&Value::Integer(1));
        sum.accumulate(&Value::Float(2.5));
        assert_eq!(sum.result(), Value::Float(3.5));
    }

    #[test]
    fn test_sum_overflow_promotes_to_float() {
        let mut sum = SumFunction::default();
        sum.accumulate(&Value::Integer(i64::MAX));
        sum.accumulate(&Value::Integer(1));
        assert_eq!(sum.result(), Value::Float(i64::MAX as f64 + 1.0));

        let mut sum = SumFunction::default();
        sum.accumulate(&Value::Integer(i64::MIN));
        sum.accumulate(&Value::Integer(-1));
        assert_eq!(sum.result(), Value::Float(i64::MIN as f64 - 1.0));
    }

    #[test]
    fn test_sum_ignores_null() {
        let mut sum = SumFunction::default();
        sum.accumulate(&Value::Integer(1));
        sum.accumulate(&Value::null_unknown());
        sum.accumulate(&Value::Integer(3));
        assert_eq!(sum.result(), Value::Integer(4));
    }

    #[test]
    fn test_sum_empty_is_null() {
        let sum = SumFunction::default();
        assert!(sum.result().is_null());
    }

    #[test]
    fn test_sum_reset() {
        let mut sum = SumFunction::default();
        sum.accumulate(&Value::Integer(7));
        sum.reset();
        assert!(sum.result().is_null());
    }
}
