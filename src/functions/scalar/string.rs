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

//! String scalar functions

use crate::core::{Error, Result, Value};
use crate::functions::{
    FunctionDataType, FunctionInfo, FunctionSignature, FunctionType, ScalarFunction,
};

/// Extract the string content of an argument, coercing non-text values
/// through their display form; None for NULL
fn arg_string(value: &Value) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(value.to_string())
    }
}

/// substring(str, start [, length]) - 1-based character substring
///
/// Follows SQL semantics for out-of-range positions: a start before the
/// first character shortens the effective length instead of failing, and
/// a start past the end yields the empty string.
#[derive(Default)]
pub struct SubstringFunction;

impl ScalarFunction for SubstringFunction {
    fn name(&self) -> &str {
        "substring"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "substring",
            FunctionType::Scalar,
            "Returns a substring starting at a 1-based character position",
            FunctionSignature::new(
                FunctionDataType::String,
                vec![
                    FunctionDataType::String,
                    FunctionDataType::Integer,
                    FunctionDataType::Integer,
                ],
                2,
                3,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        let s = match arg_string(&args[0]) {
            Some(s) => s,
            None => return Ok(Value::null_unknown()),
        };
        let start = match args[1].as_int64() {
            Some(v) => v,
            None => return Ok(Value::null_unknown()),
        };
        let length = match args.get(2) {
            Some(v) if v.is_null() => return Ok(Value::null_unknown()),
            Some(v) => match v.as_int64() {
                Some(n) if n < 0 => {
                    return Err(Error::invalid_argument(
                        "substring length cannot be negative",
                    ))
                }
                Some(n) => Some(n),
                None => return Ok(Value::null_unknown()),
            },
            None => None,
        };

        let chars: Vec<char> = s.chars().collect();
        // 1-based start; positions before 1 eat into the length
        let (skip, take) = match length {
            Some(len) => {
                let end = start + len; // exclusive, 1-based
                let begin = start.max(1);
                let take = (end - begin).max(0) as usize;
                ((begin - 1) as usize, take)
            }
            None => ((start.max(1) - 1) as usize, usize::MAX),
        };

        let result: String = chars.into_iter().skip(skip).take(take).collect();
        Ok(Value::text(result))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(SubstringFunction)
    }
}

/// char_length(str) - number of characters
#[derive(Default)]
pub struct CharLengthFunction;

impl ScalarFunction for CharLengthFunction {
    fn name(&self) -> &str {
        "char_length"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "char_length",
            FunctionType::Scalar,
            "Returns the number of characters in a string",
            FunctionSignature::new(
                FunctionDataType::Integer,
                vec![FunctionDataType::String],
                1,
                1,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        match arg_string(&args[0]) {
            Some(s) => Ok(Value::Integer(s.chars().count() as i64)),
            None => Ok(Value::null_unknown()),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(CharLengthFunction)
    }
}

/// upper(str)
#[derive(Default)]
pub struct UpperFunction;

impl ScalarFunction for UpperFunction {
    fn name(&self) -> &str {
        "upper"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "upper",
            FunctionType::Scalar,
            "Converts a string to upper case",
            FunctionSignature::new(
                FunctionDataType::String,
                vec![FunctionDataType::String],
                1,
                1,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        match arg_string(&args[0]) {
            Some(s) => Ok(Value::text(s.to_uppercase())),
            None => Ok(Value::null_unknown()),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(UpperFunction)
    }
}

/// lower(str)
#[derive(Default)]
pub struct LowerFunction;

impl ScalarFunction for LowerFunction {
    fn name(&self) -> &str {
        "lower"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "lower",
            FunctionType::Scalar,
            "Converts a string to lower case",
            FunctionSignature::new(
                FunctionDataType::String,
                vec![FunctionDataType::String],
                1,
                1,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        match arg_string(&args[0]) {
            Some(s) => Ok(Value::text(s.to_lowercase())),
            None => Ok(Value::null_unknown()),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(LowerFunction)
    }
}

/// trim(str) - strip leading and trailing whitespace
#[derive(Default)]
pub struct TrimFunction;

impl ScalarFunction for TrimFunction {
    fn name(&self) -> &str {
        "trim"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "trim",
            FunctionType::Scalar,
            "Strips leading and trailing whitespace",
            FunctionSignature::new(
                FunctionDataType::String,
                vec![FunctionDataType::String],
                1,
                1,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        match arg_string(&args[0]) {
            Some(s) => Ok(Value::text(s.trim())),
            None => Ok(Value::null_unknown()),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(TrimFunction)
    }
}

/// ltrim(str) - strip leading whitespace
#[derive(Default)]
pub struct LtrimFunction;

impl ScalarFunction for LtrimFunction {
    fn name(&self) -> &str {
        "ltrim"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "ltrim",
            FunctionType::Scalar,
            "Strips leading whitespace",
            FunctionSignature::new(
                FunctionDataType::String,
                vec![FunctionDataType::String],
                1,
                1,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        match arg_string(&args[0]) {
            Some(s) => Ok(Value::text(s.trim_start())),
            None => Ok(Value::null_unknown()),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(LtrimFunction)
    }
}

/// rtrim(str) - strip trailing whitespace
#[derive(Default)]
pub struct RtrimFunction;

impl ScalarFunction for RtrimFunction {
    fn name(&self) -> &str {
        "rtrim"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "rtrim",
            FunctionType::Scalar,
            "Strips trailing whitespace",
            FunctionSignature::new(
                FunctionDataType::String,
                vec![FunctionDataType::String],
                1,
                1,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        match arg_string(&args[0]) {
            Some(s) => Ok(Value::text(s.trim_end())),
            None => Ok(Value::null_unknown()),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(RtrimFunction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_basic() {
        let f = SubstringFunction;
        let r = f
            .evaluate(&[Value::text("hello"), Value::Integer(2), Value::Integer(3)])
            .unwrap();
        assert_eq!(r, Value::text("ell"));
    }

    #[test]
    fn test_substring_no_length() {
        let f = SubstringFunction;
        let r = f.evaluate(&[Value::text("hello"), Value::Integer(3)]).unwrap();
        assert_eq!(r, Value::text("llo"));
    }

    #[test]
    fn test_substring_start_before_one() {
        let f = SubstringFunction;
        // start 0, length 3: effective characters 1..3 exclusive end
        let r = f
            .evaluate(&[Value::text("hello"), Value::Integer(0), Value::Integer(3)])
            .unwrap();
        assert_eq!(r, Value::text("he"));
    }

    #[test]
    fn test_substring_past_end() {
        let f = SubstringFunction;
        let r = f.evaluate(&[Value::text("hi"), Value::Integer(10)]).unwrap();
        assert_eq!(r, Value::text(""));
    }

    #[test]
    fn test_substring_negative_length_is_error() {
        let f = SubstringFunction;
        assert!(f
            .evaluate(&[Value::text("hi"), Value::Integer(1), Value::Integer(-1)])
            .is_err());
    }

    #[test]
    fn test_substring_null_propagates() {
        let f = SubstringFunction;
        let r = f
            .evaluate(&[Value::null_unknown(), Value::Integer(1)])
            .unwrap();
        assert!(r.is_null());
    }

    #[test]
    fn test_char_length() {
        let f = CharLengthFunction;
        assert_eq!(
            f.evaluate(&[Value::text("héllo")]).unwrap(),
            Value::Integer(5)
        );
    }

    #[test]
    fn test_case_and_trim() {
        assert_eq!(
            UpperFunction.evaluate(&[Value::text("abc")]).unwrap(),
            Value::text("ABC")
        );
        assert_eq!(
            LowerFunction.evaluate(&[Value::text("AbC")]).unwrap(),
            Value::text("abc")
        );
        assert_eq!(
            TrimFunction.evaluate(&[Value::text("  x ")]).unwrap(),
            Value::text("x")
        );
        assert_eq!(
            LtrimFunction.evaluate(&[Value::text("  x ")]).unwrap(),
            Value::text("x ")
        );
        assert_eq!(
            RtrimFunction.evaluate(&[Value::text("  x ")]).unwrap(),
            Value::text("  x")
        );
    }
}
