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

//! Date/time scalar functions

use chrono::{DateTime, Datelike, Months, TimeDelta, Timelike, Utc};

use crate::core::{Error, Result, Value};
use crate::functions::{
    FunctionDataType, FunctionInfo, FunctionSignature, FunctionType, ScalarFunction,
};

/// Coerce an argument to a timestamp; None for NULL
fn arg_timestamp(value: &Value) -> Result<Option<DateTime<Utc>>> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_timestamp()
        .map(Some)
        .ok_or_else(|| Error::type_conversion(value.to_string(), "TIMESTAMP"))
}

/// Coerce an argument to a date-part name; None for NULL
fn arg_part(value: &Value) -> Result<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    match value.as_str() {
        Some(s) => Ok(Some(s.to_lowercase())),
        None => Err(Error::invalid_argument("date part must be a string")),
    }
}

/// to_timestamp(text) - parse a timestamp from text
#[derive(Default)]
pub struct ToTimestampFunction;

impl ScalarFunction for ToTimestampFunction {
    fn name(&self) -> &str {
        "to_timestamp"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "to_timestamp",
            FunctionType::Scalar,
            "Parses a timestamp from text",
            FunctionSignature::new(
                FunctionDataType::Timestamp,
                vec![FunctionDataType::String],
                1,
                1,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        match arg_timestamp(&args[0])? {
            Some(ts) => Ok(Value::Timestamp(ts)),
            None => Ok(Value::null_unknown()),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(ToTimestampFunction)
    }
}

/// extract(part, ts) - a named component of a timestamp
///
/// Parts: year, month, day, hour, minute, second, week (ISO week number),
/// timezone_hour and timezone_minute are always 0 for the UTC-normalized
/// values this engine carries.
#[derive(Default)]
pub struct ExtractFunction;

impl ScalarFunction for ExtractFunction {
    fn name(&self) -> &str {
        "extract"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "extract",
            FunctionType::Scalar,
            "Extracts a named component from a timestamp",
            FunctionSignature::new(
                FunctionDataType::Integer,
                vec![FunctionDataType::String, FunctionDataType::Timestamp],
                2,
                2,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        let part = match arg_part(&args[0])? {
            Some(p) => p,
            None => return Ok(Value::null_unknown()),
        };
        let ts = match arg_timestamp(&args[1])? {
            Some(ts) => ts,
            None => return Ok(Value::null_unknown()),
        };

        let result = match part.as_str() {
            "year" => ts.year() as i64,
            "month" => ts.month() as i64,
            "day" => ts.day() as i64,
            "hour" => ts.hour() as i64,
            "minute" => ts.minute() as i64,
            "second" => ts.second() as i64,
            "week" => ts.iso_week().week() as i64,
            "timezone_hour" | "timezone_minute" => 0,
            other => {
                return Err(Error::invalid_argument(format!(
                    "unknown date part '{}'",
                    other
                )))
            }
        };
        Ok(Value::Integer(result))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(ExtractFunction)
    }
}

/// date_add(part, count, ts) - shift a timestamp by whole units
#[derive(Default)]
pub struct DateAddFunction;

impl ScalarFunction for DateAddFunction {
    fn name(&self) -> &str {
        "date_add"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "date_add",
            FunctionType::Scalar,
            "Adds a signed number of date units to a timestamp",
            FunctionSignature::new(
                FunctionDataType::Timestamp,
                vec![
                    FunctionDataType::String,
                    FunctionDataType::Integer,
                    FunctionDataType::Timestamp,
                ],
                3,
                3,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        let part = match arg_part(&args[0])? {
            Some(p) => p,
            None => return Ok(Value::null_unknown()),
        };
        let count = match args[1].as_int64() {
            Some(n) => n,
            None => return Ok(Value::null_unknown()),
        };
        let ts = match arg_timestamp(&args[2])? {
            Some(ts) => ts,
            None => return Ok(Value::null_unknown()),
        };

        let shifted = match part.as_str() {
            "year" | "month" => {
                let months = if part == "year" {
                    count.checked_mul(12)
                } else {
                    Some(count)
                }
                .ok_or_else(|| Error::invalid_argument("date_add count out of range"))?;
                let magnitude = u32::try_from(months.unsigned_abs())
                    .map_err(|_| Error::invalid_argument("date_add count out of range"))?;
                let result = if months >= 0 {
                    ts.checked_add_months(Months::new(magnitude))
                } else {
                    ts.checked_sub_months(Months::new(magnitude))
                };
                result.ok_or_else(|| Error::invalid_argument("date_add result out of range"))?
            }
            "day" | "hour" | "minute" | "second" => {
                let delta = match part.as_str() {
                    "day" => TimeDelta::try_days(count),
                    "hour" => TimeDelta::try_hours(count),
                    "minute" => TimeDelta::try_minutes(count),
                    _ => TimeDelta::try_seconds(count),
                }
                .ok_or_else(|| Error::invalid_argument("date_add count out of range"))?;
                ts.checked_add_signed(delta)
                    .ok_or_else(|| Error::invalid_argument("date_add result out of range"))?
            }
            other => {
                return Err(Error::invalid_argument(format!(
                    "unknown date part '{}'",
                    other
                )))
            }
        };
        Ok(Value::Timestamp(shifted))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(DateAddFunction)
    }
}

/// date_diff(part, ts1, ts2) - signed whole units from ts1 to ts2
#[derive(Default)]
pub struct DateDiffFunction;

impl ScalarFunction for DateDiffFunction {
    fn name(&self) -> &str {
        "date_diff"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "date_diff",
            FunctionType::Scalar,
            "Returns the signed number of whole date units between two timestamps",
            FunctionSignature::new(
                FunctionDataType::Integer,
                vec![
                    FunctionDataType::String,
                    FunctionDataType::Timestamp,
                    FunctionDataType::Timestamp,
                ],
                3,
                3,
            ),
        )
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        let part = match arg_part(&args[0])? {
            Some(p) => p,
            None => return Ok(Value::null_unknown()),
        };
        let (a, b) = match (arg_timestamp(&args[1])?, arg_timestamp(&args[2])?) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(Value::null_unknown()),
        };

        let delta = b.signed_duration_since(a);
        let result = match part.as_str() {
            "year" => (b.year() - a.year()) as i64,
            "month" => (b.year() - a.year()) as i64 * 12 + (b.month() as i64 - a.month() as i64),
            "day" => delta.num_days(),
            "hour" => delta.num_hours(),
            "minute" => delta.num_minutes(),
            "second" => delta.num_seconds(),
            other => {
                return Err(Error::invalid_argument(format!(
                    "unknown date part '{}'",
                    other
                )))
            }
        };
        Ok(Value::Integer(result))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(DateDiffFunction)
    }
}

/// utcnow() - the current UTC timestamp
#[derive(Default)]
pub struct UtcNowFunction;

impl ScalarFunction for UtcNowFunction {
    fn name(&self) -> &str {
        "utcnow"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "utcnow",
            FunctionType::Scalar,
            "Returns the current UTC timestamp",
            FunctionSignature::new(FunctionDataType::Timestamp, vec![], 0, 0),
        )
    }

    fn evaluate(&self, _args: &[Value]) -> Result<Value> {
        Ok(Value::Timestamp(Utc::now()))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(UtcNowFunction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse_timestamp;

    fn ts(s: &str) -> Value {
        Value::Timestamp(parse_timestamp(s).unwrap())
    }

    #[test]
    fn test_to_timestamp() {
        let f = ToTimestampFunction;
        let r = f.evaluate(&[Value::text("2023-05-04T10:20:30Z")]).unwrap();
        assert!(matches!(r, Value::Timestamp(_)));
        assert!(f.evaluate(&[Value::text("garbage")]).is_err());
    }

    #[test]
    fn test_extract_parts() {
        let f = ExtractFunction;
        let t = ts("2023-05-04T10:20:30Z");
        assert_eq!(
            f.evaluate(&[Value::text("year"), t.clone()]).unwrap(),
            Value::Integer(2023)
        );
        assert_eq!(
            f.evaluate(&[Value::text("month"), t.clone()]).unwrap(),
            Value::Integer(5)
        );
        assert_eq!(
            f.evaluate(&[Value::text("minute"), t.clone()]).unwrap(),
            Value::Integer(20)
        );
        assert!(f.evaluate(&[Value::text("eon"), t]).is_err());
    }

    #[test]
    fn test_extract_parses_text_timestamp() {
        let f = ExtractFunction;
        let r = f
            .evaluate(&[Value::text("year"), Value::text("2021-02-03")])
            .unwrap();
        assert_eq!(r, Value::Integer(2021));
    }

    #[test]
    fn test_date_add() {
        let f = DateAddFunction;
        let r = f
            .evaluate(&[
                Value::text("month"),
                Value::Integer(2),
                ts("2023-01-15T00:00:00Z"),
            ])
            .unwrap();
        assert_eq!(r, ts("2023-03-15T00:00:00Z"));

        let r = f
            .evaluate(&[
                Value::text("day"),
                Value::Integer(-1),
                ts("2023-01-01T00:00:00Z"),
            ])
            .unwrap();
        assert_eq!(r, ts("2022-12-31T00:00:00Z"));
    }

    #[test]
    fn test_date_diff() {
        let f = DateDiffFunction;
        let r = f
            .evaluate(&[
                Value::text("month"),
                ts("2023-01-15T00:00:00Z"),
                ts("2024-03-15T00:00:00Z"),
            ])
            .unwrap();
        assert_eq!(r, Value::Integer(14));

        let r = f
            .evaluate(&[
                Value::text("hour"),
                ts("2023-01-01T00:00:00Z"),
                ts("2023-01-02T06:00:00Z"),
            ])
            .unwrap();
        assert_eq!(r, Value::Integer(30));
    }

    #[test]
    fn test_null_propagation() {
        let f = ExtractFunction;
        assert!(f
            .evaluate(&[Value::null_unknown(), ts("2023-01-01")])
            .unwrap()
            .is_null());
        let f = DateAddFunction;
        assert!(f
            .evaluate(&[Value::text("day"), Value::Integer(1), Value::null_unknown()])
            .unwrap()
            .is_null());
    }
}
