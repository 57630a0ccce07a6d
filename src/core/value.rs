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

//! Value type for Streamsel - runtime values with type information
//!
//! This module provides a unified Value enum that represents SQL values
//! with full type information, promotion, comparison and SQL three-valued
//! arithmetic: any NULL operand makes an arithmetic result NULL, and any
//! comparison against NULL is NULL, never false.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::error::{Error, Result};
use super::types::DataType;

/// Timestamp formats supported for parsing
/// Order matters - more specific formats first
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z", // RFC3339 with fractional seconds
    "%Y-%m-%dT%H:%M:%S%:z",    // RFC3339
    "%Y-%m-%dT%H:%M:%S%.fZ",   // RFC3339 UTC with fractional seconds
    "%Y-%m-%dT%H:%M:%SZ",      // RFC3339 UTC
    "%Y-%m-%dT%H:%M:%S",       // ISO without timezone
    "%Y-%m-%d %H:%M:%S%.f",    // SQL-style with fractional seconds
    "%Y-%m-%d %H:%M:%S",       // SQL-style
    "%Y-%m-%d",                // Date only
];

/// Parse a timestamp from text, trying each supported format in order
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
        if let Ok(date) = chrono::NaiveDate::parse_from_str(s, fmt) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(naive.and_utc());
            }
        }
    }
    Err(Error::type_conversion(s.to_string(), "TIMESTAMP"))
}

/// Format a float the way result rows are serialized
///
/// Uses the shortest representation that round-trips; whole floats print
/// without a trailing fraction (`7.0` prints as `7`), matching integer
/// output for whole-valued sums.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    format!("{}", v)
}

/// A runtime value with type information
///
/// Each variant carries its data directly. Text uses `Arc<str>` for cheap
/// cloning during row operations.
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL value with optional type hint
    Null(DataType),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 text string (Arc for cheap cloning)
    Text(Arc<str>),
    /// Boolean value
    Boolean(bool),
    /// Timestamp (UTC)
    Timestamp(DateTime<Utc>),
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a NULL value with a type hint
    pub fn null(data_type: DataType) -> Self {
        Value::Null(data_type)
    }

    /// Create a NULL value with unknown type
    pub fn null_unknown() -> Self {
        Value::Null(DataType::Null)
    }

    /// Create an integer value
    pub fn integer(value: i64) -> Self {
        Value::Integer(value)
    }

    /// Create a float value
    pub fn float(value: f64) -> Self {
        Value::Float(value)
    }

    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(Arc::from(value.into().as_str()))
    }

    /// Create a text value from Arc<str> (zero-copy)
    pub fn text_arc(value: Arc<str>) -> Self {
        Value::Text(value)
    }

    /// Create a boolean value
    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    /// Create a timestamp value
    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }

    // =========================================================================
    // Type accessors
    // =========================================================================

    /// Returns the data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null(dt) => *dt,
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Text(_) => DataType::Text,
            Value::Boolean(_) => DataType::Boolean,
            Value::Timestamp(_) => DataType::Timestamp,
        }
    }

    /// Returns true if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    // =========================================================================
    // Value extractors
    // =========================================================================

    /// Extract as i64, with type coercion
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Null(_) => None,
            Value::Integer(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64)),
            Value::Boolean(b) => Some(if *b { 1 } else { 0 }),
            Value::Timestamp(t) => Some(t.timestamp()),
        }
    }

    /// Extract as f64, with type coercion
    pub fn as_float64(&self) -> Option<f64> {
        match self {
            Value::Null(_) => None,
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Timestamp(_) => None,
        }
    }

    /// Extract as boolean, with type coercion
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Null(_) => None,
            Value::Integer(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::Text(s) => {
                let s_ref: &str = s.as_ref();
                if s_ref.eq_ignore_ascii_case("true") || s_ref == "1" {
                    Some(true)
                } else if s_ref.eq_ignore_ascii_case("false") || s_ref == "0" {
                    Some(false)
                } else {
                    None
                }
            }
            Value::Boolean(b) => Some(*b),
            Value::Timestamp(_) => None,
        }
    }

    /// Extract as string reference (avoids clone for Text)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extract as DateTime<Utc>, parsing text values on demand
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            Value::Text(s) => parse_timestamp(s).ok(),
            _ => None,
        }
    }

    // =========================================================================
    // Comparison
    // =========================================================================

    /// SQL comparison with three-valued logic
    ///
    /// Returns:
    /// - `Ok(None)` if either side is NULL (the comparison itself is NULL)
    /// - `Ok(Some(ordering))` for comparable values
    /// - `Err` for incompatible kinds
    pub fn compare(&self, other: &Value) -> Result<Option<Ordering>> {
        if self.is_null() || other.is_null() {
            return Ok(None);
        }

        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Some(a.cmp(b))),
            (Value::Float(a), Value::Float(b)) => Ok(Some(compare_floats(*a, *b))),
            (Value::Integer(a), Value::Float(b)) => Ok(Some(compare_floats(*a as f64, *b))),
            (Value::Float(a), Value::Integer(b)) => Ok(Some(compare_floats(*a, *b as f64))),
            (Value::Text(a), Value::Text(b)) => Ok(Some(a.cmp(b))),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Some(a.cmp(b))),
            (Value::Timestamp(a), Value::Timestamp(b)) => Ok(Some(a.cmp(b))),
            // Text vs numeric: the text side must parse as a number
            (Value::Text(s), b) if b.data_type().is_numeric() => {
                match (s.trim().parse::<f64>().ok(), b.as_float64()) {
                    (Some(a), Some(b)) => Ok(Some(compare_floats(a, b))),
                    _ => Err(Error::IncomparableTypes(
                        self.data_type().name(),
                        other.data_type().name(),
                    )),
                }
            }
            (a, Value::Text(s)) if a.data_type().is_numeric() => {
                match (a.as_float64(), s.trim().parse::<f64>().ok()) {
                    (Some(a), Some(b)) => Ok(Some(compare_floats(a, b))),
                    _ => Err(Error::IncomparableTypes(
                        self.data_type().name(),
                        other.data_type().name(),
                    )),
                }
            }
            _ => Err(Error::IncomparableTypes(
                self.data_type().name(),
                other.data_type().name(),
            )),
        }
    }

    // =========================================================================
    // Arithmetic (NULL-propagating)
    // =========================================================================

    /// Addition; NULL if either operand is NULL
    pub fn add(&self, other: &Value) -> Result<Value> {
        self.numeric_binop(other, "+", |a, b| a.checked_add(b), |a, b| a + b)
    }

    /// Subtraction; NULL if either operand is NULL
    pub fn sub(&self, other: &Value) -> Result<Value> {
        self.numeric_binop(other, "-", |a, b| a.checked_sub(b), |a, b| a - b)
    }

    /// Multiplication; NULL if either operand is NULL
    pub fn mul(&self, other: &Value) -> Result<Value> {
        self.numeric_binop(other, "*", |a, b| a.checked_mul(b), |a, b| a * b)
    }

    /// Division; NULL if either operand is NULL, error on division by zero
    ///
    /// Integer division truncates; any float operand makes the result float.
    pub fn div(&self, other: &Value) -> Result<Value> {
        if self.is_null() || other.is_null() {
            return Ok(Value::null_unknown());
        }
        match (self.numeric_kind("/")?, other.numeric_kind("/")?) {
            (NumericOperand::Int(a), NumericOperand::Int(b)) => {
                if b == 0 {
                    return Err(Error::DivisionByZero);
                }
                Ok(Value::Integer(a / b))
            }
            (a, b) => {
                let b = b.as_f64();
                if b == 0.0 {
                    return Err(Error::DivisionByZero);
                }
                Ok(Value::Float(a.as_f64() / b))
            }
        }
    }

    /// Modulo; NULL if either operand is NULL, error on zero divisor
    pub fn modulo(&self, other: &Value) -> Result<Value> {
        if self.is_null() || other.is_null() {
            return Ok(Value::null_unknown());
        }
        match (self.numeric_kind("%")?, other.numeric_kind("%")?) {
            (NumericOperand::Int(a), NumericOperand::Int(b)) => {
                if b == 0 {
                    return Err(Error::DivisionByZero);
                }
                Ok(Value::Integer(a % b))
            }
            (a, b) => {
                let b = b.as_f64();
                if b == 0.0 {
                    return Err(Error::DivisionByZero);
                }
                Ok(Value::Float(a.as_f64() % b))
            }
        }
    }

    /// Exponentiation; NULL if either operand is NULL
    ///
    /// Integer base with a non-negative integer exponent stays integer;
    /// everything else computes in floating point.
    pub fn pow(&self, other: &Value) -> Result<Value> {
        if self.is_null() || other.is_null() {
            return Ok(Value::null_unknown());
        }
        match (self.numeric_kind("^")?, other.numeric_kind("^")?) {
            (NumericOperand::Int(a), NumericOperand::Int(b)) if b >= 0 => {
                match u32::try_from(b).ok().and_then(|e| a.checked_pow(e)) {
                    Some(v) => Ok(Value::Integer(v)),
                    None => Ok(Value::Float((a as f64).powf(b as f64))),
                }
            }
            (a, b) => Ok(Value::Float(a.as_f64().powf(b.as_f64()))),
        }
    }

    /// Arithmetic negation; NULL stays NULL
    pub fn negate(&self) -> Result<Value> {
        match self {
            Value::Null(_) => Ok(Value::null_unknown()),
            Value::Integer(v) => Ok(Value::Integer(-v)),
            Value::Float(v) => Ok(Value::Float(-v)),
            _ => Err(Error::evaluation(format!(
                "cannot negate {} value",
                self.data_type()
            ))),
        }
    }

    fn numeric_binop(
        &self,
        other: &Value,
        op: &'static str,
        int_op: impl Fn(i64, i64) -> Option<i64>,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> Result<Value> {
        if self.is_null() || other.is_null() {
            return Ok(Value::null_unknown());
        }
        match (self.numeric_kind(op)?, other.numeric_kind(op)?) {
            (NumericOperand::Int(a), NumericOperand::Int(b)) => match int_op(a, b) {
                Some(v) => Ok(Value::Integer(v)),
                None => Ok(Value::Float(float_op(a as f64, b as f64))),
            },
            (a, b) => Ok(Value::Float(float_op(a.as_f64(), b.as_f64()))),
        }
    }

    fn numeric_kind(&self, op: &'static str) -> Result<NumericOperand> {
        match self {
            Value::Integer(v) => Ok(NumericOperand::Int(*v)),
            Value::Float(v) => Ok(NumericOperand::Float(*v)),
            _ => Err(Error::evaluation(format!(
                "operator '{}' requires numeric operands, got {}",
                op,
                self.data_type()
            ))),
        }
    }
}

enum NumericOperand {
    Int(i64),
    Float(f64),
}

impl NumericOperand {
    fn as_f64(&self) -> f64 {
        match self {
            NumericOperand::Int(v) => *v as f64,
            NumericOperand::Float(v) => *v,
        }
    }
}

/// Total order for floats: NaN sorts last
fn compare_floats(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| {
        if a.is_nan() && b.is_nan() {
            Ordering::Equal
        } else if a.is_nan() {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null(_), Value::Null(_)) => true,
            _ => matches!(self.compare(other), Ok(Some(Ordering::Equal))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null(_) => write!(f, "null"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_propagation_arithmetic() {
        let null = Value::null_unknown();
        for v in [Value::Integer(5), Value::Float(2.5)] {
            assert!(null.add(&v).unwrap().is_null());
            assert!(v.add(&null).unwrap().is_null());
            assert!(null.sub(&v).unwrap().is_null());
            assert!(v.mul(&null).unwrap().is_null());
            assert!(null.div(&v).unwrap().is_null());
            assert!(v.modulo(&null).unwrap().is_null());
            assert!(null.pow(&v).unwrap().is_null());
        }
    }

    #[test]
    fn test_null_comparison_is_null() {
        let null = Value::null_unknown();
        assert_eq!(Value::Integer(1).compare(&null).unwrap(), None);
        assert_eq!(null.compare(&Value::text("x")).unwrap(), None);
    }

    #[test]
    fn test_integer_arithmetic_stays_integer() {
        let r = Value::Integer(7).add(&Value::Integer(3)).unwrap();
        assert!(matches!(r, Value::Integer(10)));
        let r = Value::Integer(7).div(&Value::Integer(2)).unwrap();
        assert!(matches!(r, Value::Integer(3)));
    }

    #[test]
    fn test_float_promotion() {
        let r = Value::Integer(7).add(&Value::Float(0.5)).unwrap();
        assert!(matches!(r, Value::Float(v) if v == 7.5));
        let r = Value::Float(-5.0)
            .add(&Value::Float(0.5))
            .unwrap()
            .add(&Value::Float(-0.25))
            .unwrap();
        assert!(matches!(r, Value::Float(v) if v == -4.75));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            Value::Integer(1).div(&Value::Integer(0)),
            Err(Error::DivisionByZero)
        );
        assert_eq!(
            Value::Integer(1).modulo(&Value::Integer(0)),
            Err(Error::DivisionByZero)
        );
    }

    #[test]
    fn test_pow() {
        let r = Value::Integer(2).pow(&Value::Integer(10)).unwrap();
        assert!(matches!(r, Value::Integer(1024)));
        let r = Value::Integer(2).pow(&Value::Integer(-1)).unwrap();
        assert!(matches!(r, Value::Float(v) if v == 0.5));
    }

    #[test]
    fn test_cross_kind_comparison() {
        assert_eq!(
            Value::Integer(1).compare(&Value::Float(1.5)).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::text("abc").compare(&Value::text("abd")).unwrap(),
            Some(Ordering::Less)
        );
        assert!(Value::text("abc").compare(&Value::Integer(1)).is_err());
        assert_eq!(
            Value::text("10").compare(&Value::Integer(9)).unwrap(),
            Some(Ordering::Greater)
        );
        assert!(Value::Boolean(true)
            .compare(&Value::Timestamp(Utc::now()))
            .is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2023-01-02T03:04:05Z").is_ok());
        assert!(parse_timestamp("2023-01-02 03:04:05").is_ok());
        assert!(parse_timestamp("2023-01-02").is_ok());
        assert!(parse_timestamp("not a timestamp").is_err());
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(7.0), "7");
        assert_eq!(format_float(-4.75), "-4.75");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::text("hi").to_string(), "hi");
        assert_eq!(Value::null_unknown().to_string(), "null");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }
}
