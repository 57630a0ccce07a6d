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

//! Per-row column binding
//!
//! [`RowContext`] is the short-lived, borrowed view an evaluator reads the
//! current row through. Format frontends (delimited text, JSON) fill a value
//! buffer per row; the context only borrows it, so no row data outlives the
//! row it came from.

use rustc_hash::FxHashMap;

use super::error::{Error, Result};
use super::value::Value;

/// Case-insensitive map from column name to zero-based position
///
/// Built once per scan from a header row. JSON scans bind variables by path
/// instead and leave this empty.
#[derive(Debug, Clone, Default)]
pub struct ColumnNames {
    by_name: FxHashMap<String, usize>,
    ordered: Vec<String>,
}

impl ColumnNames {
    /// Build from an ordered list of header names
    ///
    /// On duplicate names the first occurrence wins, matching the usual
    /// header-row convention.
    pub fn from_header<S: AsRef<str>>(names: &[S]) -> Self {
        let mut by_name = FxHashMap::default();
        let mut ordered = Vec::with_capacity(names.len());
        for (pos, name) in names.iter().enumerate() {
            let name = name.as_ref();
            by_name.entry(name.to_lowercase()).or_insert(pos);
            ordered.push(name.to_string());
        }
        ColumnNames { by_name, ordered }
    }

    /// Look up a column position by name, case-insensitively
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    /// True if a column with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    /// Number of named columns
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// True if no header was seen
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Header names in column order
    pub fn names(&self) -> &[String] {
        &self.ordered
    }
}

/// Borrowed view of one input row
///
/// Positions are zero-based here; the query language's `_N` references are
/// one-based and shifted by the compiler before they reach this layer.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    fields: &'a [Value],
    names: Option<&'a ColumnNames>,
}

impl<'a> RowContext<'a> {
    /// Create a row view over a field buffer, with optional header names
    pub fn new(fields: &'a [Value], names: Option<&'a ColumnNames>) -> Self {
        RowContext { fields, names }
    }

    /// Number of columns in this row
    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    /// Fetch a column by zero-based position
    pub fn column_by_position(&self, pos: usize) -> Result<&'a Value> {
        self.fields
            .get(pos)
            .ok_or(Error::ColumnPositionOutOfBounds(pos))
    }

    /// Fetch a column by header name (case-insensitive)
    pub fn column_by_name(&self, name: &str) -> Result<&'a Value> {
        let pos = self
            .names
            .and_then(|n| n.position(name))
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        self.column_by_position(pos)
    }

    /// Header names, if a header row was consumed
    pub fn names(&self) -> Option<&'a ColumnNames> {
        self.names
    }

    /// All field values in column order
    pub fn fields(&self) -> &'a [Value] {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_values() -> Vec<Value> {
        vec![Value::text("widget"), Value::text("7"), Value::text("2.5")]
    }

    #[test]
    fn test_position_lookup() {
        let fields = row_values();
        let row = RowContext::new(&fields, None);
        assert_eq!(row.column_count(), 3);
        assert_eq!(row.column_by_position(0).unwrap().as_str(), Some("widget"));
        assert_eq!(
            row.column_by_position(3),
            Err(Error::ColumnPositionOutOfBounds(3))
        );
    }

    #[test]
    fn test_name_lookup_case_insensitive() {
        let names = ColumnNames::from_header(&["Name", "Qty", "Price"]);
        let fields = row_values();
        let row = RowContext::new(&fields, Some(&names));
        assert_eq!(row.column_by_name("qty").unwrap().as_str(), Some("7"));
        assert_eq!(row.column_by_name("PRICE").unwrap().as_str(), Some("2.5"));
        assert_eq!(
            row.column_by_name("weight"),
            Err(Error::ColumnNotFound("weight".to_string()))
        );
    }

    #[test]
    fn test_name_lookup_without_header() {
        let fields = row_values();
        let row = RowContext::new(&fields, None);
        assert!(matches!(
            row.column_by_name("qty"),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_header_first_wins() {
        let names = ColumnNames::from_header(&["a", "A", "b"]);
        assert_eq!(names.position("a"), Some(0));
        assert_eq!(names.position("b"), Some(2));
        assert_eq!(names.len(), 3);
    }
}
