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

//! Result-record serialization

use crate::core::Value;

/// Shape of each emitted result record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Delimited text, one record per row
    #[default]
    Delimited,
    /// One JSON object per row, keyed by projection name
    TaggedJson,
}

/// Serialization settings for result records
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub column_delimiter: char,
    pub row_delimiter: char,
    pub quote: char,
    /// Quote every delimited field, not just the ones that need it
    pub always_quote: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        OutputOptions {
            format: OutputFormat::Delimited,
            column_delimiter: ',',
            row_delimiter: '\n',
            quote: '"',
            always_quote: false,
        }
    }
}

/// Serializes evaluated projection values into the output buffer
///
/// Every record, including the single aggregate-mode record, ends with
/// the output row delimiter.
#[derive(Debug)]
pub struct RecordWriter {
    options: OutputOptions,
}

impl RecordWriter {
    /// Create a new writer with the given options
    pub fn new(options: OutputOptions) -> Self {
        RecordWriter { options }
    }

    /// The record format this writer emits
    pub fn format(&self) -> OutputFormat {
        self.options.format
    }

    /// Append one record; `names` supplies the per-column tags for the
    /// JSON format and must be as long as `values`
    pub fn write_record(&self, names: &[String], values: &[Value], out: &mut String) {
        match self.options.format {
            OutputFormat::Delimited => self.write_delimited(values, out),
            OutputFormat::TaggedJson => self.write_tagged_json(names, values, out),
        }
        out.push(self.options.row_delimiter);
    }

    fn write_delimited(&self, values: &[Value], out: &mut String) {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                out.push(self.options.column_delimiter);
            }
            let text = match value {
                Value::Null(_) => "null".to_string(),
                other => other.to_string(),
            };
            if self.options.always_quote || self.needs_quoting(&text) {
                out.push(self.options.quote);
                for ch in text.chars() {
                    if ch == self.options.quote {
                        out.push(self.options.quote);
                    }
                    out.push(ch);
                }
                out.push(self.options.quote);
            } else {
                out.push_str(&text);
            }
        }
    }

    fn needs_quoting(&self, text: &str) -> bool {
        text.chars().any(|ch| {
            ch == self.options.column_delimiter
                || ch == self.options.row_delimiter
                || ch == self.options.quote
        })
    }

    fn write_tagged_json(&self, names: &[String], values: &[Value], out: &mut String) {
        out.push('{');
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_json_string(&names[i], out);
            out.push(':');
            match value {
                Value::Null(_) => out.push_str("null"),
                Value::Integer(_) | Value::Boolean(_) => out.push_str(&value.to_string()),
                Value::Float(v) if v.is_finite() => out.push_str(&value.to_string()),
                other => push_json_string(&other.to_string(), out),
            }
        }
        out.push('}');
    }
}

fn push_json_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimited_record() {
        let w = RecordWriter::new(OutputOptions::default());
        let mut out = String::new();
        w.write_record(
            &[],
            &[Value::Integer(3), Value::text("x"), Value::null_unknown()],
            &mut out,
        );
        assert_eq!(out, "3,x,null\n");
    }

    #[test]
    fn test_delimited_quotes_embedded_delimiter() {
        let w = RecordWriter::new(OutputOptions::default());
        let mut out = String::new();
        w.write_record(&[], &[Value::text("a,b"), Value::text("q\"t")], &mut out);
        assert_eq!(out, "\"a,b\",\"q\"\"t\"\n");
    }

    #[test]
    fn test_always_quote() {
        let w = RecordWriter::new(OutputOptions {
            always_quote: true,
            ..OutputOptions::default()
        });
        let mut out = String::new();
        w.write_record(&[], &[Value::Integer(1), Value::text("x")], &mut out);
        assert_eq!(out, "\"1\",\"x\"\n");
    }

    #[test]
    fn test_custom_delimiters() {
        let w = RecordWriter::new(OutputOptions {
            column_delimiter: '|',
            row_delimiter: ';',
            ..OutputOptions::default()
        });
        let mut out = String::new();
        w.write_record(&[], &[Value::Integer(1), Value::Integer(2)], &mut out);
        assert_eq!(out, "1|2;");
    }

    #[test]
    fn test_tagged_json_record() {
        let w = RecordWriter::new(OutputOptions {
            format: OutputFormat::TaggedJson,
            ..OutputOptions::default()
        });
        let mut out = String::new();
        w.write_record(
            &["_1".to_string(), "name".to_string(), "n".to_string()],
            &[
                Value::Integer(3),
                Value::text("he said \"hi\""),
                Value::null_unknown(),
            ],
            &mut out,
        );
        assert_eq!(out, "{\"_1\":3,\"name\":\"he said \\\"hi\\\"\",\"n\":null}\n");
    }

    #[test]
    fn test_float_rendering() {
        let w = RecordWriter::new(OutputOptions::default());
        let mut out = String::new();
        w.write_record(&[], &[Value::Float(-4.75), Value::Float(2.0)], &mut out);
        assert_eq!(out, "-4.75,2\n");
    }
}
