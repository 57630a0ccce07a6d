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

//! Public query interface
//!
//! `Query::parse` compiles a statement; `CsvScan`/`JsonScan` bind it to
//! one object stream. The caller pushes successive byte chunks and pulls
//! formatted result rows; all state is resumable between calls and one
//! scan serves exactly one query against one stream.

use crate::core::{ColumnNames, Result, RowContext, Value};
use crate::csv::{CsvTokenizer, FieldSpan, MAX_FIELDS_DEFAULT};
use crate::executor::{OutputOptions, QueryEngine};
use crate::json::{parse_path, JsonDecoder, PathMatcher};
use crate::parser::{parse_query, ExprNode, ParsedQuery};

pub use crate::executor::ScanStatus;

/// A compiled, validated SELECT statement
#[derive(Debug, Clone)]
pub struct Query {
    parsed: ParsedQuery,
}

impl Query {
    /// Parse and validate a statement
    ///
    /// Syntax and semantic errors surface here, before any row runs.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Query {
            parsed: parse_query(text)?,
        })
    }

    /// True when any projection aggregates
    pub fn is_aggregate(&self) -> bool {
        self.parsed.aggregate
    }

    /// The LIMIT bound, if the statement carries one
    pub fn limit(&self) -> Option<u64> {
        self.parsed.limit
    }

    /// The compiled form
    pub fn parsed(&self) -> &ParsedQuery {
        &self.parsed
    }
}

/// Input and output settings for a delimited-text scan
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub column_delimiter: u8,
    pub row_delimiter: u8,
    pub quote: u8,
    pub escape: u8,
    /// Bind the first row as the column schema
    pub use_header: bool,
    /// Drop the first row without binding it
    pub skip_first_row: bool,
    /// Hard bound on fields per row
    pub max_fields: usize,
    pub output: OutputOptions,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            column_delimiter: b',',
            row_delimiter: b'\n',
            quote: b'"',
            escape: b'\\',
            use_header: false,
            skip_first_row: false,
            max_fields: MAX_FIELDS_DEFAULT,
            output: OutputOptions::default(),
        }
    }
}

/// Output settings for a JSON scan
#[derive(Debug, Clone, Default)]
pub struct JsonOptions {
    pub output: OutputOptions,
}

/// A query bound to one delimited-text stream
///
/// Chunk boundaries may fall anywhere, including inside a quoted field;
/// the unterminated tail of each chunk is carried and re-tokenized when
/// the next chunk arrives.
#[derive(Debug)]
pub struct CsvScan {
    engine: QueryEngine,
    tokenizer: CsvTokenizer,
    /// Unconsumed bytes, always starting at a row boundary
    carry: Vec<u8>,
    names: Option<ColumnNames>,
    header_pending: bool,
    skip_pending: bool,
    limit_hit: bool,
}

impl CsvScan {
    /// Bind a query to a delimited-text stream
    pub fn new(query: Query, options: CsvOptions) -> Result<Self> {
        let tokenizer = CsvTokenizer::new(
            options.column_delimiter,
            options.row_delimiter,
            options.quote,
            options.escape,
            options.max_fields,
        );
        Ok(CsvScan {
            engine: QueryEngine::new(query.parsed, options.output)?,
            tokenizer,
            carry: Vec::new(),
            names: None,
            header_pending: options.use_header,
            skip_pending: !options.use_header && options.skip_first_row,
            limit_hit: false,
        })
    }

    /// Process the next chunk of the object body
    ///
    /// With `is_final` set, the chunk's unterminated tail is processed
    /// as a last row and aggregates finalize. Returns `LimitReached`
    /// once the LIMIT bound fires; later calls are no-ops.
    pub fn process_chunk(
        &mut self,
        chunk: &[u8],
        is_final: bool,
        out: &mut String,
    ) -> Result<ScanStatus> {
        if self.limit_hit {
            return Ok(ScanStatus::LimitReached);
        }
        self.carry.extend_from_slice(chunk);

        let mut pos = 0;
        let mut spans: Vec<FieldSpan> = Vec::new();
        loop {
            match self
                .tokenizer
                .next_row(&mut self.carry, pos, is_final, &mut spans)?
            {
                None => break,
                Some(next) => {
                    if self.header_pending {
                        let header: Vec<String> = spans
                            .iter()
                            .map(|s| String::from_utf8_lossy(s.bytes(&self.carry)).into_owned())
                            .collect();
                        let names = ColumnNames::from_header(&header);
                        self.engine.check_header(&names)?;
                        self.names = Some(names);
                        self.header_pending = false;
                    } else if self.skip_pending {
                        self.skip_pending = false;
                    } else {
                        let fields: Vec<Value> = spans
                            .iter()
                            .map(|s| {
                                Value::text(String::from_utf8_lossy(s.bytes(&self.carry)))
                            })
                            .collect();
                        let ctx = RowContext::new(&fields, self.names.as_ref());
                        if self.engine.process_row(&ctx, out)? == ScanStatus::LimitReached {
                            self.limit_hit = true;
                            self.carry.drain(..next);
                            return Ok(ScanStatus::LimitReached);
                        }
                    }
                    pos = next;
                }
            }
        }
        self.carry.drain(..pos);

        if is_final {
            self.engine.finish(out)
        } else {
            Ok(ScanStatus::Continue)
        }
    }
}

/// A query bound to one JSON stream
pub struct JsonScan {
    engine: QueryEngine,
    decoder: JsonDecoder,
    names: ColumnNames,
    limit_hit: bool,
}

impl JsonScan {
    /// Bind a query to a JSON stream
    ///
    /// Every non-alias identifier in the statement becomes one variable
    /// slot fed by a path matcher; identifiers that never match within a
    /// row evaluate to NULL.
    pub fn new(query: Query, options: JsonOptions) -> Result<Self> {
        let parsed = query.parsed;
        let paths = json_variables(&parsed);
        let mut matchers = Vec::with_capacity(paths.len());
        for path in &paths {
            matchers.push(PathMatcher::new(parse_path(path)?));
        }
        let names = ColumnNames::from_header(&paths);
        let decoder = JsonDecoder::new(
            parsed.from.prefix.clone(),
            parsed.from.wildcard_array,
            matchers,
        );
        Ok(JsonScan {
            engine: QueryEngine::new(parsed, options.output)?,
            decoder,
            names,
            limit_hit: false,
        })
    }

    /// Process the next chunk of the object body
    pub fn process_chunk(
        &mut self,
        chunk: &[u8],
        is_final: bool,
        out: &mut String,
    ) -> Result<ScanStatus> {
        if self.limit_hit {
            return Ok(ScanStatus::LimitReached);
        }
        let engine = &mut self.engine;
        let names = &self.names;
        let more = self.decoder.process_chunk(chunk, is_final, |values| {
            let ctx = RowContext::new(values, Some(names));
            Ok(engine.process_row(&ctx, out)? != ScanStatus::LimitReached)
        })?;
        if !more {
            self.limit_hit = true;
            return Ok(ScanStatus::LimitReached);
        }
        if is_final {
            self.engine.finish(out)
        } else {
            Ok(ScanStatus::Continue)
        }
    }
}

/// Distinct non-alias identifiers of the statement, in first-use order
fn json_variables(query: &ParsedQuery) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for index in 0..query.arena.len() {
        if let ExprNode::Identifier(name) = query.arena.node(crate::parser::ExprId(index as u32)) {
            if query.aliases.contains_key(&name.to_lowercase()) {
                continue;
            }
            if !paths.iter().any(|p| p.eq_ignore_ascii_case(name)) {
                paths.push(name.clone());
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(query: &str) -> CsvScan {
        CsvScan::new(Query::parse(query).unwrap(), CsvOptions::default()).unwrap()
    }

    #[test]
    fn test_filter_example() {
        let mut scan = csv("select _1, _2 from stdin where int(_1) > 1;");
        let mut out = String::new();
        let status = scan.process_chunk(b"1,2\n3,4\n", true, &mut out).unwrap();
        assert_eq!(out, "3,4\n");
        assert_eq!(status, ScanStatus::EndOfStream);
    }

    #[test]
    fn test_sum_example() {
        let mut scan = csv("select sum(int(_1)) from stdin;");
        let mut out = String::new();
        scan.process_chunk(b"1,2\n3,4\n", true, &mut out).unwrap();
        assert_eq!(out, "4\n");
    }

    #[test]
    fn test_chunked_rows() {
        let mut scan = csv("select _2 from stdin;");
        let mut out = String::new();
        assert_eq!(
            scan.process_chunk(b"a,b\nc,", false, &mut out).unwrap(),
            ScanStatus::Continue
        );
        scan.process_chunk(b"d\n", true, &mut out).unwrap();
        assert_eq!(out, "b\nd\n");
    }

    #[test]
    fn test_final_row_without_trailing_newline() {
        let mut scan = csv("select _1 from stdin;");
        let mut out = String::new();
        scan.process_chunk(b"a\nb", true, &mut out).unwrap();
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn test_header_binds_names() {
        let query = Query::parse("select qty from stdin where int(qty) > 1;").unwrap();
        let mut scan = CsvScan::new(
            query,
            CsvOptions {
                use_header: true,
                ..CsvOptions::default()
            },
        )
        .unwrap();
        let mut out = String::new();
        scan.process_chunk(b"name,qty\npen,1\nink,5\n", true, &mut out)
            .unwrap();
        assert_eq!(out, "5\n");
    }

    #[test]
    fn test_skip_first_row() {
        let query = Query::parse("select _1 from stdin;").unwrap();
        let mut scan = CsvScan::new(
            query,
            CsvOptions {
                skip_first_row: true,
                ..CsvOptions::default()
            },
        )
        .unwrap();
        let mut out = String::new();
        scan.process_chunk(b"header\na\nb\n", true, &mut out).unwrap();
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn test_limit_status_and_no_op_after() {
        let mut scan = csv("select _1 from stdin limit 1;");
        let mut out = String::new();
        let status = scan.process_chunk(b"a\nb\n", true, &mut out).unwrap();
        assert_eq!(status, ScanStatus::LimitReached);
        assert_eq!(out, "a\n");
        // further pushes do not process rows
        let status = scan.process_chunk(b"c\n", true, &mut out).unwrap();
        assert_eq!(status, ScanStatus::LimitReached);
        assert_eq!(out, "a\n");
    }

    #[test]
    fn test_query_accessors() {
        let q = Query::parse("select count(*) from stdin limit 10;").unwrap();
        assert!(q.is_aggregate());
        assert_eq!(q.limit(), Some(10));
    }

    #[test]
    fn test_json_scan_wildcard() {
        let query = Query::parse("select name, qty from s3object[*] where int(qty) > 1;").unwrap();
        let mut scan = JsonScan::new(query, JsonOptions::default()).unwrap();
        let mut out = String::new();
        let body = br#"[{"name":"pen","qty":1},{"name":"ink","qty":5}]"#;
        let status = scan.process_chunk(body, true, &mut out).unwrap();
        assert_eq!(out, "ink,5\n");
        assert_eq!(status, ScanStatus::EndOfStream);
    }

    #[test]
    fn test_json_scan_aggregate() {
        let query = Query::parse("select sum(qty) from s3object[*];").unwrap();
        let mut scan = JsonScan::new(query, JsonOptions::default()).unwrap();
        let mut out = String::new();
        let body = br#"[{"qty":2},{"qty":3}]"#;
        scan.process_chunk(body, true, &mut out).unwrap();
        assert_eq!(out, "5\n");
    }

    #[test]
    fn test_json_scan_chunked() {
        let query = Query::parse("select v from s3object[*];").unwrap();
        let mut scan = JsonScan::new(query, JsonOptions::default()).unwrap();
        let mut out = String::new();
        scan.process_chunk(br#"[{"v":1},{"v"#, false, &mut out).unwrap();
        scan.process_chunk(br#"":22}]"#, true, &mut out).unwrap();
        assert_eq!(out, "1\n22\n");
    }

    #[test]
    fn test_json_missing_key_is_null() {
        let query = Query::parse("select v from s3object[*] where v is null;").unwrap();
        let mut scan = JsonScan::new(query, JsonOptions::default()).unwrap();
        let mut out = String::new();
        scan.process_chunk(br#"[{"v":1},{"w":2}]"#, true, &mut out)
            .unwrap();
        assert_eq!(out, "null\n");
    }
}
