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

//! Delimited-text tokenizer
//!
//! A row/column state machine over caller-owned byte buffers. Fields come
//! back as (start, len) spans into the buffer rather than copies; fields
//! that contain a quote or escape are queued and rewritten in one in-place
//! pass after the row completes. A row split across the end of the buffer
//! is reported as incomplete so the caller can carry the tail into the
//! next chunk and re-tokenize from the row start.

use memchr::{memchr2, memchr3};
use smallvec::SmallVec;

use crate::core::{Error, Result};

/// Default bound on the number of fields in one row
pub const MAX_FIELDS_DEFAULT: usize = 1024;

/// A field's location inside the tokenized buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    pub start: usize,
    pub len: usize,
}

impl FieldSpan {
    /// Borrow the field's bytes out of the buffer it was tokenized from
    pub fn bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.start..self.start + self.len]
    }
}

/// Classification of the next input byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvEvent {
    ColumnDelimiter,
    RowDelimiter,
    QuoteChar,
    EscapeChar,
    EndOfStream,
    Other,
}

/// Tokenizer position within the current row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvTokenizerState {
    StartToken,
    InToken,
    InQuotedToken,
    InEscapeAtTokenStart,
    InEscapeInToken,
    InEscapeInQuote,
    EndOfLine,
}

/// Row/column tokenizer for delimited text
#[derive(Debug)]
pub struct CsvTokenizer {
    column_delimiter: u8,
    row_delimiter: u8,
    quote: u8,
    escape: u8,
    max_fields: usize,
    state: CsvTokenizerState,
}

impl CsvTokenizer {
    /// Create a new tokenizer with the given delimiter set
    pub fn new(
        column_delimiter: u8,
        row_delimiter: u8,
        quote: u8,
        escape: u8,
        max_fields: usize,
    ) -> Self {
        Self {
            column_delimiter,
            row_delimiter,
            quote,
            escape,
            max_fields,
            state: CsvTokenizerState::StartToken,
        }
    }

    /// The state the tokenizer was left in after the last call
    pub fn state(&self) -> CsvTokenizerState {
        self.state
    }

    /// Classify a single input byte
    pub fn classify(&self, byte: u8) -> CsvEvent {
        if byte == self.column_delimiter {
            CsvEvent::ColumnDelimiter
        } else if byte == self.row_delimiter {
            CsvEvent::RowDelimiter
        } else if byte == self.quote {
            CsvEvent::QuoteChar
        } else if byte == self.escape {
            CsvEvent::EscapeChar
        } else {
            CsvEvent::Other
        }
    }

    /// Tokenize one row starting at `start`.
    ///
    /// Returns `Some(next)` with `spans` filled when a complete row was
    /// found; `next` is the offset of the byte after the row. Returns
    /// `None` when the buffer ends mid-row, in which case the caller
    /// carries `buf[start..]` into the next chunk. With `last_row` set,
    /// end of buffer closes the row as if a row delimiter followed.
    ///
    /// Unescaped column and row delimiters inside a quoted field are
    /// literal. An escape consumes exactly the next byte. A `\r`
    /// immediately before a `\n` row delimiter is stripped.
    pub fn next_row(
        &mut self,
        buf: &mut [u8],
        start: usize,
        last_row: bool,
        spans: &mut Vec<FieldSpan>,
    ) -> Result<Option<usize>> {
        spans.clear();
        if start >= buf.len() {
            return Ok(None);
        }

        self.state = CsvTokenizerState::StartToken;
        let mut cleanup: SmallVec<[usize; 4]> = SmallVec::new();
        let mut field_start = start;
        let mut needs_cleanup = false;
        let mut pos = start;

        loop {
            if pos >= buf.len() {
                return match self.state {
                    CsvTokenizerState::InQuotedToken | CsvTokenizerState::InEscapeInQuote => {
                        if last_row {
                            Err(Error::csv_format(pos, "unterminated quoted field"))
                        } else {
                            Ok(None)
                        }
                    }
                    CsvTokenizerState::InEscapeAtTokenStart
                    | CsvTokenizerState::InEscapeInToken => {
                        if last_row {
                            Err(Error::csv_format(pos, "dangling escape at end of stream"))
                        } else {
                            Ok(None)
                        }
                    }
                    _ => {
                        if last_row {
                            self.close_field(
                                spans,
                                &mut cleanup,
                                field_start,
                                pos,
                                needs_cleanup,
                            )?;
                            self.finish_row(buf, spans, &cleanup);
                            Ok(Some(pos))
                        } else {
                            Ok(None)
                        }
                    }
                };
            }

            let event = self.classify(buf[pos]);
            match self.state {
                CsvTokenizerState::StartToken => match event {
                    CsvEvent::ColumnDelimiter => {
                        self.close_field(spans, &mut cleanup, pos, pos, false)?;
                        field_start = pos + 1;
                    }
                    CsvEvent::RowDelimiter => {
                        self.close_field(spans, &mut cleanup, pos, pos, false)?;
                        self.finish_row(buf, spans, &cleanup);
                        return Ok(Some(pos + 1));
                    }
                    CsvEvent::QuoteChar => {
                        field_start = pos;
                        needs_cleanup = true;
                        self.state = CsvTokenizerState::InQuotedToken;
                    }
                    CsvEvent::EscapeChar => {
                        field_start = pos;
                        needs_cleanup = true;
                        self.state = CsvTokenizerState::InEscapeAtTokenStart;
                    }
                    _ => {
                        field_start = pos;
                        self.state = CsvTokenizerState::InToken;
                    }
                },

                CsvTokenizerState::InToken => match event {
                    CsvEvent::ColumnDelimiter => {
                        self.close_field(spans, &mut cleanup, field_start, pos, needs_cleanup)?;
                        needs_cleanup = false;
                        field_start = pos + 1;
                        self.state = CsvTokenizerState::StartToken;
                    }
                    CsvEvent::RowDelimiter => {
                        self.close_field(spans, &mut cleanup, field_start, pos, needs_cleanup)?;
                        self.finish_row(buf, spans, &cleanup);
                        return Ok(Some(pos + 1));
                    }
                    CsvEvent::EscapeChar => {
                        needs_cleanup = true;
                        self.state = CsvTokenizerState::InEscapeInToken;
                    }
                    _ => {
                        // skip the run of ordinary bytes
                        if let Some(n) = memchr3(
                            self.column_delimiter,
                            self.row_delimiter,
                            self.escape,
                            &buf[pos + 1..],
                        ) {
                            pos += n;
                        } else {
                            pos = buf.len() - 1;
                        }
                    }
                },

                CsvTokenizerState::InQuotedToken => match event {
                    CsvEvent::QuoteChar => {
                        self.state = CsvTokenizerState::InToken;
                    }
                    CsvEvent::EscapeChar => {
                        self.state = CsvTokenizerState::InEscapeInQuote;
                    }
                    _ => {
                        // delimiters are literal inside quotes
                        if let Some(n) = memchr2(self.quote, self.escape, &buf[pos + 1..]) {
                            pos += n;
                        } else {
                            pos = buf.len() - 1;
                        }
                    }
                },

                CsvTokenizerState::InEscapeAtTokenStart | CsvTokenizerState::InEscapeInToken => {
                    // the escaped byte is literal, whatever it classifies as
                    self.state = CsvTokenizerState::InToken;
                }

                CsvTokenizerState::InEscapeInQuote => {
                    self.state = CsvTokenizerState::InQuotedToken;
                }

                CsvTokenizerState::EndOfLine => {
                    self.state = CsvTokenizerState::StartToken;
                    continue;
                }
            }
            pos += 1;
        }
    }

    fn close_field(
        &self,
        spans: &mut Vec<FieldSpan>,
        cleanup: &mut SmallVec<[usize; 4]>,
        start: usize,
        end: usize,
        needs_cleanup: bool,
    ) -> Result<()> {
        if spans.len() >= self.max_fields {
            return Err(Error::TokenCapacityExceeded(self.max_fields));
        }
        if needs_cleanup {
            cleanup.push(spans.len());
        }
        spans.push(FieldSpan {
            start,
            len: end - start,
        });
        Ok(())
    }

    /// Strip a trailing `\r`, run queued unescapes, mark end of line
    fn finish_row(&mut self, buf: &mut [u8], spans: &mut [FieldSpan], cleanup: &[usize]) {
        if self.row_delimiter == b'\n' {
            if let Some(last) = spans.last_mut() {
                if last.len > 0 && buf[last.start + last.len - 1] == b'\r' {
                    last.len -= 1;
                }
            }
        }
        for &index in cleanup {
            self.unescape_in_place(buf, &mut spans[index]);
        }
        self.state = CsvTokenizerState::EndOfLine;
    }

    /// Rewrite one field in place: drop a surrounding quote pair, then
    /// collapse each escape with the byte it protects
    fn unescape_in_place(&self, buf: &mut [u8], span: &mut FieldSpan) {
        let bytes = &mut buf[span.start..span.start + span.len];
        let mut len = bytes.len();
        let mut src = 0;
        if len >= 2 && bytes[0] == self.quote && bytes[len - 1] == self.quote {
            src = 1;
            len -= 1;
        }
        let mut dst = 0;
        while src < len {
            if bytes[src] == self.escape && src + 1 < len {
                src += 1;
            }
            bytes[dst] = bytes[src];
            dst += 1;
            src += 1;
        }
        span.len = dst;
    }
}
