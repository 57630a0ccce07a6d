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

//! Incremental JSON decoding
//!
//! A hand-written event scanner over a chunk-reassembly buffer: a token
//! split across a chunk boundary is never observed half-formed, the
//! unconsumed tail is carried into the next call. On top of the events
//! sit the per-variable path matchers and the row detector driven by the
//! from-clause prefix.

use crate::core::{Error, Result, Value};
use crate::json::matcher::PathMatcher;

/// One decoded JSON event
#[derive(Debug, Clone, PartialEq)]
pub enum JsonEvent {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    /// An object key, with its member value as the following event
    Key(String),
    /// A scalar value: string, number, boolean, or null
    Primitive(Value),
}

/// One scanned token: an event, or a bare separator
#[derive(Debug)]
enum ScanToken {
    Event(JsonEvent),
    Comma,
}

/// One open container
#[derive(Debug)]
struct Frame {
    is_array: bool,
    /// The container was bound to an object key
    has_key: bool,
    /// A matcher step was taken when this container opened
    stepped: bool,
    /// Running element index for arrays
    entry_count: usize,
}

/// Streaming decoder for one JSON document
///
/// Detects logical rows at the from-clause prefix, runs the path
/// matchers inside each row, and hands each completed row's variable
/// values to the caller.
pub struct JsonDecoder {
    buffer: Vec<u8>,
    /// Stream offset of `buffer[0]`, for error reporting
    base_offset: usize,
    prefix: Vec<String>,
    wildcard: bool,
    matchers: Vec<PathMatcher>,
    /// One value slot per matcher, reset to NULL at each row boundary
    row_values: Vec<Value>,
    frames: Vec<Frame>,
    /// Keys of the named open containers, for prefix matching
    key_path: Vec<String>,
    pending_key: Option<String>,
    /// The previous token completed a value at the current depth
    after_value: bool,
    /// A separator was seen and a value or key must follow
    comma_pending: bool,
    in_row: bool,
    /// Frame depth of the current row's root container
    row_root_depth: usize,
    /// Frame depth of the `[*]` row array once found
    row_array_depth: Option<usize>,
    stopped: bool,
}

impl JsonDecoder {
    /// Create a decoder
    ///
    /// `prefix` and `wildcard` come from the FROM clause; `matchers`
    /// holds one compiled path per variable, in slot order.
    pub fn new(prefix: Vec<String>, wildcard: bool, matchers: Vec<PathMatcher>) -> Self {
        let slots = matchers.len();
        JsonDecoder {
            buffer: Vec::new(),
            base_offset: 0,
            prefix,
            wildcard,
            matchers,
            row_values: vec![Value::null_unknown(); slots],
            frames: Vec::new(),
            key_path: Vec::new(),
            pending_key: None,
            after_value: false,
            comma_pending: false,
            in_row: false,
            row_root_depth: 0,
            row_array_depth: None,
            stopped: false,
        }
    }

    /// Decode one chunk, invoking `on_row` with the variable slots of
    /// every completed row. `on_row` returning false stops consumption
    /// (LIMIT); the overall return is false once stopped.
    pub fn process_chunk<F>(&mut self, chunk: &[u8], is_final: bool, mut on_row: F) -> Result<bool>
    where
        F: FnMut(&[Value]) -> Result<bool>,
    {
        if self.stopped {
            return Ok(false);
        }
        self.buffer.extend_from_slice(chunk);
        let mut pos = 0;
        loop {
            let (token, next) = scan_event(&self.buffer, pos, is_final, self.base_offset)?;
            pos = next;
            let event = match token {
                Some(ScanToken::Comma) => {
                    self.note_comma()?;
                    continue;
                }
                Some(ScanToken::Event(e)) => e,
                None => break,
            };
            self.check_structure(&event)?;
            if !self.handle_event(event, &mut on_row)? {
                self.stopped = true;
                self.consume(pos);
                return Ok(false);
            }
        }
        self.consume(pos);
        if is_final {
            if !self.buffer.iter().all(|b| b.is_ascii_whitespace()) {
                return Err(Error::json_format(
                    self.base_offset,
                    "truncated JSON document",
                ));
            }
            if !self.frames.is_empty() {
                return Err(Error::json_format(
                    self.base_offset,
                    "unexpected end of JSON input",
                ));
            }
        }
        Ok(true)
    }

    fn consume(&mut self, pos: usize) {
        self.buffer.drain(..pos);
        self.base_offset += pos;
    }

    fn note_comma(&mut self) -> Result<()> {
        if self.frames.is_empty() {
            return Err(Error::json_format(
                self.base_offset,
                "',' outside any container",
            ));
        }
        if !self.after_value {
            return Err(Error::json_format(self.base_offset, "unexpected ','"));
        }
        self.after_value = false;
        self.comma_pending = true;
        Ok(())
    }

    /// Reject events the grammar does not allow at this point
    fn check_structure(&mut self, event: &JsonEvent) -> Result<()> {
        match event {
            JsonEvent::Key(_) => {
                if !matches!(self.frames.last(), Some(f) if !f.is_array) {
                    return Err(Error::json_format(
                        self.base_offset,
                        "object key outside an object",
                    ));
                }
                if self.after_value {
                    return Err(Error::json_format(
                        self.base_offset,
                        "missing ',' between object members",
                    ));
                }
                if self.pending_key.is_some() {
                    return Err(Error::json_format(
                        self.base_offset,
                        "two keys for one object member",
                    ));
                }
                self.comma_pending = false;
            }
            JsonEvent::StartObject | JsonEvent::StartArray | JsonEvent::Primitive(_) => {
                if self.after_value {
                    let message = if self.frames.is_empty() {
                        "unexpected content after the top-level value"
                    } else {
                        "missing ',' between values"
                    };
                    return Err(Error::json_format(self.base_offset, message));
                }
                if matches!(self.frames.last(), Some(f) if !f.is_array)
                    && self.pending_key.is_none()
                {
                    return Err(Error::json_format(
                        self.base_offset,
                        "value without a key in an object",
                    ));
                }
                self.comma_pending = false;
                self.after_value = matches!(event, JsonEvent::Primitive(_));
            }
            JsonEvent::EndObject | JsonEvent::EndArray => {
                if self.comma_pending {
                    return Err(Error::json_format(self.base_offset, "trailing ','"));
                }
                if self.pending_key.is_some() {
                    return Err(Error::json_format(
                        self.base_offset,
                        "missing value after object key",
                    ));
                }
                self.after_value = true;
            }
        }
        Ok(())
    }

    fn handle_event<F>(&mut self, event: JsonEvent, on_row: &mut F) -> Result<bool>
    where
        F: FnMut(&[Value]) -> Result<bool>,
    {
        match event {
            JsonEvent::Key(key) => {
                self.pending_key = Some(key);
                Ok(true)
            }
            JsonEvent::StartObject => {
                self.on_container_start(false);
                Ok(true)
            }
            JsonEvent::StartArray => {
                self.on_container_start(true);
                Ok(true)
            }
            JsonEvent::EndObject => self.on_container_end(false, on_row),
            JsonEvent::EndArray => self.on_container_end(true, on_row),
            JsonEvent::Primitive(value) => self.on_primitive(value, on_row),
        }
    }

    fn on_container_start(&mut self, is_array: bool) {
        let key = self.pending_key.take();
        let elem_index = self.next_element_index(key.is_some());
        let mut row_array_found = false;
        let mut stepped = false;

        if self.in_row {
            if let Some(k) = &key {
                for m in &mut self.matchers {
                    m.enter_key(k);
                }
                stepped = true;
            } else if let Some(i) = elem_index {
                for m in &mut self.matchers {
                    m.enter_index(i);
                }
                stepped = true;
            }
        } else if self.row_array_depth == Some(self.frames.len()) {
            // a direct element of the row array opens a row
            self.in_row = true;
            self.row_root_depth = self.frames.len();
        } else if self.prefix_matches(key.as_deref()) {
            if self.wildcard {
                row_array_found = is_array && self.row_array_depth.is_none();
            } else {
                self.in_row = true;
                self.row_root_depth = self.frames.len();
            }
        }

        if let Some(k) = &key {
            self.key_path.push(k.clone());
        }
        self.frames.push(Frame {
            is_array,
            has_key: key.is_some(),
            stepped,
            entry_count: 0,
        });
        if row_array_found {
            self.row_array_depth = Some(self.frames.len());
        }
    }

    fn on_container_end<F>(&mut self, is_array: bool, on_row: &mut F) -> Result<bool>
    where
        F: FnMut(&[Value]) -> Result<bool>,
    {
        let frame = match self.frames.pop() {
            Some(f) => f,
            None => {
                return Err(Error::json_format(
                    self.base_offset,
                    "close without a matching open",
                ))
            }
        };
        if frame.is_array != is_array {
            return Err(Error::json_format(
                self.base_offset,
                "mismatched container close",
            ));
        }
        if frame.has_key {
            self.key_path.pop();
        }
        if self.row_array_depth == Some(self.frames.len() + 1) && is_array {
            self.row_array_depth = None;
        }

        if self.in_row {
            if self.frames.len() == self.row_root_depth {
                self.in_row = false;
                return self.fire_row(on_row);
            }
            if frame.stepped {
                for m in &mut self.matchers {
                    m.leave();
                }
            }
        }
        Ok(true)
    }

    fn on_primitive<F>(&mut self, value: Value, on_row: &mut F) -> Result<bool>
    where
        F: FnMut(&[Value]) -> Result<bool>,
    {
        let key = self.pending_key.take();
        let elem_index = self.next_element_index(key.is_some());

        if self.in_row {
            let stepped = if let Some(k) = &key {
                for m in &mut self.matchers {
                    m.enter_key(k);
                }
                true
            } else if let Some(i) = elem_index {
                for m in &mut self.matchers {
                    m.enter_index(i);
                }
                true
            } else {
                false
            };
            if stepped {
                for (slot, m) in self.matchers.iter_mut().enumerate() {
                    if m.is_match() {
                        self.row_values[slot] = value.clone();
                    }
                }
                for m in &mut self.matchers {
                    m.leave();
                }
            }
            Ok(true)
        } else if self.row_array_depth == Some(self.frames.len()) && elem_index.is_some() {
            // a bare primitive element of the row array is a row with no
            // matchable variables
            self.fire_row(on_row)
        } else {
            Ok(true)
        }
    }

    /// Element index when the enclosing container is an array
    fn next_element_index(&mut self, has_key: bool) -> Option<usize> {
        if has_key {
            return None;
        }
        match self.frames.last_mut() {
            Some(frame) if frame.is_array => {
                let index = frame.entry_count;
                frame.entry_count += 1;
                Some(index)
            }
            _ => None,
        }
    }

    fn prefix_matches(&self, key: Option<&str>) -> bool {
        match key {
            None => self.prefix.is_empty() && self.frames.is_empty(),
            Some(k) => {
                self.prefix.len() == self.key_path.len() + 1
                    && self
                        .key_path
                        .iter()
                        .zip(&self.prefix)
                        .all(|(have, want)| have.eq_ignore_ascii_case(want))
                    && k.eq_ignore_ascii_case(&self.prefix[self.prefix.len() - 1])
            }
        }
    }

    fn fire_row<F>(&mut self, on_row: &mut F) -> Result<bool>
    where
        F: FnMut(&[Value]) -> Result<bool>,
    {
        let keep_going = on_row(&self.row_values)?;
        for slot in &mut self.row_values {
            *slot = Value::null_unknown();
        }
        for m in &mut self.matchers {
            m.reset();
        }
        Ok(keep_going)
    }
}

// ============================================================================
// Event scanning
// ============================================================================

/// Scan the next token starting at `pos`
///
/// Returns `(None, carry_pos)` when the remaining bytes do not hold a
/// complete token and more input may follow; the caller re-scans from
/// `carry_pos` once the next chunk arrives.
fn scan_event(
    buf: &[u8],
    mut pos: usize,
    is_final: bool,
    base: usize,
) -> Result<(Option<ScanToken>, usize)> {
    while pos < buf.len() && matches!(buf[pos], b' ' | b'\t' | b'\n' | b'\r') {
        pos += 1;
    }
    if pos >= buf.len() {
        return Ok((None, pos));
    }
    if buf[pos] == b',' {
        return Ok((Some(ScanToken::Comma), pos + 1));
    }
    let (event, next) = match buf[pos] {
        b'{' => (Some(JsonEvent::StartObject), pos + 1),
        b'}' => (Some(JsonEvent::EndObject), pos + 1),
        b'[' => (Some(JsonEvent::StartArray), pos + 1),
        b']' => (Some(JsonEvent::EndArray), pos + 1),
        b'"' => scan_string(buf, pos, is_final, base)?,
        b't' => scan_literal(buf, pos, is_final, base, b"true", Value::Boolean(true))?,
        b'f' => scan_literal(buf, pos, is_final, base, b"false", Value::Boolean(false))?,
        b'n' => scan_literal(buf, pos, is_final, base, b"null", Value::null_unknown())?,
        b'-' | b'0'..=b'9' => scan_number(buf, pos, is_final, base)?,
        other => {
            return Err(Error::json_format(
                base + pos,
                format!("unexpected character 0x{:02x}", other),
            ))
        }
    };
    Ok((event.map(ScanToken::Event), next))
}

/// A string token; decides key vs. value by peeking for a colon
fn scan_string(
    buf: &[u8],
    pos: usize,
    is_final: bool,
    base: usize,
) -> Result<(Option<JsonEvent>, usize)> {
    let (text, after) = match decode_string(buf, pos, base)? {
        Some(parsed) => parsed,
        None => {
            if is_final {
                return Err(Error::json_format(base + pos, "unterminated string"));
            }
            return Ok((None, pos));
        }
    };
    let mut peek = after;
    while peek < buf.len() && matches!(buf[peek], b' ' | b'\t' | b'\n' | b'\r') {
        peek += 1;
    }
    if peek >= buf.len() && !is_final {
        // cannot yet tell a key from a value
        return Ok((None, pos));
    }
    if peek < buf.len() && buf[peek] == b':' {
        Ok((Some(JsonEvent::Key(text)), peek + 1))
    } else {
        Ok((Some(JsonEvent::Primitive(Value::text(text))), after))
    }
}

/// Decode a quoted string starting at the opening quote; None when the
/// buffer ends before the closing quote
fn decode_string(buf: &[u8], pos: usize, base: usize) -> Result<Option<(String, usize)>> {
    let mut out = String::new();
    let mut i = pos + 1;
    while i < buf.len() {
        match buf[i] {
            b'"' => return Ok(Some((out, i + 1))),
            b'\\' => {
                if i + 1 >= buf.len() {
                    return Ok(None);
                }
                i += 1;
                match buf[i] {
                    b'"' => out.push('"'),
                    b'\\' => out.push('\\'),
                    b'/' => out.push('/'),
                    b'b' => out.push('\u{0008}'),
                    b'f' => out.push('\u{000c}'),
                    b'n' => out.push('\n'),
                    b'r' => out.push('\r'),
                    b't' => out.push('\t'),
                    b'u' => {
                        if i + 4 >= buf.len() {
                            return Ok(None);
                        }
                        let code = decode_hex4(&buf[i + 1..i + 5], base + i)?;
                        i += 4;
                        let ch = match code {
                            0xd800..=0xdbff => {
                                // a high surrogate needs its pair
                                if i + 6 >= buf.len() {
                                    return Ok(None);
                                }
                                if buf[i + 1] != b'\\' || buf[i + 2] != b'u' {
                                    return Err(Error::json_format(
                                        base + i,
                                        "unpaired surrogate escape",
                                    ));
                                }
                                let low = decode_hex4(&buf[i + 3..i + 7], base + i)?;
                                i += 6;
                                let combined = 0x10000
                                    + ((code as u32 - 0xd800) << 10)
                                    + (low as u32 - 0xdc00);
                                char::from_u32(combined)
                            }
                            _ => char::from_u32(code as u32),
                        };
                        match ch {
                            Some(c) => out.push(c),
                            None => {
                                return Err(Error::json_format(
                                    base + i,
                                    "invalid unicode escape",
                                ))
                            }
                        }
                    }
                    other => {
                        return Err(Error::json_format(
                            base + i,
                            format!("invalid escape '\\{}'", other as char),
                        ))
                    }
                }
                i += 1;
            }
            _ => {
                // copy a run of plain bytes, validating UTF-8 lazily
                let run_start = i;
                while i < buf.len() && buf[i] != b'"' && buf[i] != b'\\' {
                    i += 1;
                }
                match std::str::from_utf8(&buf[run_start..i]) {
                    Ok(s) => out.push_str(s),
                    Err(_) if i >= buf.len() => return Ok(None),
                    Err(_) => {
                        return Err(Error::json_format(
                            base + run_start,
                            "invalid UTF-8 in string",
                        ))
                    }
                }
            }
        }
    }
    Ok(None)
}

fn decode_hex4(bytes: &[u8], offset: usize) -> Result<u16> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::json_format(offset, "invalid unicode escape"))?;
    u16::from_str_radix(text, 16).map_err(|_| Error::json_format(offset, "invalid unicode escape"))
}

fn scan_literal(
    buf: &[u8],
    pos: usize,
    is_final: bool,
    base: usize,
    literal: &[u8],
    value: Value,
) -> Result<(Option<JsonEvent>, usize)> {
    let available = &buf[pos..(pos + literal.len()).min(buf.len())];
    if available == literal {
        return Ok((Some(JsonEvent::Primitive(value)), pos + literal.len()));
    }
    if literal.starts_with(available) && !is_final {
        return Ok((None, pos));
    }
    Err(Error::json_format(base + pos, "unrecognized token"))
}

fn scan_number(
    buf: &[u8],
    pos: usize,
    is_final: bool,
    base: usize,
) -> Result<(Option<JsonEvent>, usize)> {
    let mut end = pos;
    while end < buf.len()
        && matches!(buf[end], b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
    {
        end += 1;
    }
    if end >= buf.len() && !is_final {
        // the number might continue in the next chunk
        return Ok((None, pos));
    }
    let text = std::str::from_utf8(&buf[pos..end])
        .map_err(|_| Error::json_format(base + pos, "invalid number"))?;
    let value = if text.contains(['.', 'e', 'E']) {
        match text.parse::<f64>() {
            Ok(v) => Value::Float(v),
            Err(_) => return Err(Error::json_format(base + pos, "invalid number")),
        }
    } else {
        match text.parse::<i64>() {
            Ok(v) => Value::Integer(v),
            Err(_) => match text.parse::<f64>() {
                Ok(v) => Value::Float(v),
                Err(_) => return Err(Error::json_format(base + pos, "invalid number")),
            },
        }
    };
    Ok((Some(JsonEvent::Primitive(value)), end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::matcher::{parse_path, PathMatcher};

    fn decoder(prefix: &[&str], wildcard: bool, paths: &[&str]) -> JsonDecoder {
        let matchers = paths
            .iter()
            .map(|p| PathMatcher::new(parse_path(p).unwrap()))
            .collect();
        JsonDecoder::new(prefix.iter().map(|s| s.to_string()).collect(), wildcard, matchers)
    }

    fn collect_rows(d: &mut JsonDecoder, chunks: &[&[u8]]) -> Vec<Vec<Value>> {
        let mut rows = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let is_final = i + 1 == chunks.len();
            d.process_chunk(chunk, is_final, |values| {
                rows.push(values.to_vec());
                Ok(true)
            })
            .unwrap();
        }
        rows
    }

    #[test]
    fn test_whole_document_row() {
        let mut d = decoder(&[], false, &["name", "qty"]);
        let rows = collect_rows(&mut d, &[br#"{"name":"pen","qty":7}"#]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Value::text("pen"));
        assert_eq!(rows[0][1], Value::Integer(7));
    }

    #[test]
    fn test_wildcard_array_rows() {
        let mut d = decoder(&[], true, &["v"]);
        let rows = collect_rows(&mut d, &[br#"[{"v":1},{"v":2},{"x":3}]"#]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], Value::Integer(1));
        assert_eq!(rows[1][0], Value::Integer(2));
        assert!(rows[2][0].is_null());
    }

    #[test]
    fn test_prefix_selects_nested_rows() {
        let mut d = decoder(&["payload"], true, &["v"]);
        let rows = collect_rows(
            &mut d,
            &[br#"{"meta":{"v":99},"payload":[{"v":1},{"v":2}]}"#],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Value::Integer(1));
        assert_eq!(rows[1][0], Value::Integer(2));
    }

    #[test]
    fn test_nested_path_variable() {
        let mut d = decoder(&[], true, &["a.b"]);
        let rows = collect_rows(&mut d, &[br#"[{"a":{"b":5}},{"a":{"c":6}}]"#]);
        assert_eq!(rows[0][0], Value::Integer(5));
        assert!(rows[1][0].is_null());
    }

    #[test]
    fn test_array_index_variable() {
        let mut d = decoder(&[], true, &["tags[1]"]);
        let rows = collect_rows(&mut d, &[br#"[{"tags":["a","b","c"]},{"tags":["x"]}]"#]);
        assert_eq!(rows[0][0], Value::text("b"));
        assert!(rows[1][0].is_null());
    }

    #[test]
    fn test_later_sibling_overwrites() {
        let mut d = decoder(&[], false, &["v"]);
        let rows = collect_rows(&mut d, &[br#"{"v":1,"v":2}"#]);
        assert_eq!(rows[0][0], Value::Integer(2));
    }

    #[test]
    fn test_deeper_occurrence_does_not_match() {
        let mut d = decoder(&[], false, &["v"]);
        let rows = collect_rows(&mut d, &[br#"{"wrap":{"v":1},"v":2}"#]);
        assert_eq!(rows[0][0], Value::Integer(2));
    }

    #[test]
    fn test_chunk_split_mid_token() {
        let body = br#"[{"value":12345},{"value":678}]"#;
        // split at every offset; the rows must come out identically
        for cut in 0..body.len() {
            let mut d = decoder(&[], true, &["value"]);
            let rows = collect_rows(&mut d, &[&body[..cut], &body[cut..]]);
            assert_eq!(rows.len(), 2, "cut at {}", cut);
            assert_eq!(rows[0][0], Value::Integer(12345), "cut at {}", cut);
            assert_eq!(rows[1][0], Value::Integer(678), "cut at {}", cut);
        }
    }

    #[test]
    fn test_primitive_types() {
        let mut d = decoder(&[], false, &["s", "f", "b", "n"]);
        let rows = collect_rows(
            &mut d,
            &[br#"{"s":"x","f":1.5,"b":true,"n":null}"#],
        );
        assert_eq!(rows[0][0], Value::text("x"));
        assert_eq!(rows[0][1], Value::Float(1.5));
        assert_eq!(rows[0][2], Value::Boolean(true));
        assert!(rows[0][3].is_null());
    }

    #[test]
    fn test_string_escapes() {
        let mut d = decoder(&[], false, &["s"]);
        let rows = collect_rows(&mut d, &[br#"{"s":"a\"b\nA"}"#]);
        assert_eq!(rows[0][0], Value::text("a\"b\nA"));
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let mut d = decoder(&[], false, &["v"]);
        let err = d
            .process_chunk(br#"{"v":@}"#, true, |_| Ok(true))
            .unwrap_err();
        assert!(matches!(err, Error::JsonFormat { .. }));
    }

    #[test]
    fn test_missing_comma_between_elements_is_fatal() {
        let mut d = decoder(&[], true, &["v"]);
        let err = d
            .process_chunk(br#"[{"v":1}{"v":2}]"#, true, |_| Ok(true))
            .unwrap_err();
        assert!(matches!(err, Error::JsonFormat { .. }));
    }

    #[test]
    fn test_missing_comma_between_members_is_fatal() {
        let mut d = decoder(&[], false, &["a"]);
        let err = d
            .process_chunk(br#"{"a":1 "b":2}"#, true, |_| Ok(true))
            .unwrap_err();
        assert!(matches!(err, Error::JsonFormat { .. }));
    }

    #[test]
    fn test_stray_commas_are_fatal() {
        for body in [
            br#"[,1]"#.as_slice(),
            br#"[1,,2]"#.as_slice(),
            br#"[1,]"#.as_slice(),
            br#"{"a":1,}"#.as_slice(),
        ] {
            let mut d = decoder(&[], true, &["v"]);
            let err = d.process_chunk(body, true, |_| Ok(true)).unwrap_err();
            assert!(
                matches!(err, Error::JsonFormat { .. }),
                "accepted {:?}",
                std::str::from_utf8(body)
            );
        }
    }

    #[test]
    fn test_second_top_level_document_is_fatal() {
        let mut d = decoder(&[], false, &["v"]);
        let err = d
            .process_chunk(br#"{"v":1}{"v":2}"#, true, |_| Ok(true))
            .unwrap_err();
        assert!(matches!(err, Error::JsonFormat { .. }));
    }

    #[test]
    fn test_member_value_without_key_is_fatal() {
        let mut d = decoder(&[], false, &["a"]);
        let err = d
            .process_chunk(br#"{"a":1,2}"#, true, |_| Ok(true))
            .unwrap_err();
        assert!(matches!(err, Error::JsonFormat { .. }));
    }

    #[test]
    fn test_key_without_value_is_fatal() {
        let mut d = decoder(&[], false, &["a"]);
        let err = d.process_chunk(br#"{"a":}"#, true, |_| Ok(true)).unwrap_err();
        assert!(matches!(err, Error::JsonFormat { .. }));
    }

    #[test]
    fn test_missing_comma_detected_across_chunk_split() {
        let body = br#"[{"v":1}{"v":2}]"#;
        for cut in 0..body.len() {
            let mut d = decoder(&[], true, &["v"]);
            let first = d.process_chunk(&body[..cut], false, |_| Ok(true));
            let outcome = first.and_then(|_| d.process_chunk(&body[cut..], true, |_| Ok(true)));
            assert!(
                matches!(outcome, Err(Error::JsonFormat { .. })),
                "cut at {}",
                cut
            );
        }
    }

    #[test]
    fn test_unbalanced_document_is_fatal() {
        let mut d = decoder(&[], false, &["v"]);
        let err = d.process_chunk(br#"{"v":1"#, true, |_| Ok(true)).unwrap_err();
        assert!(matches!(err, Error::JsonFormat { .. }));
    }

    #[test]
    fn test_row_callback_stop() {
        let mut d = decoder(&[], true, &["v"]);
        let mut seen = 0;
        let more = d
            .process_chunk(br#"[{"v":1},{"v":2},{"v":3}]"#, true, |_| {
                seen += 1;
                Ok(seen < 2)
            })
            .unwrap();
        assert!(!more);
        assert_eq!(seen, 2);
    }
}
