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

//! End-to-end JSON scans

use streamsel::api::{JsonOptions, JsonScan, Query, ScanStatus};
use streamsel::Error;

fn run(query: &str, input: &[u8]) -> String {
    let query = Query::parse(query).unwrap();
    let mut scan = JsonScan::new(query, JsonOptions::default()).unwrap();
    let mut out = String::new();
    scan.process_chunk(input, true, &mut out).unwrap();
    out
}

#[test]
fn test_array_of_objects() {
    let body = br#"[{"name":"pen","qty":1},{"name":"ink","qty":5}]"#;
    assert_eq!(run("select name, qty from s3object[*];", body), "pen,1\nink,5\n");
}

#[test]
fn test_filter_on_variable() {
    let body = br#"[{"name":"pen","qty":1},{"name":"ink","qty":5}]"#;
    assert_eq!(
        run("select name from s3object[*] where qty >= 2;", body),
        "ink\n"
    );
}

#[test]
fn test_star_emits_bound_variables() {
    // `*` serializes the variables the query binds, in first-use order
    let body = br#"[{"name":"pen","qty":1},{"name":"ink","qty":5}]"#;
    assert_eq!(
        run("select * from s3object[*] where qty > 1;", body),
        "5\n"
    );
}

#[test]
fn test_single_document_row() {
    let body = br#"{"name":"pen","qty":7}"#;
    assert_eq!(run("select qty, name from s3object;", body), "7,pen\n");
}

#[test]
fn test_nested_prefix_rows() {
    let body = br#"{"meta":{"qty":999},"rows":[{"qty":1},{"qty":2}]}"#;
    assert_eq!(run("select qty from s3object[*].rows;", body), "1\n2\n");
}

#[test]
fn test_dotted_variable_path() {
    let body = br#"[{"item":{"price":10}},{"item":{"cost":3}}]"#;
    assert_eq!(
        run("select item.price from s3object[*];", body),
        "10\nnull\n"
    );
}

#[test]
fn test_array_index_path() {
    let body = br#"[{"tags":["a","b"]},{"tags":["z"]}]"#;
    assert_eq!(run("select tags[1] from s3object[*];", body), "b\nnull\n");
}

#[test]
fn test_missing_key_is_null_in_predicate() {
    let body = br#"[{"qty":1},{"other":2}]"#;
    // a NULL comparison never passes the row
    assert_eq!(run("select qty from s3object[*] where qty > 0;", body), "1\n");
}

#[test]
fn test_aggregate_over_rows() {
    let body = br#"[{"qty":2},{"qty":3},{"qty":null}]"#;
    assert_eq!(run("select sum(qty), count(qty) from s3object[*];", body), "5,2\n");
    assert_eq!(run("select count(*) from s3object[*];", body), "3\n");
}

#[test]
fn test_limit_stops_consumption() {
    let query = Query::parse("select v from s3object[*] limit 2;").unwrap();
    let mut scan = JsonScan::new(query, JsonOptions::default()).unwrap();
    let mut out = String::new();
    let status = scan
        .process_chunk(br#"[{"v":1},{"v":2},{"v":3}]"#, true, &mut out)
        .unwrap();
    assert_eq!(status, ScanStatus::LimitReached);
    assert_eq!(out, "1\n2\n");
}

#[test]
fn test_chunk_split_invariance() {
    let body = br#"[{"name":"pen","qty":1},{"name":"in\"k","qty":25}]"#.to_vec();
    let query = "select name, qty from s3object[*];";
    let whole = run(query, &body);

    for cut in 0..=body.len() {
        let parsed = Query::parse(query).unwrap();
        let mut scan = JsonScan::new(parsed, JsonOptions::default()).unwrap();
        let mut out = String::new();
        scan.process_chunk(&body[..cut], false, &mut out).unwrap();
        let status = scan.process_chunk(&body[cut..], true, &mut out).unwrap();
        assert_eq!(out, whole, "split at byte {}", cut);
        assert_eq!(status, ScanStatus::EndOfStream, "split at byte {}", cut);
    }
}

#[test]
fn test_byte_at_a_time() {
    let body = br#"[{"v":11},{"v":22}]"#;
    let parsed = Query::parse("select sum(v) from s3object[*];").unwrap();
    let mut scan = JsonScan::new(parsed, JsonOptions::default()).unwrap();
    let mut out = String::new();
    for (i, byte) in body.iter().enumerate() {
        scan.process_chunk(&[*byte], i + 1 == body.len(), &mut out)
            .unwrap();
    }
    assert_eq!(out, "33\n");
}

#[test]
fn test_sibling_duplicate_key_overwrites() {
    let body = br#"[{"v":1,"v":2}]"#;
    assert_eq!(run("select v from s3object[*];", body), "2\n");
}

#[test]
fn test_anonymous_wrapper_ignored_for_key_distance() {
    let body = br#"{"a":[{"b":41}]}"#;
    assert_eq!(run("select a.b from s3object;", body), "41\n");
}

#[test]
fn test_malformed_json_is_fatal() {
    let query = Query::parse("select v from s3object[*];").unwrap();
    let mut scan = JsonScan::new(query, JsonOptions::default()).unwrap();
    let mut out = String::new();
    let err = scan
        .process_chunk(br#"[{"v":1},{"v":}]"#, true, &mut out)
        .unwrap_err();
    assert!(matches!(err, Error::JsonFormat { .. }));
}

#[test]
fn test_missing_separator_is_fatal() {
    let query = Query::parse("select v from s3object[*];").unwrap();
    let mut scan = JsonScan::new(query, JsonOptions::default()).unwrap();
    let mut out = String::new();
    let err = scan
        .process_chunk(br#"[{"v":1}{"v":2}]"#, true, &mut out)
        .unwrap_err();
    assert!(matches!(err, Error::JsonFormat { .. }));
    assert_eq!(out, "1\n");
}

#[test]
fn test_truncated_document_is_fatal() {
    let query = Query::parse("select v from s3object[*];").unwrap();
    let mut scan = JsonScan::new(query, JsonOptions::default()).unwrap();
    let mut out = String::new();
    let err = scan
        .process_chunk(br#"[{"v":1}"#, true, &mut out)
        .unwrap_err();
    assert!(matches!(err, Error::JsonFormat { .. }));
}

#[test]
fn test_expression_over_variables() {
    let body = br#"[{"price":10,"qty":3},{"price":5,"qty":2}]"#;
    assert_eq!(
        run("select price * qty from s3object[*];", body),
        "30\n10\n"
    );
}
