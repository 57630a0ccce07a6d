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

//! End-to-end delimited-text scans

use streamsel::api::{CsvOptions, CsvScan, Query, ScanStatus};
use streamsel::executor::{OutputFormat, OutputOptions};
use streamsel::Error;

fn run(query: &str, input: &[u8]) -> String {
    run_with(query, input, CsvOptions::default())
}

fn run_with(query: &str, input: &[u8], options: CsvOptions) -> String {
    let query = Query::parse(query).unwrap();
    let mut scan = CsvScan::new(query, options).unwrap();
    let mut out = String::new();
    scan.process_chunk(input, true, &mut out).unwrap();
    out
}

#[test]
fn test_projection_and_filter() {
    assert_eq!(
        run("select _1, _2 from stdin where int(_1) > 1;", b"1,2\n3,4\n"),
        "3,4\n"
    );
}

#[test]
fn test_star_projects_every_column() {
    assert_eq!(run("select * from stdin;", b"1,2\n"), "1,2\n");
    assert_eq!(
        run("select * from stdin where int(_1) > 1;", b"1,2\n3,4\n"),
        "3,4\n"
    );
}

#[test]
fn test_star_keeps_ragged_widths() {
    assert_eq!(run("select * from stdin;", b"a\nb,c,d\n"), "a\nb,c,d\n");
}

#[test]
fn test_sum_aggregate() {
    assert_eq!(run("select sum(int(_1)) from stdin;", b"1,2\n3,4\n"), "4\n");
}

#[test]
fn test_numeric_reference() {
    assert_eq!(run("select -5 + 0.5 + -0.25 from stdin;", b"x\n"), "-4.75\n");
}

#[test]
fn test_count_star_over_all_rows() {
    assert_eq!(run("select count(*) from stdin;", b"a\nb\nc\n"), "3\n");
    assert_eq!(run("select sum(1) from stdin;", b"a\nb\nc\n"), "3\n");
}

#[test]
fn test_min_max_avg() {
    let input = b"5\n2\n9\n";
    assert_eq!(
        run(
            "select min(int(_1)), max(int(_1)), avg(int(_1)) from stdin;",
            input
        ),
        "2,9,5.333333333333333\n"
    );
}

#[test]
fn test_avg_over_zero_rows_is_null() {
    assert_eq!(
        run("select avg(int(_1)) from stdin where int(_1) > 10;", b"1\n2\n"),
        "null\n"
    );
}

#[test]
fn test_chunk_split_invariance() {
    let input = b"10,aa\n20,bb\n30,cc\n";
    let query = "select _2, int(_1) + 1 from stdin where int(_1) >= 20;";
    let whole = run(query, input);
    assert_eq!(whole, "bb,21\ncc,31\n");

    for cut in 0..=input.len() {
        let parsed = Query::parse(query).unwrap();
        let mut scan = CsvScan::new(parsed, CsvOptions::default()).unwrap();
        let mut out = String::new();
        scan.process_chunk(&input[..cut], false, &mut out).unwrap();
        scan.process_chunk(&input[cut..], true, &mut out).unwrap();
        assert_eq!(out, whole, "split at byte {}", cut);
    }
}

#[test]
fn test_chunk_split_inside_quoted_field() {
    let input = b"\"a,1\",x\n\"b,2\",y\n";
    let query = "select _1 from stdin;";
    let whole = run(query, input);
    assert_eq!(whole, "\"a,1\"\n\"b,2\"\n");

    for cut in 0..=input.len() {
        let parsed = Query::parse(query).unwrap();
        let mut scan = CsvScan::new(parsed, CsvOptions::default()).unwrap();
        let mut out = String::new();
        scan.process_chunk(&input[..cut], false, &mut out).unwrap();
        scan.process_chunk(&input[cut..], true, &mut out).unwrap();
        assert_eq!(out, whole, "split at byte {}", cut);
    }
}

#[test]
fn test_many_small_chunks() {
    let input = b"1,2\n3,4\n5,6\n";
    let parsed = Query::parse("select sum(int(_2)) from stdin;").unwrap();
    let mut scan = CsvScan::new(parsed, CsvOptions::default()).unwrap();
    let mut out = String::new();
    for (i, byte) in input.iter().enumerate() {
        let is_final = i + 1 == input.len();
        scan.process_chunk(&[*byte], is_final, &mut out).unwrap();
    }
    assert_eq!(out, "12\n");
}

#[test]
fn test_limit_reached_status() {
    let parsed = Query::parse("select _1 from stdin limit 2;").unwrap();
    let mut scan = CsvScan::new(parsed, CsvOptions::default()).unwrap();
    let mut out = String::new();
    let status = scan.process_chunk(b"a\nb\nc\nd\n", true, &mut out).unwrap();
    assert_eq!(status, ScanStatus::LimitReached);
    assert_eq!(out, "a\nb\n");
}

#[test]
fn test_header_schema_binding() {
    let options = CsvOptions {
        use_header: true,
        ..CsvOptions::default()
    };
    let out = run_with(
        "select name from stdin where int(qty) >= 2;",
        b"name,qty\npen,1\nink,2\nclip,9\n",
        options,
    );
    assert_eq!(out, "ink\nclip\n");
}

#[test]
fn test_header_names_are_case_insensitive() {
    let options = CsvOptions {
        use_header: true,
        ..CsvOptions::default()
    };
    let out = run_with("select NAME from stdin;", b"Name\npen\n", options);
    assert_eq!(out, "pen\n");
}

#[test]
fn test_alias_shadowing_header_column_rejected() {
    let parsed = Query::parse("select _1 as qty from stdin;").unwrap();
    let mut scan = CsvScan::new(
        parsed,
        CsvOptions {
            use_header: true,
            ..CsvOptions::default()
        },
    )
    .unwrap();
    let mut out = String::new();
    let err = scan
        .process_chunk(b"name,qty\npen,1\n", true, &mut out)
        .unwrap_err();
    assert!(matches!(err, Error::AliasShadowsColumn(_)));
}

#[test]
fn test_custom_input_delimiters() {
    let options = CsvOptions {
        column_delimiter: b'|',
        row_delimiter: b';',
        ..CsvOptions::default()
    };
    let out = run_with("select _2 from stdin;", b"1|a;2|b;", options);
    assert_eq!(out, "a\nb\n");
}

#[test]
fn test_custom_output_delimiters() {
    let options = CsvOptions {
        output: OutputOptions {
            column_delimiter: '\t',
            row_delimiter: '\n',
            ..OutputOptions::default()
        },
        ..CsvOptions::default()
    };
    let out = run_with("select _1, _2 from stdin;", b"a,b\n", options);
    assert_eq!(out, "a\tb\n");
}

#[test]
fn test_always_quote_output() {
    let options = CsvOptions {
        output: OutputOptions {
            always_quote: true,
            ..OutputOptions::default()
        },
        ..CsvOptions::default()
    };
    let out = run_with("select _1, int(_2) from stdin;", b"a,2\n", options);
    assert_eq!(out, "\"a\",\"2\"\n");
}

#[test]
fn test_tagged_json_output() {
    let options = CsvOptions {
        output: OutputOptions {
            format: OutputFormat::TaggedJson,
            ..OutputOptions::default()
        },
        ..CsvOptions::default()
    };
    let out = run_with("select _1 as tag, int(_2) from stdin;", b"a,2\n", options);
    assert_eq!(out, "{\"tag\":\"a\",\"_2\":2}\n");
}

#[test]
fn test_quoted_and_escaped_fields() {
    assert_eq!(
        run("select _2 from stdin;", b"\"a,a\",\"b\nb\"\nx,y\n"),
        "\"b\nb\"\ny\n"
    );
    assert_eq!(run("select _1 from stdin;", b"a\\,a,z\n"), "\"a,a\"\n");
}

#[test]
fn test_recoverable_row_errors_do_not_abort() {
    let out = run("select int(_1) * 2 from stdin;", b"1\nbogus\n3\n");
    assert_eq!(out, "2\n6\n");
}

#[test]
fn test_unterminated_quote_is_fatal() {
    let parsed = Query::parse("select _1 from stdin;").unwrap();
    let mut scan = CsvScan::new(parsed, CsvOptions::default()).unwrap();
    let mut out = String::new();
    let err = scan.process_chunk(b"\"never closed", true, &mut out).unwrap_err();
    assert!(matches!(err, Error::CsvFormat { .. }));
}

#[test]
fn test_crlf_rows() {
    assert_eq!(run("select _2 from stdin;", b"1,a\r\n2,b\r\n"), "a\nb\n");
}

#[test]
fn test_empty_input() {
    assert_eq!(run("select _1 from stdin;", b""), "");
    assert_eq!(run("select count(*) from stdin;", b""), "0\n");
}

#[test]
fn test_alias_reuse_in_projection() {
    let out = run(
        "select int(_1) + 1 as total, total * 10 from stdin;",
        b"4\n",
    );
    assert_eq!(out, "5,50\n");
}

#[test]
fn test_case_expression_per_row() {
    let out = run(
        "select case when int(_1) > 2 then 'hi' else 'lo' end from stdin;",
        b"1\n5\n",
    );
    assert_eq!(out, "lo\nhi\n");
}
