// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use flotilla_core::test_support::bare_workstream;

#[test]
fn text_format_prints_without_erroring() {
    let workstream = bare_workstream("demo");
    print_workstream(&workstream, OutputFormat::Text).unwrap();
    print_workstream_list(&[workstream], OutputFormat::Text).unwrap();
}

#[test]
fn json_format_round_trips_through_serde() {
    let workstream = bare_workstream("demo");
    print_workstream(&workstream, OutputFormat::Json).unwrap();
}

#[test]
fn empty_list_prints_a_placeholder_line_in_text_mode() {
    print_workstream_list(&[], OutputFormat::Text).unwrap();
}
