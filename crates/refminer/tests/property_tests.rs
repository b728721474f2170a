// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Property-based tests for refminer
//!
//! These tests use proptest to check that report rows keep their shape and
//! order for arbitrary refactorings and descriptions.

use std::sync::Arc;

use proptest::prelude::*;

use refminer::dispatch::{DetectionDispatcher, sanitize_description};
use refminer::model::{CodeRange, CodeRangeRecord, Refactoring, RefactoringRecord, header_of};
use refminer::reporter::{FIELD_DELIMITER, LINE_SEPARATOR, MemoryReporter, format_row};

// ============================================================================
// Strategies
// ============================================================================

/// Descriptions including delimiters, quotes and line breaks
fn arbitrary_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just(";".to_string()),
        Just(";;".to_string()),
        Just("\"quoted\"".to_string()),
        Just("line\nbreak".to_string()),
        Just("crlf\r\nbreak".to_string()),
        Just("Extract Method m(); from n()".to_string()),
        Just("日本語;テスト".to_string()),
        "[a-zA-Z0-9 ;,\"]{0,40}".prop_map(|s| s),
        ".{0,60}".prop_map(|s| s),
    ]
}

fn arbitrary_range() -> impl Strategy<Value = CodeRange> {
    (arbitrary_text(), 1u32..500, 0u32..50).prop_map(|(description, start, len)| CodeRange {
        file_path: "src/Demo.java".to_string(),
        start_line: start,
        end_line: start + len,
        start_column: 1,
        end_column: 80,
        code_element_type: "METHOD_DECLARATION".to_string(),
        description,
        code_element: None,
    })
}

fn arbitrary_refactoring() -> impl Strategy<Value = Refactoring> {
    (
        arbitrary_text(),
        prop::collection::vec(arbitrary_range(), 0..4),
        prop::collection::vec(arbitrary_range(), 0..4),
    )
        .prop_map(|(description, left_side, right_side)| Refactoring {
            refactoring_type: "MOVE_OPERATION".to_string(),
            name: "Move Method".to_string(),
            classes_before: vec!["demo.A".to_string()],
            classes_after: vec!["demo.B".to_string()],
            description,
            left_side,
            right_side,
        })
}

/// Split formatted rows back into cells, honoring quotes
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    quoted = false;
                }
            } else {
                cell.push(c);
            }
            continue;
        }
        match c {
            '"' => quoted = true,
            c if c == FIELD_DELIMITER => row.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            c => cell.push(c),
        }
    }
    rows
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Sanitizing twice changes nothing further and leaves no delimiter
    #[test]
    fn sanitize_is_idempotent(text in arbitrary_text()) {
        let once = sanitize_description(&text).into_owned();
        prop_assert!(!once.contains(FIELD_DELIMITER));
        prop_assert_eq!(sanitize_description(&once).into_owned(), once.clone());
        prop_assert_eq!(once.chars().count(), text.chars().count());
    }

    /// K refactorings yield K main rows and one range row per range, left before right
    #[test]
    fn dispatch_row_counts_and_order(
        refactorings in prop::collection::vec(arbitrary_refactoring(), 0..6)
    ) {
        let main = Arc::new(MemoryReporter::new(header_of(&RefactoringRecord::HEADER)));
        let ranges = Arc::new(MemoryReporter::new(header_of(&CodeRangeRecord::HEADER)));
        let dispatcher = DetectionDispatcher::new(main.clone(), ranges.clone());

        let stats = dispatcher.on_success("c0ffee", &refactorings).expect("dispatch");
        let expected_ranges: usize = refactorings.iter().map(Refactoring::range_count).sum();

        prop_assert_eq!(main.len(), refactorings.len());
        prop_assert_eq!(ranges.len(), expected_ranges);
        prop_assert_eq!(stats.refactorings, refactorings.len());
        prop_assert_eq!(stats.code_ranges, expected_ranges);

        let expected_sides: Vec<&str> = refactorings
            .iter()
            .flat_map(|r| {
                std::iter::repeat_n("left", r.left_side.len())
                    .chain(std::iter::repeat_n("right", r.right_side.len()))
            })
            .collect();
        let rows = ranges.rows();
        let sides: Vec<&str> = rows.iter().map(|row| row[3].as_str()).collect();
        prop_assert_eq!(sides, expected_sides);

        for row in main.rows().iter().chain(rows.iter()) {
            prop_assert!(row.iter().last().is_some_and(|d| !d.contains(FIELD_DELIMITER)));
        }
    }

    /// Quoted cells never split or merge rows
    #[test]
    fn quoting_preserves_rows(
        rows in prop::collection::vec(prop::collection::vec(arbitrary_text(), 1..6), 1..5)
    ) {
        let text: String = rows.iter().map(|fields| format_row(fields)).collect();
        prop_assert!(text.ends_with(LINE_SEPARATOR));
        prop_assert_eq!(parse_rows(&text), rows);
    }
}
