// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Translation of per-commit detection results into report rows
//!
//! Oracles deliver one [`DetectionOutcome`] per commit through a
//! [`DetectionHandler`]. The [`DetectionDispatcher`] turns a successful
//! outcome into main-report and code-range rows; a failed outcome is only
//! logged, so a commit that could not be analyzed never leaves partial rows.

use std::borrow::Cow;
use std::sync::Arc;

use refminer_git::GitError;
use thiserror::Error;
use tracing::{debug, error};

use crate::model::{
    CodeRange, CodeRangeRecord, LIST_SEPARATOR, Refactoring, RefactoringRecord, Side,
};
use crate::reporter::{FIELD_DELIMITER, ReportError, StructuredReporter};

/// Why a single commit could not be analyzed
#[derive(Debug, Error)]
pub enum DetectionError {
    /// Reading the commit from the repository failed
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// The oracle could not make sense of the commit
    #[error("{message}")]
    Analysis {
        /// Description of the failure
        message: String,
    },
}

/// Result of analyzing one commit
#[derive(Debug)]
pub enum DetectionOutcome {
    /// Refactorings found, in discovery order (possibly none)
    Success(Vec<Refactoring>),
    /// The commit could not be analyzed
    Failure(DetectionError),
}

/// Receives one outcome per analyzed commit
///
/// Oracles may call `handle` from several threads at once. An `Err` means
/// the reports can no longer be written; oracles stop and return it from
/// their driving call.
pub trait DetectionHandler: Send + Sync {
    /// Handle the outcome for `commit_id`
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if a report row could not be written.
    fn handle(&self, commit_id: &str, outcome: DetectionOutcome) -> Result<(), ReportError>;
}

impl<F> DetectionHandler for F
where
    F: Fn(&str, DetectionOutcome) -> Result<(), ReportError> + Send + Sync,
{
    fn handle(&self, commit_id: &str, outcome: DetectionOutcome) -> Result<(), ReportError> {
        self(commit_id, outcome)
    }
}

/// Rows written for one commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Main-report rows
    pub refactorings: usize,
    /// Code-range rows
    pub code_ranges: usize,
}

/// Replace every row delimiter in a description with a comma
///
/// Lossy but deterministic; text without delimiters is returned untouched.
#[must_use]
pub fn sanitize_description(description: &str) -> Cow<'_, str> {
    if description.contains(FIELD_DELIMITER) {
        Cow::Owned(description.replace(FIELD_DELIMITER, ","))
    } else {
        Cow::Borrowed(description)
    }
}

/// Join class names, keeping the first occurrence of each
fn join_distinct(classes: &[String]) -> String {
    let mut seen: Vec<&str> = Vec::with_capacity(classes.len());
    for class in classes {
        if !seen.contains(&class.as_str()) {
            seen.push(class);
        }
    }
    seen.join(LIST_SEPARATOR)
}

/// Flatten a refactoring into its main-report record
///
/// Repeated class names are written once, in first-seen order.
#[must_use]
pub fn refactoring_record(commit_id: &str, refactoring: &Refactoring) -> RefactoringRecord {
    RefactoringRecord {
        commit_id: commit_id.to_string(),
        refactoring_type: refactoring.refactoring_type.clone(),
        name: refactoring.name.clone(),
        classes_before: join_distinct(&refactoring.classes_before),
        classes_after: join_distinct(&refactoring.classes_after),
        description: sanitize_description(&refactoring.description).into_owned(),
    }
}

/// Flatten one range of a refactoring into its code-range record
#[must_use]
pub fn code_range_record(
    commit_id: &str,
    refactoring: &Refactoring,
    side: Side,
    range: &CodeRange,
) -> CodeRangeRecord {
    CodeRangeRecord {
        commit_id: commit_id.to_string(),
        refactoring_type: refactoring.refactoring_type.clone(),
        refactoring_name: refactoring.name.clone(),
        side,
        code_element: range.code_element.clone().unwrap_or_default(),
        code_element_type: range.code_element_type.clone(),
        file_path: range.file_path.clone(),
        start_line: range.start_line,
        end_line: range.end_line,
        start_column: range.start_column,
        end_column: range.end_column,
        description: sanitize_description(&range.description).into_owned(),
    }
}

/// Writes detected refactorings to the main and code-range reports
#[derive(Clone)]
pub struct DetectionDispatcher {
    main: Arc<dyn StructuredReporter>,
    ranges: Arc<dyn StructuredReporter>,
}

impl DetectionDispatcher {
    /// Create a dispatcher over the two report streams
    #[must_use]
    pub fn new(main: Arc<dyn StructuredReporter>, ranges: Arc<dyn StructuredReporter>) -> Self {
        Self { main, ranges }
    }

    /// Write the rows for a successfully analyzed commit
    ///
    /// Each refactoring yields one main row, then its left ranges, then its
    /// right ranges.
    ///
    /// # Errors
    ///
    /// Returns the first `ReportError` raised by either reporter.
    pub fn on_success(
        &self,
        commit_id: &str,
        refactorings: &[Refactoring],
    ) -> Result<DispatchStats, ReportError> {
        let mut stats = DispatchStats::default();

        for refactoring in refactorings {
            self.main
                .write(&refactoring_record(commit_id, refactoring).fields())?;
            stats.refactorings += 1;

            for side in [Side::Left, Side::Right] {
                for range in refactoring.ranges(side) {
                    self.ranges
                        .write(&code_range_record(commit_id, refactoring, side, range).fields())?;
                    stats.code_ranges += 1;
                }
            }
        }

        debug!(
            commit = commit_id,
            refactorings = stats.refactorings,
            code_ranges = stats.code_ranges,
            "Reported commit"
        );
        Ok(stats)
    }

    /// Log a commit that could not be analyzed; nothing is written
    pub fn on_failure(&self, commit_id: &str, failure: &DetectionError) {
        error!(commit = commit_id, error = %failure, "Can't handle commit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::header_of;
    use crate::reporter::MemoryReporter;
    use similar_asserts::assert_eq;

    fn range(path: &str, line: u32, description: &str) -> CodeRange {
        CodeRange {
            file_path: path.to_string(),
            start_line: line,
            end_line: line + 2,
            start_column: 1,
            end_column: 40,
            code_element_type: "METHOD_DECLARATION".to_string(),
            description: description.to_string(),
            code_element: Some(format!("m{line}()")),
        }
    }

    fn extract_method() -> Refactoring {
        Refactoring {
            refactoring_type: "Extract Method".to_string(),
            name: "EM".to_string(),
            classes_before: vec!["demo.Parser".to_string()],
            classes_after: vec!["demo.Parser".to_string(), "demo.Lexer".to_string()],
            description: "Extract Method m2() : void; extracted from m1()".to_string(),
            left_side: vec![range("Parser.java", 10, "source; method")],
            right_side: vec![
                range("Parser.java", 10, "original"),
                range("Parser.java", 30, "extracted"),
            ],
        }
    }

    fn reporters() -> (Arc<MemoryReporter>, Arc<MemoryReporter>) {
        (
            Arc::new(MemoryReporter::new(header_of(&RefactoringRecord::HEADER))),
            Arc::new(MemoryReporter::new(header_of(&CodeRangeRecord::HEADER))),
        )
    }

    #[test]
    fn test_sanitize_description() {
        assert_eq!(sanitize_description("a;b;;c"), "a,b,,c");
        assert!(matches!(sanitize_description("no delimiter"), Cow::Borrowed(_)));
        assert_eq!(sanitize_description(""), "");
    }

    #[test]
    fn test_record_lists_each_class_once() {
        let refactoring = Refactoring {
            classes_before: vec![
                "demo.Parser".to_string(),
                "demo.Lexer".to_string(),
                "demo.Parser".to_string(),
            ],
            classes_after: vec!["demo.Token".to_string(), "demo.Token".to_string()],
            ..extract_method()
        };
        let record = refactoring_record("c1", &refactoring);
        assert_eq!(record.classes_before, "demo.Parser,demo.Lexer");
        assert_eq!(record.classes_after, "demo.Token");
        assert_eq!(refactoring_record("c1", &Refactoring::default()).classes_before, "");
    }

    #[test]
    fn test_on_success_writes_main_then_ranges() {
        let (main, ranges) = reporters();
        let dispatcher = DetectionDispatcher::new(main.clone(), ranges.clone());

        let stats = dispatcher
            .on_success("c1", &[extract_method()])
            .expect("dispatch");
        assert_eq!(
            stats,
            DispatchStats {
                refactorings: 1,
                code_ranges: 3
            }
        );

        let main_rows = main.rows();
        assert_eq!(main_rows.len(), 1);
        assert_eq!(main_rows[0][0], "c1");
        assert_eq!(main_rows[0][3], "demo.Parser");
        assert_eq!(main_rows[0][4], "demo.Parser,demo.Lexer");
        assert_eq!(
            main_rows[0][5],
            "Extract Method m2() : void, extracted from m1()"
        );

        let range_rows = ranges.rows();
        let sides: Vec<&str> = range_rows.iter().map(|r| r[3].as_str()).collect();
        assert_eq!(sides, vec!["left", "right", "right"]);
        let starts: Vec<&str> = range_rows.iter().map(|r| r[7].as_str()).collect();
        assert_eq!(starts, vec!["10", "10", "30"]);
        assert_eq!(range_rows[0][4], "m10()");
        assert_eq!(range_rows[0][11], "source, method");
        for row in &range_rows {
            assert_eq!(row[0], "c1");
            assert_eq!(row[1], "Extract Method");
            assert_eq!(row[2], "EM");
        }
    }

    #[test]
    fn test_refactorings_keep_discovery_order() {
        let (main, ranges) = reporters();
        let dispatcher = DetectionDispatcher::new(main.clone(), ranges.clone());

        let mut rename = extract_method();
        rename.refactoring_type = "Rename Class".to_string();
        rename.left_side.clear();
        rename.right_side.truncate(1);

        dispatcher
            .on_success("c2", &[extract_method(), rename])
            .expect("dispatch");

        let types: Vec<String> = main.rows().into_iter().map(|r| r[1].clone()).collect();
        assert_eq!(types, vec!["Extract Method", "Rename Class"]);
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges.rows()[3][1], "Rename Class");
    }

    #[test]
    fn test_missing_code_element_is_empty_cell() {
        let (main, ranges) = reporters();
        let dispatcher = DetectionDispatcher::new(main, ranges.clone());
        let mut refactoring = extract_method();
        refactoring.left_side[0].code_element = None;

        dispatcher.on_success("c3", &[refactoring]).expect("dispatch");
        assert_eq!(ranges.rows()[0][4], "");
    }

    #[test]
    fn test_empty_success_writes_nothing() {
        let (main, ranges) = reporters();
        let dispatcher = DetectionDispatcher::new(main.clone(), ranges.clone());
        let stats = dispatcher.on_success("c4", &[]).expect("dispatch");
        assert_eq!(stats, DispatchStats::default());
        assert!(main.is_empty());
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_on_failure_writes_nothing() {
        let (main, ranges) = reporters();
        let dispatcher = DetectionDispatcher::new(main.clone(), ranges.clone());
        dispatcher.on_failure(
            "c5",
            &DetectionError::Analysis {
                message: "parse error".to_string(),
            },
        );
        assert!(main.is_empty());
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_report_failure_propagates() {
        let main = Arc::new(MemoryReporter::new(header_of(&RefactoringRecord::HEADER)));
        let ranges =
            Arc::new(MemoryReporter::new(header_of(&CodeRangeRecord::HEADER)).failing_after(1));
        let dispatcher = DetectionDispatcher::new(main, ranges);

        let result = dispatcher.on_success("c6", &[extract_method()]);
        assert!(matches!(result, Err(ReportError::Io(_))));
    }

    #[test]
    fn test_closure_handler() {
        let handler = |commit_id: &str, outcome: DetectionOutcome| {
            assert_eq!(commit_id, "c7");
            assert!(matches!(outcome, DetectionOutcome::Success(ref r) if r.is_empty()));
            Ok::<(), ReportError>(())
        };
        handler
            .handle("c7", DetectionOutcome::Success(Vec::new()))
            .expect("handle");
    }
}
