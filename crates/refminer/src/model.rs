// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Refactoring data and the flat records written to the reports
//!
//! A [`Refactoring`] is what a detection oracle reports for a commit. The
//! dispatcher flattens it into one [`RefactoringRecord`] for the main report
//! and one [`CodeRangeRecord`] per located span for the code-range report.
//! Both records share the `commit`, `refactoringType` and `refactoringName`
//! columns so the two files can be joined.

use std::fmt;

/// Separator used when a list is embedded inside a single report cell
pub const LIST_SEPARATOR: &str = ",";

/// Which state of the code a range belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Location before the refactoring
    Left,
    /// Location after the refactoring
    Right,
}

impl Side {
    /// Column value for this side
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located span of source touched by a refactoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRange {
    /// Repository-relative path of the file
    pub file_path: String,
    /// First line, 1-based
    pub start_line: u32,
    /// Last line, 1-based
    pub end_line: u32,
    /// First column, 1-based
    pub start_column: u32,
    /// Last column, 1-based
    pub end_column: u32,
    /// Kind of program element (method declaration, field, file, ...)
    pub code_element_type: String,
    /// Free-text description of the range
    pub description: String,
    /// The program element itself, when the oracle names one
    pub code_element: Option<String>,
}

/// One detected refactoring instance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Refactoring {
    /// Machine-readable kind, e.g. `EXTRACT_OPERATION`
    pub refactoring_type: String,
    /// Human-readable name, e.g. `Extract Method`
    pub name: String,
    /// Classes involved before the refactoring, distinct, in discovery order
    pub classes_before: Vec<String>,
    /// Classes involved after the refactoring, distinct, in discovery order
    pub classes_after: Vec<String>,
    /// Full textual description
    pub description: String,
    /// Ranges in the code before the refactoring
    pub left_side: Vec<CodeRange>,
    /// Ranges in the code after the refactoring
    pub right_side: Vec<CodeRange>,
}

impl Refactoring {
    /// Ranges for one side, in the order the oracle reported them
    #[must_use]
    pub fn ranges(&self, side: Side) -> &[CodeRange] {
        match side {
            Side::Left => &self.left_side,
            Side::Right => &self.right_side,
        }
    }

    /// Number of code-range rows this refactoring produces
    #[must_use]
    pub fn range_count(&self) -> usize {
        self.left_side.len() + self.right_side.len()
    }
}

/// A row of the main report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefactoringRecord {
    /// Commit the refactoring was detected in
    pub commit_id: String,
    /// Refactoring kind
    pub refactoring_type: String,
    /// Refactoring name
    pub name: String,
    /// Classes before, already joined
    pub classes_before: String,
    /// Classes after, already joined
    pub classes_after: String,
    /// Delimiter-free description
    pub description: String,
}

impl RefactoringRecord {
    /// Column header of the main report
    pub const HEADER: [&'static str; 6] = [
        "commit",
        "refactoringType",
        "refactoringName",
        "classesBefore",
        "classesAfter",
        "description",
    ];

    /// Render the record in header order
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.commit_id.clone(),
            self.refactoring_type.clone(),
            self.name.clone(),
            self.classes_before.clone(),
            self.classes_after.clone(),
            self.description.clone(),
        ]
    }
}

/// A row of the code-range report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRangeRecord {
    /// Commit of the parent refactoring
    pub commit_id: String,
    /// Kind of the parent refactoring
    pub refactoring_type: String,
    /// Name of the parent refactoring
    pub refactoring_name: String,
    /// Before or after
    pub side: Side,
    /// Program element, empty when unnamed
    pub code_element: String,
    /// Kind of program element
    pub code_element_type: String,
    /// File of the range
    pub file_path: String,
    /// First line
    pub start_line: u32,
    /// Last line
    pub end_line: u32,
    /// First column
    pub start_column: u32,
    /// Last column
    pub end_column: u32,
    /// Delimiter-free description
    pub description: String,
}

impl CodeRangeRecord {
    /// Column header of the code-range report
    pub const HEADER: [&'static str; 12] = [
        "commit",
        "refactoringType",
        "refactoringName",
        "side",
        "codeElement",
        "codeElementType",
        "filePath",
        "startLine",
        "endLine",
        "startColumn",
        "endColumn",
        "description",
    ];

    /// Render the record in header order
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.commit_id.clone(),
            self.refactoring_type.clone(),
            self.refactoring_name.clone(),
            self.side.to_string(),
            self.code_element.clone(),
            self.code_element_type.clone(),
            self.file_path.clone(),
            self.start_line.to_string(),
            self.end_line.to_string(),
            self.start_column.to_string(),
            self.end_column.to_string(),
            self.description.clone(),
        ]
    }
}

/// Header as owned column names, as reporters take it
#[must_use]
pub fn header_of(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_string()).collect()
}
