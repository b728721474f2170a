// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Refactoring detection oracle interface
//!
//! An oracle walks history (a branch, or the commits of a pull request) and
//! reports one [`DetectionOutcome`](crate::dispatch::DetectionOutcome) per
//! commit to a [`DetectionHandler`]. Per-commit problems are reported as
//! failures through the handler; only problems that stop the whole walk are
//! returned as [`OracleError`].

use std::sync::Arc;
use std::time::Duration;

use refminer_git::{GitError, GitRepo};
use thiserror::Error;

use crate::dispatch::DetectionHandler;
use crate::reporter::ReportError;

/// Errors that end an oracle's driving call
#[derive(Debug, Error)]
pub enum OracleError {
    /// History could not be read
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// The handler could not write a report row
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Pull request mining ran past its time budget
    #[error("Pull request mining exceeded its {seconds}s budget")]
    Timeout {
        /// The budget, in seconds
        seconds: u64,
    },

    /// Scratch space for a fetched pull request could not be prepared
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The detection worker pool could not be started
    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A refactoring detection engine
pub trait RefactoringOracle: Send + Sync {
    /// Analyze every commit reachable from `branch`
    ///
    /// # Errors
    ///
    /// Returns `OracleError` when the walk itself cannot continue.
    fn detect_all(
        &self,
        repo: &GitRepo,
        branch: &str,
        handler: &dyn DetectionHandler,
    ) -> Result<(), OracleError>;

    /// Analyze the commits of pull request `number` of the repository at `url`
    ///
    /// # Errors
    ///
    /// Returns `OracleError` when the pull request cannot be fetched, the
    /// walk cannot continue, or `timeout` is exceeded.
    fn detect_at_pull_request(
        &self,
        url: &str,
        number: u32,
        handler: &dyn DetectionHandler,
        timeout: Duration,
    ) -> Result<(), OracleError>;
}

impl<O: RefactoringOracle + ?Sized> RefactoringOracle for Arc<O> {
    fn detect_all(
        &self,
        repo: &GitRepo,
        branch: &str,
        handler: &dyn DetectionHandler,
    ) -> Result<(), OracleError> {
        (**self).detect_all(repo, branch, handler)
    }

    fn detect_at_pull_request(
        &self,
        url: &str,
        number: u32,
        handler: &dyn DetectionHandler,
        timeout: Duration,
    ) -> Result<(), OracleError> {
        (**self).detect_at_pull_request(url, number, handler, timeout)
    }
}
