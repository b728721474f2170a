// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Mining run orchestration
//!
//! A run opens the two reports, resolves whether it mines a branch history
//! or a single pull request, drives the oracle with a handler that writes
//! rows and advances progress, and finally closes everything. Failures of
//! individual commits are logged and skipped; a failure of the run itself
//! is logged and ends the run as [`RunState::Aborted`]. `run` never returns
//! an error.
//!
//! # Example
//!
//! ```no_run
//! use refminer::file_move::FileMoveOracle;
//! use refminer::miner::{MiningOptions, MiningOrchestrator};
//! use refminer::progress::ProgressTracker;
//!
//! let options = MiningOptions {
//!     branch: "main".to_string(),
//!     ..Default::default()
//! };
//! let miner = MiningOrchestrator::new(FileMoveOracle::new(), options, ProgressTracker::new());
//! let outcome = miner.run();
//! println!("{:?}: {} refactorings", outcome.state, outcome.refactorings);
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use refminer_git::{GitError, GitRepo};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::dispatch::{DetectionDispatcher, DetectionHandler, DetectionOutcome};
use crate::model::{CodeRangeRecord, RefactoringRecord, header_of};
use crate::oracle::{OracleError, RefactoringOracle};
use crate::progress::ProgressTracker;
use crate::reporter::{CsvReporter, ReportError, StructuredReporter};

/// Time budget handed to the oracle for a pull request
pub const PULL_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Default file name of the main report
pub const DEFAULT_REPORT_FILENAME: &str = "refminer_commits.csv";

/// File name of the code-range report, next to the main report
pub const CODE_RANGE_FILENAME: &str = "refminer-coderange.csv";

/// Errors that abort a mining run
#[derive(Debug, Error)]
pub enum MiningError {
    /// The pull request text is not a number
    #[error("Invalid pull request number: {value:?}")]
    InvalidPullRequest {
        /// The rejected text
        value: String,
    },

    /// The local repository could not be opened or walked
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// The oracle's driving call failed
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// A report could not be created
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// What a run mines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningMode {
    /// Every commit reachable from a local branch
    FullHistory {
        /// Branch to walk
        branch: String,
    },
    /// The commits of one pull request of a remote repository
    PullRequest {
        /// Remote repository URL
        url: String,
        /// Pull request number
        number: u32,
        /// Budget passed to the oracle
        timeout: Duration,
    },
}

impl MiningMode {
    /// Decide the mode from the raw options
    ///
    /// Pull request mode needs both a URL and a positive pull request
    /// number. A missing URL or pull request, or a number of zero or less,
    /// selects full-history mode on `branch`.
    ///
    /// # Errors
    ///
    /// Returns `MiningError::InvalidPullRequest` when a URL is given and the
    /// pull request text is not an integer.
    pub fn resolve(git_url: &str, pull_request: &str, branch: &str) -> Result<Self, MiningError> {
        let url = git_url.trim();
        let pull_request = pull_request.trim();
        let full_history = || Self::FullHistory {
            branch: branch.to_string(),
        };

        if url.is_empty() || pull_request.is_empty() {
            return Ok(full_history());
        }

        let invalid = || MiningError::InvalidPullRequest {
            value: pull_request.to_string(),
        };
        let number: i64 = pull_request.parse().map_err(|_| invalid())?;
        if number <= 0 {
            return Ok(full_history());
        }

        Ok(Self::PullRequest {
            url: url.to_string(),
            number: u32::try_from(number).map_err(|_| invalid())?,
            timeout: PULL_REQUEST_TIMEOUT,
        })
    }
}

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not started
    Init,
    /// Preparing a branch walk
    FullHistory,
    /// Preparing a pull request
    PullRequest,
    /// Oracle is running
    Running,
    /// Oracle returned normally
    Completed,
    /// The run failed; rows already written stay valid
    Aborted,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// `Completed` or `Aborted`
    pub state: RunState,
    /// Resolved mode, if resolution succeeded
    pub mode: Option<MiningMode>,
    /// Commits reported by the oracle
    pub commits: u64,
    /// Commits that could not be analyzed
    pub failures: u64,
    /// Main-report rows written
    pub refactorings: u64,
    /// Code-range rows written
    pub code_ranges: u64,
}

/// Where and what to mine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningOptions {
    /// Local repository for full-history mode
    pub repo_path: PathBuf,
    /// Remote URL for pull request mode
    pub git_url: String,
    /// Branch for full-history mode
    pub branch: String,
    /// Pull request number as text
    pub pull_request: String,
    /// Main report destination
    pub main_report: PathBuf,
    /// Code-range report destination
    pub code_range_report: PathBuf,
}

impl Default for MiningOptions {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            git_url: String::new(),
            branch: "master".to_string(),
            pull_request: String::new(),
            main_report: PathBuf::from(DEFAULT_REPORT_FILENAME),
            code_range_report: PathBuf::from(CODE_RANGE_FILENAME),
        }
    }
}

impl MiningOptions {
    /// Resolve the mining mode of these options
    ///
    /// # Errors
    ///
    /// See [`MiningMode::resolve`].
    pub fn mode(&self) -> Result<MiningMode, MiningError> {
        MiningMode::resolve(&self.git_url, &self.pull_request, &self.branch)
    }
}

/// Detection handler used during a run: writes rows, counts, advances progress
struct MiningHandler<'a> {
    dispatcher: DetectionDispatcher,
    progress: &'a ProgressTracker,
    commits: AtomicU64,
    failures: AtomicU64,
    refactorings: AtomicU64,
    code_ranges: AtomicU64,
}

impl<'a> MiningHandler<'a> {
    fn new(dispatcher: DetectionDispatcher, progress: &'a ProgressTracker) -> Self {
        Self {
            dispatcher,
            progress,
            commits: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            refactorings: AtomicU64::new(0),
            code_ranges: AtomicU64::new(0),
        }
    }

    fn outcome(&self, state: RunState, mode: Option<MiningMode>) -> RunOutcome {
        RunOutcome {
            state,
            mode,
            commits: self.commits.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            refactorings: self.refactorings.load(Ordering::SeqCst),
            code_ranges: self.code_ranges.load(Ordering::SeqCst),
        }
    }
}

impl DetectionHandler for MiningHandler<'_> {
    fn handle(&self, commit_id: &str, outcome: DetectionOutcome) -> Result<(), ReportError> {
        let result = match outcome {
            DetectionOutcome::Success(refactorings) => self
                .dispatcher
                .on_success(commit_id, &refactorings)
                .map(|stats| {
                    self.refactorings
                        .fetch_add(stats.refactorings as u64, Ordering::SeqCst);
                    self.code_ranges
                        .fetch_add(stats.code_ranges as u64, Ordering::SeqCst);
                }),
            DetectionOutcome::Failure(failure) => {
                self.dispatcher.on_failure(commit_id, &failure);
                self.failures.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        };

        self.commits.fetch_add(1, Ordering::SeqCst);
        self.progress.step();
        result
    }
}

/// Drives one oracle over a repository and writes the two reports
pub struct MiningOrchestrator<O> {
    oracle: O,
    options: MiningOptions,
    progress: ProgressTracker,
    state: Mutex<RunState>,
}

impl<O: RefactoringOracle> MiningOrchestrator<O> {
    /// Create an orchestrator
    #[must_use]
    pub fn new(oracle: O, options: MiningOptions, progress: ProgressTracker) -> Self {
        Self {
            oracle,
            options,
            progress,
            state: Mutex::new(RunState::Init),
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Progress of the current or last run
    #[must_use]
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// The detection engine
    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Options of this orchestrator
    #[must_use]
    pub fn options(&self) -> &MiningOptions {
        &self.options
    }

    fn transition(&self, next: RunState) {
        let mut state = self.state.lock();
        debug!(from = ?*state, to = ?next, "Run state changed");
        *state = next;
    }

    /// Run with CSV reports at the configured destinations
    pub fn run(&self) -> RunOutcome {
        self.transition(RunState::Init);

        let main = match CsvReporter::create(
            &self.options.main_report,
            header_of(&RefactoringRecord::HEADER),
        ) {
            Ok(report) => report,
            Err(e) => return self.abort_before_start(&MiningError::from(e)),
        };
        let ranges = match CsvReporter::create(
            &self.options.code_range_report,
            header_of(&CodeRangeRecord::HEADER),
        ) {
            Ok(report) => report,
            Err(e) => {
                close_report("main", &main);
                return self.abort_before_start(&MiningError::from(e));
            }
        };

        self.run_with_reporters(Arc::new(main), Arc::new(ranges))
    }

    fn abort_before_start(&self, e: &MiningError) -> RunOutcome {
        error!(error = %e, "Could not open reports");
        self.transition(RunState::Aborted);
        self.progress.finish();
        RunOutcome {
            state: RunState::Aborted,
            mode: None,
            commits: 0,
            failures: 0,
            refactorings: 0,
            code_ranges: 0,
        }
    }

    /// Run against already opened reports
    ///
    /// Both reports are flushed and closed before returning, whatever the
    /// outcome.
    pub fn run_with_reporters(
        &self,
        main: Arc<dyn StructuredReporter>,
        ranges: Arc<dyn StructuredReporter>,
    ) -> RunOutcome {
        self.transition(RunState::Init);
        let handler = MiningHandler::new(
            DetectionDispatcher::new(Arc::clone(&main), Arc::clone(&ranges)),
            &self.progress,
        );

        let (mode, result) = match self.options.mode() {
            Ok(mode) => {
                let result = self.mine(&mode, &handler);
                (Some(mode), result)
            }
            Err(e) => (None, Err(e)),
        };

        let state = match result {
            Ok(()) => RunState::Completed,
            Err(e) => {
                error!(error = %e, "Mining aborted");
                RunState::Aborted
            }
        };

        close_report("main", main.as_ref());
        close_report("code range", ranges.as_ref());
        self.progress.finish();
        self.transition(state);

        let outcome = handler.outcome(state, mode);
        info!(
            state = ?outcome.state,
            commits = outcome.commits,
            failures = outcome.failures,
            refactorings = outcome.refactorings,
            code_ranges = outcome.code_ranges,
            "Mining finished"
        );
        outcome
    }

    fn mine(&self, mode: &MiningMode, handler: &MiningHandler<'_>) -> Result<(), MiningError> {
        match mode {
            MiningMode::PullRequest {
                url,
                number,
                timeout,
            } => {
                self.transition(RunState::PullRequest);
                info!(url = %url, number, "Mining pull request");

                self.transition(RunState::Running);
                self.oracle
                    .detect_at_pull_request(url, *number, handler, *timeout)?;
            }
            MiningMode::FullHistory { branch } => {
                self.transition(RunState::FullHistory);
                let repo = GitRepo::open(&self.options.repo_path)?;
                let total = repo.commit_count(branch)?;
                self.progress.set_total(total as u64);
                info!(
                    repo = %self.options.repo_path.display(),
                    branch = %branch,
                    commits = total,
                    "Mining branch history"
                );

                self.transition(RunState::Running);
                self.oracle.detect_all(&repo, branch, handler)?;
            }
        }
        Ok(())
    }
}

/// Flush then close; a failed flush still closes the report
fn close_report(name: &str, report: &dyn StructuredReporter) {
    if let Err(e) = report.flush() {
        warn!(report = name, error = %e, "Could not flush report");
    }
    if let Err(e) = report.close() {
        warn!(report = name, error = %e, "Could not close report");
    }
}
