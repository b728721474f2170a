// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Pull request URLs and batch mining
//!
//! A pull request is addressed by its web URL, for example
//! `https://github.com/demo/parser/pull/42/files`. [`PullRequestUrl`] turns
//! that into the clone URL and number a pull request run needs, plus a
//! stable id (`demo_parser_42`) that names the run's reports.
//!
//! [`BatchMiner`] mines a list of pull requests, one run each, writing
//! `<id>.csv` and `<id>-coderange.csv` into an output directory. A pull
//! request whose main report already exists is skipped, so an interrupted
//! batch can simply be started again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::miner::{MiningOptions, MiningOrchestrator, RunState};
use crate::oracle::RefactoringOracle;
use crate::progress::ProgressTracker;

/// `<scheme>://<host>/<owner>/<repo>/pull/<number>`, optionally followed by
/// a sub-page, query or fragment
static PULL_REQUEST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://[^/\s]+)/([^/\s]+)/([^/\s]+)/pull/([0-9]+)(?:[/?#]\S*)?$")
        .expect("Invalid regex")
});

/// Errors raised while preparing a batch
#[derive(Debug, Error)]
pub enum BatchError {
    /// The text is not a pull request URL
    #[error("Not a pull request URL: {url:?}")]
    InvalidUrl {
        /// The rejected text
        url: String,
    },

    /// The list file or output directory could not be used
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
}

/// A pull request addressed by its web URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestUrl {
    /// Repository owner
    pub owner: String,
    /// Repository name, without `.git`
    pub repo: String,
    /// Pull request number
    pub number: u32,
    /// Clone URL of the repository
    pub git_url: String,
}

impl PullRequestUrl {
    /// Parse a pull request web URL
    ///
    /// # Errors
    ///
    /// Returns `BatchError::InvalidUrl` unless the text looks like
    /// `https://<host>/<owner>/<repo>/pull/<n>[/...]` with `n` > 0.
    pub fn parse(text: &str) -> Result<Self, BatchError> {
        let text = text.trim();
        let invalid = || BatchError::InvalidUrl {
            url: text.to_string(),
        };

        let caps = PULL_REQUEST_URL.captures(text).ok_or_else(invalid)?;
        let number: u32 = caps[4].parse().map_err(|_| invalid())?;
        if number == 0 {
            return Err(invalid());
        }

        let repo = caps[3].strip_suffix(".git").unwrap_or(&caps[3]).to_string();
        Ok(Self {
            git_url: format!("{}/{}/{repo}.git", &caps[1], &caps[2]),
            owner: caps[2].to_string(),
            repo,
            number,
        })
    }

    /// Stable identifier, `<owner>_<repo>_<number>`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}_{}_{}", self.owner, self.repo, self.number)
    }

    /// Main report of this pull request under `dir`
    #[must_use]
    pub fn report_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.csv", self.id()))
    }

    /// Code-range report of this pull request under `dir`
    #[must_use]
    pub fn code_range_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}-coderange.csv", self.id()))
    }

    /// Options for one run mining this pull request into `dir`
    #[must_use]
    pub fn mining_options(&self, dir: &Path) -> MiningOptions {
        MiningOptions {
            git_url: self.git_url.clone(),
            pull_request: self.number.to_string(),
            main_report: self.report_path(dir),
            code_range_report: self.code_range_path(dir),
            ..Default::default()
        }
    }
}

/// Parse a pull request list, one URL per line
///
/// Blank lines and lines starting with `#` are ignored. Lines that are not
/// pull request URLs are logged and skipped; repeated pull requests are
/// kept once.
#[must_use]
pub fn parse_pull_request_list(text: &str) -> Vec<PullRequestUrl> {
    let mut pull_requests: Vec<PullRequestUrl> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match PullRequestUrl::parse(line) {
            Ok(pr) if pull_requests.contains(&pr) => {
                debug!(line = index + 1, id = %pr.id(), "Duplicate pull request");
            }
            Ok(pr) => pull_requests.push(pr),
            Err(e) => warn!(line = index + 1, error = %e, "Skipping pull request list entry"),
        }
    }
    pull_requests
}

/// Read and parse a pull request list file
///
/// # Errors
///
/// Returns `BatchError::Io` if the file cannot be read.
pub fn read_pull_request_list(path: &Path) -> Result<Vec<PullRequestUrl>, BatchError> {
    let text = fs::read_to_string(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_pull_request_list(&text))
}

/// Counts of a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Pull requests mined to completion
    pub mined: usize,
    /// Pull requests whose report already existed
    pub skipped: usize,
    /// Pull requests whose run aborted
    pub aborted: usize,
}

/// Mines a list of pull requests, one report pair each
pub struct BatchMiner<O> {
    oracle: O,
    output_dir: PathBuf,
    progress: ProgressTracker,
}

impl<O: RefactoringOracle + Clone> BatchMiner<O> {
    /// Create a batch miner writing into `output_dir`
    #[must_use]
    pub fn new(oracle: O, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            oracle,
            output_dir: output_dir.into(),
            progress: ProgressTracker::new(),
        }
    }

    /// Track progress over pull requests with `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    /// Progress over the pull requests of the current or last batch
    #[must_use]
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Mine every pull request in order
    ///
    /// An aborted run does not stop the batch. Its reports are removed so
    /// the next batch tries that pull request again.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::Io` if the output directory cannot be created.
    pub fn run(&self, pull_requests: &[PullRequestUrl]) -> Result<BatchSummary, BatchError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| BatchError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        self.progress.set_total(pull_requests.len() as u64);
        info!(
            pull_requests = pull_requests.len(),
            output = %self.output_dir.display(),
            "Mining pull request batch"
        );

        let mut summary = BatchSummary::default();
        for pr in pull_requests {
            let options = pr.mining_options(&self.output_dir);
            if options.main_report.exists() {
                debug!(id = %pr.id(), "Already mined");
                summary.skipped += 1;
            } else {
                self.mine_one(pr, options, &mut summary);
            }
            self.progress.step();
        }
        self.progress.finish();

        info!(
            mined = summary.mined,
            skipped = summary.skipped,
            aborted = summary.aborted,
            "Batch finished"
        );
        Ok(summary)
    }

    fn mine_one(&self, pr: &PullRequestUrl, options: MiningOptions, summary: &mut BatchSummary) {
        let reports = [options.main_report.clone(), options.code_range_report.clone()];
        let miner = MiningOrchestrator::new(self.oracle.clone(), options, ProgressTracker::new());

        if miner.run().state == RunState::Completed {
            summary.mined += 1;
            return;
        }

        warn!(id = %pr.id(), url = %pr.git_url, "Pull request not mined");
        summary.aborted += 1;
        for path in &reports {
            if let Err(e) = fs::remove_file(path)
                && e.kind() != io::ErrorKind::NotFound
            {
                warn!(path = %path.display(), error = %e, "Could not remove report");
            }
        }
    }
}
