// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Built-in oracle that detects file moves and renames
//!
//! Every non-merge commit is diffed against its first parent with rename
//! detection. Each renamed path becomes one refactoring whose left range
//! covers the old file and whose right range covers the new one.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::ThreadPool;
use rayon::prelude::*;
use refminer_git::{ChangeStatus, FileChange, GitError, GitRepo};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::dispatch::{DetectionError, DetectionHandler, DetectionOutcome};
use crate::model::{CodeRange, Refactoring};
use crate::oracle::{OracleError, RefactoringOracle};
use crate::reporter::ReportError;

/// Commits handed to the worker pool at a time
const DEFAULT_BATCH_SIZE: usize = 64;

/// Code element type of whole-file ranges
const FILE_ELEMENT: &str = "FILE";

/// How a path changed between two commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMove {
    /// Same directory, new file name
    Rename,
    /// New directory, same file name
    Move,
    /// Both directory and file name changed
    MoveAndRename,
}

impl FileMove {
    /// Classify a path change; `None` when the paths are identical
    #[must_use]
    pub fn classify(old_path: &str, new_path: &str) -> Option<Self> {
        let (old, new) = (Path::new(old_path), Path::new(new_path));
        let same_dir = old.parent() == new.parent();
        let same_name = old.file_name() == new.file_name();

        match (same_dir, same_name) {
            (true, true) => None,
            (true, false) => Some(Self::Rename),
            (false, true) => Some(Self::Move),
            (false, false) => Some(Self::MoveAndRename),
        }
    }

    /// Machine-readable refactoring type
    #[must_use]
    pub fn refactoring_type(&self) -> &'static str {
        match self {
            Self::Rename => "RENAME_FILE",
            Self::Move => "MOVE_FILE",
            Self::MoveAndRename => "MOVE_RENAME_FILE",
        }
    }

    /// Human-readable refactoring name
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Rename => "Rename File",
            Self::Move => "Move File",
            Self::MoveAndRename => "Move And Rename File",
        }
    }
}

fn whole_file(path: &str, lines: usize, description: &str) -> CodeRange {
    let end_line = u32::try_from(lines.max(1)).unwrap_or(u32::MAX);
    CodeRange {
        file_path: path.to_string(),
        start_line: 1,
        end_line,
        start_column: 1,
        end_column: 1,
        code_element_type: FILE_ELEMENT.to_string(),
        description: description.to_string(),
        code_element: Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
    }
}

/// Turn a renamed file into a refactoring; other changes yield `None`
#[must_use]
pub fn file_refactoring(change: &FileChange) -> Option<Refactoring> {
    if change.status != ChangeStatus::Renamed {
        return None;
    }
    let old_path = change.old_path.as_deref()?;
    let new_path = change.new_path.as_deref()?;
    let kind = FileMove::classify(old_path, new_path)?;

    Some(Refactoring {
        refactoring_type: kind.refactoring_type().to_string(),
        name: kind.display_name().to_string(),
        classes_before: vec![old_path.to_string()],
        classes_after: vec![new_path.to_string()],
        description: format!("{} {old_path} to {new_path}", kind.display_name()),
        left_side: vec![whole_file(old_path, change.old_lines, "original file")],
        right_side: vec![whole_file(new_path, change.new_lines, "moved file")],
    })
}

/// Oracle reporting file-level moves and renames
#[derive(Debug, Clone)]
pub struct FileMoveOracle {
    jobs: usize,
    batch_size: usize,
    scratch_dir: PathBuf,
}

impl Default for FileMoveOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl FileMoveOracle {
    /// Create an oracle that analyzes commits on the calling thread
    #[must_use]
    pub fn new() -> Self {
        Self {
            jobs: 1,
            batch_size: DEFAULT_BATCH_SIZE,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Analyze commits on `jobs` worker threads (1 keeps the calling thread)
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Directory under which pull requests are fetched
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Create a fresh directory for pull request `number`, removed on drop
    fn scratch_for(&self, number: u32) -> std::io::Result<TempDir> {
        let scratch = tempfile::Builder::new()
            .prefix(&format!("refminer-pr-{number}-"))
            .tempdir_in(&self.scratch_dir)?;
        debug!(path = %scratch.path().display(), "Created scratch directory");
        Ok(scratch)
    }

    /// Analyze one commit
    ///
    /// Merge commits are reported as analyzed with no refactorings.
    #[must_use]
    pub fn detect_commit(repo: &GitRepo, sha: &str) -> DetectionOutcome {
        match Self::analyze(repo, sha) {
            Ok(refactorings) => DetectionOutcome::Success(refactorings),
            Err(e) => DetectionOutcome::Failure(DetectionError::from(e)),
        }
    }

    fn analyze(repo: &GitRepo, sha: &str) -> Result<Vec<Refactoring>, GitError> {
        let commit = repo.get_commit(sha)?;
        if commit.is_merge() {
            debug!(commit = sha, "Skipping merge commit");
            return Ok(Vec::new());
        }
        Ok(repo
            .file_changes(sha)?
            .iter()
            .filter_map(file_refactoring)
            .collect())
    }

    fn detect_batch(
        pool: &ThreadPool,
        repo_path: &Path,
        batch: &[String],
        handler: &dyn DetectionHandler,
    ) -> Result<(), ReportError> {
        pool.install(|| {
            batch
                .par_iter()
                .map_init(
                    || GitRepo::open(repo_path),
                    |repo, sha| {
                        let outcome = match repo {
                            Ok(repo) => Self::detect_commit(repo, sha),
                            Err(e) => DetectionOutcome::Failure(DetectionError::Analysis {
                                message: format!("worker could not open repository: {e}"),
                            }),
                        };
                        handler.handle(sha, outcome)
                    },
                )
                .collect()
        })
    }
}

impl RefactoringOracle for FileMoveOracle {
    fn detect_all(
        &self,
        repo: &GitRepo,
        branch: &str,
        handler: &dyn DetectionHandler,
    ) -> Result<(), OracleError> {
        if self.jobs == 1 {
            for sha in repo.log(branch)? {
                let sha = sha?;
                handler.handle(&sha, Self::detect_commit(repo, &sha))?;
            }
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("refminer-worker-{i}"))
            .build()?;
        debug!(jobs = self.jobs, batch_size = self.batch_size, "Started detection workers");

        let mut batch = Vec::with_capacity(self.batch_size);
        for sha in repo.log(branch)? {
            batch.push(sha?);
            if batch.len() == self.batch_size {
                Self::detect_batch(&pool, repo.path(), &batch, handler)?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            Self::detect_batch(&pool, repo.path(), &batch, handler)?;
        }
        Ok(())
    }

    fn detect_at_pull_request(
        &self,
        url: &str,
        number: u32,
        handler: &dyn DetectionHandler,
        timeout: Duration,
    ) -> Result<(), OracleError> {
        let started = Instant::now();
        let scratch = self.scratch_for(number)?;
        let (repo, range) = GitRepo::fetch_pull_request(url, number, scratch.path())?;
        let commits = repo.pull_request_commits(&range)?;
        info!(url, number, commits = commits.len(), "Fetched pull request");

        for sha in &commits {
            if started.elapsed() > timeout {
                warn!(url, number, "Pull request mining timed out");
                return Err(OracleError::Timeout {
                    seconds: timeout.as_secs(),
                });
            }
            handler.handle(sha, Self::detect_commit(&repo, sha))?;
        }
        Ok(())
    }
}
