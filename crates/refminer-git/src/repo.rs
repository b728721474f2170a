// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Repository access for history mining
//!
//! This module wraps a `git2::Repository` with the handful of operations the
//! miner needs: enumerating the commits of a branch, reading a commit's
//! file-level changes with rename detection, and fetching a pull request
//! from a remote.

use std::io::BufRead;
use std::path::Path;

use git2::{BranchType, Delta, DiffFindOptions, Direction, Oid, Repository, Sort};
use tracing::debug;

use crate::commit::Commit;
use crate::error::GitError;

/// Kind of file-level change between a commit and its first parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// File created by the commit
    Added,
    /// File removed by the commit
    Deleted,
    /// File content changed in place
    Modified,
    /// File moved or renamed, possibly with edits
    Renamed,
    /// File copied from another path
    Copied,
    /// Type changes, unreadable entries and the like
    Other,
}

impl From<Delta> for ChangeStatus {
    fn from(delta: Delta) -> Self {
        match delta {
            Delta::Added => Self::Added,
            Delta::Deleted => Self::Deleted,
            Delta::Modified => Self::Modified,
            Delta::Renamed => Self::Renamed,
            Delta::Copied => Self::Copied,
            _ => Self::Other,
        }
    }
}

/// One file-level change of a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Change status
    pub status: ChangeStatus,
    /// Path before the commit (None for added files)
    pub old_path: Option<String>,
    /// Path after the commit (None for deleted files)
    pub new_path: Option<String>,
    /// Line count of the old blob, 0 when absent
    pub old_lines: usize,
    /// Line count of the new blob, 0 when absent
    pub new_lines: usize,
}

/// Commits of a fetched pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRange {
    /// Pull request number
    pub number: u32,
    /// SHA the pull request head points to
    pub head: String,
    /// Tip of the target branch, when the remote publishes a merge ref
    pub base: Option<String>,
}

/// A git repository wrapper for mining commits
pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    /// Open a git repository at the given path
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if the path is not a git repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|_| GitError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self { repo })
    }

    /// Discover and open a git repository containing the given path
    ///
    /// This walks up the directory tree to find a `.git` directory.
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if no repository is found.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|_| GitError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self { repo })
    }

    /// Get the repository path (the `.git` directory for non-bare repos)
    #[must_use]
    pub fn path(&self) -> &Path {
        self.repo.path()
    }

    /// Get the working directory path (None for bare repos)
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Resolve a branch name to the commit it points to
    ///
    /// Local branches win over `origin/<branch>`, which wins over any other
    /// revision expression (tag, SHA, `HEAD~3`, ...).
    fn resolve_branch(&self, branch: &str) -> Result<Oid, GitError> {
        let invalid = || GitError::InvalidReference {
            reference: branch.to_string(),
        };

        if let Ok(local) = self.repo.find_branch(branch, BranchType::Local) {
            return local.get().peel_to_commit().map(|c| c.id()).map_err(|_| invalid());
        }
        if let Ok(remote) = self
            .repo
            .find_branch(&format!("origin/{branch}"), BranchType::Remote)
        {
            return remote.get().peel_to_commit().map(|c| c.id()).map_err(|_| invalid());
        }
        self.repo
            .revparse_single(branch)
            .and_then(|obj| obj.peel_to_commit())
            .map(|c| c.id())
            .map_err(|_| invalid())
    }

    /// Lazily enumerate the commits reachable from `branch`, newest first
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidReference` if the branch cannot be resolved.
    pub fn log(
        &self,
        branch: &str,
    ) -> Result<impl Iterator<Item = Result<String, GitError>> + '_, GitError> {
        let tip = self.resolve_branch(branch)?;
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
        revwalk.push(tip)?;

        Ok(revwalk.map(|oid| oid.map(|o| o.to_string()).map_err(GitError::from)))
    }

    /// Count the commits reachable from `branch`
    ///
    /// This is a full traversal of the branch history.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the branch cannot be resolved or walked.
    pub fn commit_count(&self, branch: &str) -> Result<usize, GitError> {
        let mut count = 0;
        for id in self.log(branch)? {
            id?;
            count += 1;
        }
        Ok(count)
    }

    fn find_commit(&self, reference: &str) -> Result<git2::Commit<'_>, GitError> {
        self.repo
            .revparse_single(reference)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|_| GitError::InvalidReference {
                reference: reference.to_string(),
            })
    }

    /// Get commit metadata by SHA or reference
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidReference` if the reference cannot be resolved.
    pub fn get_commit(&self, reference: &str) -> Result<Commit, GitError> {
        Ok(Commit::from_git2(&self.find_commit(reference)?))
    }

    /// List the file-level changes of a commit against its first parent
    ///
    /// Rename detection is enabled, so a moved file shows up as a single
    /// `Renamed` change instead of a delete/add pair. Root commits are
    /// compared against the empty tree.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the commit cannot be found or diffed.
    pub fn file_changes(&self, sha: &str) -> Result<Vec<FileChange>, GitError> {
        let git_commit = self.find_commit(sha)?;
        let tree = git_commit.tree()?;
        let parent_tree = if git_commit.parent_count() > 0 {
            Some(git_commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))?;

        let changes = diff
            .deltas()
            .map(|delta| {
                let status = ChangeStatus::from(delta.status());
                let old_path = match status {
                    ChangeStatus::Added => None,
                    _ => delta.old_file().path().map(|p| p.display().to_string()),
                };
                let new_path = match status {
                    ChangeStatus::Deleted => None,
                    _ => delta.new_file().path().map(|p| p.display().to_string()),
                };
                FileChange {
                    status,
                    old_path,
                    new_path,
                    old_lines: self.line_count(delta.old_file().id()),
                    new_lines: self.line_count(delta.new_file().id()),
                }
            })
            .collect();

        Ok(changes)
    }

    fn line_count(&self, oid: Oid) -> usize {
        if oid.is_zero() {
            return 0;
        }
        self.repo
            .find_blob(oid)
            .map(|blob| blob.content().lines().count())
            .unwrap_or(0)
    }

    /// Fetch a pull request from `url` into a fresh bare repository at `dest`
    ///
    /// The `refs/pull/<n>/head` ref is required. `refs/pull/<n>/merge` is
    /// fetched when the remote still publishes it; its first parent is the
    /// target branch tip and bounds the pull request's commits.
    ///
    /// # Errors
    ///
    /// Returns `GitError::PullRequestNotFound` if the remote does not publish
    /// the pull request, or `GitError::Git2` on transport failures.
    pub fn fetch_pull_request(
        url: &str,
        number: u32,
        dest: impl AsRef<Path>,
    ) -> Result<(Self, PullRequestRange), GitError> {
        let repo = Repository::init_bare(dest.as_ref())?;
        let head_ref = format!("refs/pull/{number}/head");
        let merge_ref = format!("refs/pull/{number}/merge");

        {
            let mut remote = repo.remote_anonymous(url)?;
            remote.connect(Direction::Fetch)?;
            let advertised: Vec<String> = remote
                .list()?
                .iter()
                .map(|head| head.name().to_string())
                .collect();
            remote.disconnect()?;

            if !advertised.contains(&head_ref) {
                return Err(GitError::PullRequestNotFound {
                    url: url.to_string(),
                    number,
                });
            }
            remote.fetch(&[format!("+{head_ref}:{head_ref}")], None, None)?;
            if advertised.contains(&merge_ref) {
                remote.fetch(&[format!("+{merge_ref}:{merge_ref}")], None, None)?;
            } else {
                debug!(url, number, "No merge ref published for pull request");
            }
        }

        let head = repo
            .refname_to_id(&head_ref)
            .map_err(|_| GitError::InvalidReference {
                reference: head_ref.clone(),
            })?;
        let base = repo
            .refname_to_id(&merge_ref)
            .ok()
            .and_then(|merge| repo.find_commit(merge).ok())
            .and_then(|merge| merge.parent_id(0).ok());

        let range = PullRequestRange {
            number,
            head: head.to_string(),
            base: base.map(|b| b.to_string()),
        };
        Ok((Self { repo }, range))
    }

    /// List the commits of a pull request, oldest first
    ///
    /// Without a known base only the head commit is returned.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if either end of the range cannot be resolved.
    pub fn pull_request_commits(&self, range: &PullRequestRange) -> Result<Vec<String>, GitError> {
        let head = self.find_commit(&range.head)?.id();
        let Some(base) = range.base.as_deref() else {
            return Ok(vec![head.to_string()]);
        };
        let base = self.find_commit(base)?.id();

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push(head)?;
        revwalk.hide(base)?;

        revwalk
            .map(|oid| oid.map(|o| o.to_string()).map_err(GitError::from))
            .collect()
    }
}
