// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for refminer-git

use thiserror::Error;

/// Errors that can occur while reading repository history
#[derive(Debug, Error)]
pub enum GitError {
    /// Error from git2 library
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// Repository not found at the specified path
    #[error("Repository not found: {path}")]
    RepositoryNotFound {
        /// The path that was searched for a repository
        path: String,
    },

    /// The remote does not publish `refs/pull/<number>/head`
    #[error("Pull request #{number} not found at {url}")]
    PullRequestNotFound {
        /// Remote that was asked
        url: String,
        /// Requested pull request number
        number: u32,
    },

    /// Branch, tag, SHA or pull request ref that could not be resolved
    #[error("Invalid commit reference: {reference}")]
    InvalidReference {
        /// The reference string that could not be resolved
        reference: String,
    },
}
