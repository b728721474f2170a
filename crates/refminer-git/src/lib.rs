// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! refminer-git: repository access for the refminer history miner
//!
//! This library crate opens repositories, enumerates branch history, reads
//! per-commit file changes and fetches pull requests for the mining pipeline.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use refminer_git::GitRepo;
//!
//! let repo = GitRepo::open(".").expect("open repo");
//! println!("{} commits on master", repo.commit_count("master").expect("count"));
//!
//! for id in repo.log("master").expect("walk branch") {
//!     let id = id.expect("commit id");
//!     for change in repo.file_changes(&id).expect("diff commit") {
//!         println!("{id} {:?} {:?}", change.status, change.new_path);
//!     }
//! }
//! ```

pub mod commit;
pub mod error;
pub mod repo;

pub use commit::Commit;
pub use error::GitError;
pub use repo::{ChangeStatus, FileChange, GitRepo, PullRequestRange};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::Commit;
    pub use crate::error::GitError;
    pub use crate::repo::{ChangeStatus, FileChange, GitRepo};
}
