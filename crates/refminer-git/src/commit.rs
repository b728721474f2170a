// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit metadata as seen by the miner

use chrono::{DateTime, Utc};

/// Metadata of a single commit in the mined history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// The commit SHA (40 hex characters)
    pub sha: String,
    /// First line of the commit message
    pub summary: String,
    /// Author name
    pub author: String,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// Parent commit SHAs, first parent first
    pub parents: Vec<String>,
}

impl Commit {
    /// Build commit metadata from a `git2` commit object
    #[must_use]
    pub fn from_git2(git_commit: &git2::Commit<'_>) -> Self {
        let timestamp =
            DateTime::from_timestamp(git_commit.time().seconds(), 0).unwrap_or_else(Utc::now);

        Self {
            sha: git_commit.id().to_string(),
            summary: git_commit.summary().unwrap_or("").to_string(),
            author: git_commit.author().name().unwrap_or("Unknown").to_string(),
            timestamp,
            parents: git_commit.parent_ids().map(|id| id.to_string()).collect(),
        }
    }

    /// Validate that a SHA is a valid 40-character hex string
    #[must_use]
    pub fn is_valid_sha(sha: &str) -> bool {
        sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Get the short SHA (first 7 characters)
    #[must_use]
    pub fn short_sha(&self) -> &str {
        &self.sha[..7.min(self.sha.len())]
    }

    /// Check if this is a merge commit (has multiple parents)
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Check if this is a root commit (has no parents)
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    fn sample_commit() -> Commit {
        Commit {
            sha: "1945ab9c752534e733c38ba0109dc3b741f0a6eb".to_string(),
            summary: "Extract parser helpers".to_string(),
            author: "Test Author".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 17, 2, 33, 6).unwrap(),
            parents: vec!["c460aeb7fb2d109c17e43de0ce681faec0b7374d".to_string()],
        }
    }

    #[test]
    fn test_is_valid_sha() {
        assert!(Commit::is_valid_sha(
            "1945ab9c752534e733c38ba0109dc3b741f0a6eb"
        ));
        assert!(Commit::is_valid_sha(
            "ABCDEF1234567890abcdef1234567890abcdef12"
        ));
        assert!(!Commit::is_valid_sha("1945ab9"));
        assert!(!Commit::is_valid_sha(
            "1945ab9c752534e733c38ba0109dc3b741f0a6eg"
        ));
        assert!(!Commit::is_valid_sha(""));
    }

    #[test]
    fn test_short_sha() {
        let mut commit = sample_commit();
        assert_eq!(commit.short_sha(), "1945ab9");
        commit.sha = "abc".to_string();
        assert_eq!(commit.short_sha(), "abc");
    }

    #[test]
    fn test_merge_and_root_detection() {
        let mut commit = sample_commit();
        assert!(!commit.is_merge());
        assert!(!commit.is_root());

        commit.parents.push("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string());
        assert!(commit.is_merge());

        commit.parents.clear();
        assert!(commit.is_root());
        assert!(!commit.is_merge());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn sha_strategy() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[0-9a-f]{40}").expect("valid regex")
    }

    proptest! {
        /// Property: is_merge and is_root are mutually exclusive and follow parent count
        #[test]
        fn prop_parent_classification(parents in proptest::collection::vec(sha_strategy(), 0..4)) {
            let commit = Commit {
                sha: "a".repeat(40),
                summary: String::new(),
                author: "A".to_string(),
                timestamp: Utc::now(),
                parents,
            };
            prop_assert_eq!(commit.is_merge(), commit.parents.len() > 1);
            prop_assert_eq!(commit.is_root(), commit.parents.is_empty());
            prop_assert!(!(commit.is_merge() && commit.is_root()));
        }

        /// Property: is_valid_sha rejects strings of wrong length
        #[test]
        fn prop_invalid_sha_wrong_length(
            prefix in "[0-9a-f]{0,39}",
            suffix in "[0-9a-f]{0,10}"
        ) {
            let combined = format!("{}{}", prefix, suffix);
            if combined.len() != 40 {
                prop_assert!(!Commit::is_valid_sha(&combined));
            }
        }
    }
}
