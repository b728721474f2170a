// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for the refminer command line
//!
//! Options come from command-line flags or `REFMINER_*` environment
//! variables. The camel-case spellings (`--gitURL`, `--pullRequest`,
//! `--refminerFilename`) are accepted as aliases.
//!
//! A single pull request can also be named by its web URL
//! (`--pull-request-url`), and a file of such URLs mines a batch of pull
//! requests into `--mined-dir` (`--pull-request-list`).

use std::path::PathBuf;

use clap::Parser;

use crate::batch::PullRequestUrl;
use crate::miner::{CODE_RANGE_FILENAME, DEFAULT_REPORT_FILENAME, MiningMode, MiningOptions};

/// Refminer - mine refactorings from a git history into CSV reports
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "refminer")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Remote repository URL, used with --pull-request
    #[arg(long, alias = "gitURL", env = "REFMINER_GIT_URL", default_value = "")]
    pub git_url: String,

    /// Branch whose history is mined
    #[arg(long, env = "REFMINER_BRANCH", default_value = "master")]
    pub branch: String,

    /// Pull request number to mine instead of the branch history
    ///
    /// Only used together with --git-url. Zero or a negative number mines
    /// the branch history.
    #[arg(
        long,
        alias = "pullRequest",
        env = "REFMINER_PULL_REQUEST",
        default_value = "",
        allow_hyphen_values = true
    )]
    pub pull_request: String,

    /// Pull request web URL, e.g. https://github.com/owner/repo/pull/42
    ///
    /// Takes precedence over --git-url and --pull-request.
    #[arg(long, alias = "pullRequestURL", env = "REFMINER_PULL_REQUEST_URL")]
    pub pull_request_url: Option<String>,

    /// File listing pull request web URLs, one per line, to mine as a batch
    ///
    /// Each pull request gets its own reports in --mined-dir; pull requests
    /// whose report already exists are skipped.
    #[arg(long, alias = "pullRequestList", env = "REFMINER_PULL_REQUEST_LIST")]
    pub pull_request_list: Option<PathBuf>,

    /// Output directory of batch mining
    #[arg(long, alias = "minedDir", env = "REFMINER_MINED_DIR", default_value = "mined")]
    pub mined_dir: PathBuf,

    /// Main report file
    ///
    /// The code-range report is written next to it as refminer-coderange.csv.
    #[arg(
        long,
        alias = "refminerFilename",
        env = "REFMINER_FILENAME",
        default_value = DEFAULT_REPORT_FILENAME
    )]
    pub refminer_filename: PathBuf,

    /// Local repository for branch history mining
    #[arg(long, env = "REFMINER_REPO", default_value = ".")]
    pub repo: PathBuf,

    /// Worker threads for commit analysis
    #[arg(short, long, default_value = "1")]
    pub jobs: usize,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Do not draw a progress bar
    #[arg(long, default_value = "false")]
    pub no_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git_url: String::new(),
            branch: "master".to_string(),
            pull_request: String::new(),
            pull_request_url: None,
            pull_request_list: None,
            mined_dir: PathBuf::from("mined"),
            refminer_filename: PathBuf::from(DEFAULT_REPORT_FILENAME),
            repo: PathBuf::from("."),
            jobs: 1,
            verbose: false,
            quiet: false,
            no_progress: false,
        }
    }
}

impl Config {
    /// Path of the code-range report, in the main report's directory
    #[must_use]
    pub fn code_range_path(&self) -> PathBuf {
        self.refminer_filename
            .parent()
            .map_or_else(|| PathBuf::from(CODE_RANGE_FILENAME), |dir| dir.join(CODE_RANGE_FILENAME))
    }

    /// The pull request named by `--pull-request-url`, if it parses
    #[must_use]
    pub fn pull_request_target(&self) -> Option<PullRequestUrl> {
        self.pull_request_url
            .as_deref()
            .and_then(|url| PullRequestUrl::parse(url).ok())
    }

    /// Options for the mining orchestrator
    #[must_use]
    pub fn mining_options(&self) -> MiningOptions {
        let (git_url, pull_request) = match self.pull_request_target() {
            Some(pr) => (pr.git_url, pr.number.to_string()),
            None => (self.git_url.clone(), self.pull_request.clone()),
        };
        MiningOptions {
            repo_path: self.repo.clone(),
            git_url,
            branch: self.branch.clone(),
            pull_request,
            main_report: self.refminer_filename.clone(),
            code_range_report: self.code_range_path(),
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `jobs` is zero
    /// - the pull request URL is not a pull request URL
    /// - the pull request list doesn't exist
    /// - branch history is mined and the repository path doesn't exist
    /// - the report directory cannot be created
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == 0 {
            return Err(ConfigError::InvalidJobs(self.jobs));
        }

        if let Some(url) = &self.pull_request_url
            && self.pull_request_target().is_none()
        {
            return Err(ConfigError::InvalidPullRequestUrl(url.clone()));
        }

        if let Some(list) = &self.pull_request_list {
            if !list.is_file() {
                return Err(ConfigError::PullRequestListNotFound(list.clone()));
            }
            return Ok(());
        }

        let options = self.mining_options();
        let full_history = matches!(options.mode(), Ok(MiningMode::FullHistory { .. }));
        if full_history && !self.repo.exists() {
            return Err(ConfigError::RepositoryNotFound(self.repo.clone()));
        }

        if let Some(parent) = self.refminer_filename.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::OutputDirectoryCreateFailed(parent.to_path_buf(), e))?;
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Repository path not found
    #[error("Repository path not found: {0}")]
    RepositoryNotFound(PathBuf),

    /// `--pull-request-url` is not a pull request URL
    #[error("Not a pull request URL: {0}")]
    InvalidPullRequestUrl(String),

    /// Pull request list file not found
    #[error("Pull request list not found: {0}")]
    PullRequestListNotFound(PathBuf),

    /// Worker count out of range
    #[error("Invalid number of jobs: {0} (must be at least 1)")]
    InvalidJobs(usize),

    /// Failed to create the report directory
    #[error("Failed to create output directory {0}: {1}")]
    OutputDirectoryCreateFailed(PathBuf, std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.git_url.is_empty());
        assert!(config.pull_request.is_empty());
        assert_eq!(config.branch, "master");
        assert_eq!(config.refminer_filename, PathBuf::from("refminer_commits.csv"));
        assert_eq!(config.jobs, 1);
        assert!(!config.verbose);
        assert!(!config.quiet);
        assert!(!config.no_progress);
    }

    #[test]
    fn test_parse_camel_case_aliases() {
        let config = Config::try_parse_from([
            "refminer",
            "--gitURL",
            "https://x/y.git",
            "--pullRequest",
            "42",
            "--refminerFilename",
            "out/refs.csv",
        ])
        .expect("parse");
        assert_eq!(config.git_url, "https://x/y.git");
        assert_eq!(config.pull_request, "42");
        assert_eq!(config.refminer_filename, PathBuf::from("out/refs.csv"));
    }

    #[test]
    fn test_parse_negative_pull_request() {
        let config = Config::try_parse_from(["refminer", "--pull-request", "-1"]).expect("parse");
        assert_eq!(config.pull_request, "-1");
    }

    #[test]
    fn test_code_range_path_next_to_report() {
        let config = Config {
            refminer_filename: PathBuf::from("/tmp/reports/main.csv"),
            ..Default::default()
        };
        assert_eq!(
            config.code_range_path(),
            PathBuf::from("/tmp/reports/refminer-coderange.csv")
        );
    }

    #[test]
    fn test_code_range_path_default() {
        let config = Config::default();
        assert_eq!(config.code_range_path(), PathBuf::from("refminer-coderange.csv"));
    }

    #[test]
    fn test_mining_options() {
        let config = Config {
            branch: "develop".to_string(),
            repo: PathBuf::from("/work/repo"),
            ..Default::default()
        };
        let options = config.mining_options();
        assert_eq!(options.branch, "develop");
        assert_eq!(options.repo_path, PathBuf::from("/work/repo"));
        assert_eq!(options.code_range_report, config.code_range_path());
    }

    #[test]
    fn test_log_level_default() {
        let config = Config::default();
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_log_level_verbose() {
        let config = Config {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_log_level_quiet() {
        let config = Config {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(config.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_validate_zero_jobs() {
        let config = Config {
            jobs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJobs(0))));
    }

    #[test]
    fn test_validate_nonexistent_repository() {
        let config = Config {
            repo: PathBuf::from("/nonexistent/path/12345"),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::RepositoryNotFound(_))));
    }

    #[test]
    fn test_validate_pull_request_ignores_repository() {
        let config = Config {
            repo: PathBuf::from("/nonexistent/path/12345"),
            git_url: "https://x/y.git".to_string(),
            pull_request: "3".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_creates_output_directory() {
        let dir = std::env::temp_dir().join(format!("refminer-config-{}", std::process::id()));
        let config = Config {
            repo: std::env::temp_dir(),
            refminer_filename: dir.join("nested").join("report.csv"),
            ..Default::default()
        };
        config.validate().expect("validate");
        assert!(dir.join("nested").is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_pull_request_url_overrides_url_and_number() {
        let config = Config {
            git_url: "https://x/y.git".to_string(),
            pull_request: "3".to_string(),
            pull_request_url: Some("https://github.com/demo/parser/pull/42/files".to_string()),
            ..Default::default()
        };
        let options = config.mining_options();
        assert_eq!(options.git_url, "https://github.com/demo/parser.git");
        assert_eq!(options.pull_request, "42");
    }

    #[test]
    fn test_validate_invalid_pull_request_url() {
        let config = Config {
            pull_request_url: Some("https://github.com/demo/parser/issues/42".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPullRequestUrl(_))
        ));
    }

    #[test]
    fn test_validate_pull_request_url_ignores_repository() {
        let config = Config {
            repo: PathBuf::from("/nonexistent/path/12345"),
            pull_request_url: Some("https://github.com/demo/parser/pull/42".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_pull_request_list() {
        let config = Config {
            pull_request_list: Some(PathBuf::from("/nonexistent/prs.txt")),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PullRequestListNotFound(_))
        ));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
