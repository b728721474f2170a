// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! refminer: mine refactorings from git history into CSV reports
//!
//! Configuration problems and failed runs are logged; the process exits
//! with status 0 either way.

use clap::Parser;
use tracing::{error, info};

use refminer::batch::{BatchMiner, read_pull_request_list};
use refminer::config::Config;
use refminer::file_move::FileMoveOracle;
use refminer::miner::MiningOrchestrator;
use refminer::progress::ProgressTracker;

fn main() {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return;
    }

    if let Some(list) = &config.pull_request_list {
        mine_batch(&config, list);
        return;
    }

    info!(
        git_url = %config.git_url,
        branch = %config.branch,
        pull_request = %config.pull_request,
        pull_request_url = ?config.pull_request_url,
        report = %config.refminer_filename.display(),
        "Starting refminer"
    );

    let progress = if config.no_progress {
        ProgressTracker::new()
    } else {
        ProgressTracker::with_bar("commits")
    };
    let oracle = FileMoveOracle::new().with_jobs(config.jobs);
    let miner = MiningOrchestrator::new(oracle, config.mining_options(), progress);

    let outcome = miner.run();
    info!(
        state = ?outcome.state,
        mode = ?outcome.mode,
        "Done"
    );
}

fn mine_batch(config: &Config, list: &std::path::Path) {
    let pull_requests = match read_pull_request_list(list) {
        Ok(pull_requests) => pull_requests,
        Err(e) => {
            error!(error = %e, "Could not read pull request list");
            return;
        }
    };
    info!(
        list = %list.display(),
        pull_requests = pull_requests.len(),
        mined_dir = %config.mined_dir.display(),
        "Starting refminer batch"
    );

    let progress = if config.no_progress {
        ProgressTracker::new()
    } else {
        ProgressTracker::with_bar("pull requests")
    };
    let oracle = FileMoveOracle::new().with_jobs(config.jobs);
    let batch = BatchMiner::new(oracle, &config.mined_dir).with_progress(progress);

    match batch.run(&pull_requests) {
        Ok(summary) => info!(
            mined = summary.mined,
            skipped = summary.skipped,
            aborted = summary.aborted,
            "Done"
        ),
        Err(e) => error!(error = %e, "Batch mining failed"),
    }
}
