// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! refminer library
//!
//! Mines refactorings from a git history into two correlated CSV reports:
//! one row per detected refactoring, and one row per code range touched on
//! either side of it. A [`RefactoringOracle`](oracle::RefactoringOracle)
//! does the detection; [`MiningOrchestrator`](miner::MiningOrchestrator)
//! drives it and owns the report lifecycle. [`BatchMiner`](batch::BatchMiner)
//! mines a list of pull requests into one report pair each.

pub mod batch;
pub mod config;
pub mod dispatch;
pub mod file_move;
pub mod miner;
pub mod model;
pub mod oracle;
pub mod progress;
pub mod reporter;
