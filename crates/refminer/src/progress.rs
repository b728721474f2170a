// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit progress accounting

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

/// Counts mined commits against an optionally known total
///
/// The total starts at 1 until the real commit count is known. `step` is an
/// atomic increment, so detection callbacks may call it from any thread.
pub struct ProgressTracker {
    done: AtomicU64,
    total: AtomicU64,
    bar: Option<ProgressBar>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// Create a headless tracker
    #[must_use]
    pub fn new() -> Self {
        Self {
            done: AtomicU64::new(0),
            total: AtomicU64::new(1),
            bar: None,
        }
    }

    /// Create a tracker that also draws a progress bar on stderr
    #[must_use]
    pub fn with_bar(label: &str) -> Self {
        let bar = ProgressBar::new(1);
        if let Ok(style) =
            ProgressStyle::with_template("{msg} {wide_bar} {pos}/{len} ({elapsed}, eta {eta})")
        {
            bar.set_style(style);
        }
        bar.set_message(label.to_string());

        Self {
            bar: Some(bar),
            ..Self::new()
        }
    }

    /// Set the denominator once the number of commits is known
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
        if let Some(bar) = &self.bar {
            bar.set_length(total);
        }
    }

    /// Count one finished commit, whatever its outcome
    pub fn step(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Commits counted so far
    #[must_use]
    pub fn position(&self) -> u64 {
        self.done.load(Ordering::SeqCst)
    }

    /// Current denominator
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Stop drawing; counters stay readable
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish();
        }
    }
}
