// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolution statistics

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Strategy that produced a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// `<name>.<ext>` exists verbatim
    Direct,
    /// Found through the scanned name map
    Discovered,
    /// Found through the alias table
    Alias,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Discovered => "discovered",
            Self::Alias => "alias",
        })
    }
}

/// Counters updated on every handled request
#[derive(Debug, Default)]
pub struct ResolutionStats {
    attempts: AtomicU64,
    failures: AtomicU64,
    direct: AtomicU64,
    discovered: AtomicU64,
    alias: AtomicU64,
    negative_hits: AtomicU64,
    bad_files: AtomicU64,
    mismatches: AtomicU64,
    probes: AtomicU64,
    bypassed: AtomicU64,
}

impl ResolutionStats {
    /// Zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a filtered request
    pub fn inc_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a declined request
    pub fn inc_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a success for `strategy`
    pub fn record_success(&self, strategy: Strategy) {
        let counter = match strategy {
            Strategy::Direct => &self.direct,
            Strategy::Discovered => &self.discovered,
            Strategy::Alias => &self.alias,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a negative-cache hit
    pub fn inc_negative_hit(&self) {
        self.negative_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a file the host failed to load
    pub fn inc_bad_file(&self) {
        self.bad_files.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a validation mismatch
    pub fn inc_mismatch(&self) {
        self.mismatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a filesystem probe
    pub fn inc_probe(&self) {
        self.probes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a forced identity-check pass
    pub fn inc_bypassed(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            direct: self.direct.load(Ordering::Relaxed),
            discovered: self.discovered.load(Ordering::Relaxed),
            alias: self.alias.load(Ordering::Relaxed),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
            bad_files: self.bad_files.load(Ordering::Relaxed),
            mismatches: self.mismatches.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`ResolutionStats`] for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Requests that passed the filter
    pub attempts: u64,
    /// Requests answered with `None`
    pub failures: u64,
    /// Successes via the direct strategy
    pub direct: u64,
    /// Successes via the discovered map
    pub discovered: u64,
    /// Successes via the alias table
    pub alias: u64,
    /// Requests short-circuited by the negative cache
    pub negative_hits: u64,
    /// Resolved files the host could not load
    pub bad_files: u64,
    /// Loads that came back from an unexpected location
    pub mismatches: u64,
    /// File existence checks performed by the strategy chain
    pub probes: u64,
    /// Identity checks forced to pass
    pub bypassed: u64,
}

impl StatsSnapshot {
    /// Total successful redirections
    pub fn resolved(&self) -> u64 {
        self.direct + self.discovered + self.alias
    }

    /// Count for one strategy
    pub fn by_strategy(&self, strategy: Strategy) -> u64 {
        match strategy {
            Strategy::Direct => self.direct,
            Strategy::Discovered => self.discovered,
            Strategy::Alias => self.alias,
        }
    }

    /// JSON form for machine consumers
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attempts: {}, Resolved: {} (direct {}, discovered {}, alias {}), Failed: {}, \
             Negative hits: {}, Bad files: {}, Mismatches: {}, Bypassed checks: {}",
            self.attempts,
            self.resolved(),
            self.direct,
            self.discovered,
            self.alias,
            self.failures,
            self.negative_hits,
            self.bad_files,
            self.mismatches,
            self.bypassed
        )
    }
}
