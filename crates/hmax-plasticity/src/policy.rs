// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use hmax_config::CheckpointConfig;

/// Checkpoint cadence of a training run.
///
/// The final checkpoint is unconditional; this only decides the periodic
/// ones. An interval of 0 disables them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointPolicy {
    pub interval_trials: u64,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self { interval_trials: 10 }
    }
}

impl From<&CheckpointConfig> for CheckpointPolicy {
    fn from(config: &CheckpointConfig) -> Self {
        Self {
            interval_trials: config.interval_trials,
        }
    }
}

impl CheckpointPolicy {
    pub fn new(interval_trials: u64) -> Self {
        Self { interval_trials }
    }

    /// Whether a periodic checkpoint follows trial number `completed` (1-based).
    /// Never true for the last trial, which gets the final checkpoint instead.
    pub fn is_periodic_due(&self, completed: u64, total: u64) -> bool {
        self.interval_trials > 0
            && completed > 0
            && completed < total
            && completed % self.interval_trials == 0
    }
}
