// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Checkpoint cadence of a training run

use crate::{extract, CheckpointPolicy, EmergencyDump, PlasticityResult};
use hmax_brain_development::S2Layers;
use hmax_simulator::{CoordinationRole, Simulator};
use hmax_structures::WeightSnapshot;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Takes the periodic and final weight snapshots of a training run.
///
/// Only the root role writes. Every checkpoint is also published to the
/// emergency dump, so a fatal signal re-appends the latest known epoch.
/// Epochs count completed trials.
#[derive(Debug)]
pub struct WeightLifecycleManager {
    role: CoordinationRole,
    policy: CheckpointPolicy,
    prototype_count: usize,
    dump: Option<Arc<EmergencyDump>>,
    last_epoch: Option<u64>,
}

impl WeightLifecycleManager {
    pub fn new(
        role: CoordinationRole,
        policy: CheckpointPolicy,
        prototype_count: usize,
        dump: Option<Arc<EmergencyDump>>,
    ) -> Self {
        let dump = if role.is_root() {
            dump
        } else {
            debug!(target: "hmax-plasticity", "{}: checkpoints are written by the root", role);
            None
        };
        Self {
            role,
            policy,
            prototype_count,
            dump,
            last_epoch: None,
        }
    }

    pub fn policy(&self) -> CheckpointPolicy {
        self.policy
    }

    /// Epoch of the last checkpoint taken
    pub fn last_epoch(&self) -> Option<u64> {
        self.last_epoch
    }

    /// Extract all prototypes into a snapshot tagged `epoch`
    pub fn snapshot<S: Simulator + ?Sized>(
        &self,
        sim: &S,
        s2: &S2Layers,
        epoch: u64,
    ) -> PlasticityResult<WeightSnapshot> {
        Ok(WeightSnapshot::new(epoch, extract(sim, s2, self.prototype_count)?))
    }

    /// Take the periodic checkpoint if one is due after `completed` of `total` trials.
    ///
    /// Returns the snapshot taken, if any. Write failures are logged and do
    /// not stop training.
    pub fn after_trial<S: Simulator + ?Sized>(
        &mut self,
        sim: &S,
        s2: &S2Layers,
        completed: u64,
        total: u64,
    ) -> PlasticityResult<Option<WeightSnapshot>> {
        if !self.role.is_root() || !self.policy.is_periodic_due(completed, total) {
            return Ok(None);
        }

        let snapshot = self.snapshot(sim, s2, completed)?;
        if let Some(dump) = &self.dump {
            if let Err(e) = dump.publish(&snapshot) {
                warn!(target: "hmax-plasticity", "Could not publish epoch {} for emergency dump: {}", completed, e);
            }
            if let Err(e) = dump.checkpoint(&snapshot) {
                warn!(target: "hmax-plasticity", "Periodic checkpoint at epoch {} failed: {}", completed, e);
            }
        }
        self.last_epoch = Some(completed);
        Ok(Some(snapshot))
    }

    /// Take the final checkpoint after `total` trials. Failures are returned.
    pub fn finish<S: Simulator + ?Sized>(
        &mut self,
        sim: &S,
        s2: &S2Layers,
        total: u64,
    ) -> PlasticityResult<WeightSnapshot> {
        let snapshot = self.snapshot(sim, s2, total)?;
        if self.role.is_root() {
            if let Some(dump) = &self.dump {
                dump.publish(&snapshot)?;
                dump.checkpoint(&snapshot)?;
            }
        }
        self.last_epoch = Some(total);
        info!(
            target: "hmax-plasticity",
            "Final weights of {} prototypes at epoch {}",
            snapshot.prototype_count(),
            total
        );
        Ok(snapshot)
    }
}
