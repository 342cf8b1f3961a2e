// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The emergency weight dump.
//!
//! [`EmergencyDump`] owns the open checkpoint writer and the most recently
//! published snapshot, already framed as a complete record. Regular
//! checkpoints go through it too, so the file has a single writer.
//!
//! [`EmergencyDump::dump`] is what the fatal-signal hook calls: it takes
//! both locks with `try_lock`, never allocates, and only writes and syncs
//! bytes that already exist. If the main thread holds either lock the dump
//! is skipped and the last committed record stands.
//!
//! The dump does not extract weights; it re-appends the published bytes.
//! [`WeightLifecycleManager`](crate::WeightLifecycleManager) publishes at
//! each periodic checkpoint, so an emergency record is a copy of the last
//! committed epoch (a run checkpointed at 10 and 20 that crashes ends as
//! `[10, 20, 20]`). Training done since that checkpoint is lost. Call
//! [`EmergencyDump::publish`] more often to narrow the gap, at the cost of
//! one encode per call.

use crate::PlasticityResult;
use hmax_serialization::{EncodedSnapshot, WeightCheckpointWriter};
use hmax_structures::WeightSnapshot;
use parking_lot::Mutex;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of one emergency dump attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpOutcome {
    /// The published snapshot was appended
    Written { epoch: u64 },
    /// Nothing has been published yet
    NoSnapshot,
    /// The writer or the snapshot was locked by the interrupted thread
    Busy,
    /// The write or sync failed
    Failed,
}

#[derive(Debug)]
pub struct EmergencyDump {
    writer: Mutex<WeightCheckpointWriter>,
    published: Mutex<Option<EncodedSnapshot>>,
}

impl EmergencyDump {
    pub fn new(writer: WeightCheckpointWriter) -> Self {
        Self {
            writer: Mutex::new(writer),
            published: Mutex::new(None),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.writer.lock().path().to_path_buf()
    }

    /// Committed records in the checkpoint file
    pub fn records(&self) -> usize {
        self.writer.lock().records()
    }

    /// Epoch of the published snapshot
    pub fn published_epoch(&self) -> Option<u64> {
        self.published.lock().as_ref().map(EncodedSnapshot::epoch)
    }

    /// Make `snapshot` the one an emergency dump writes.
    ///
    /// Encoding happens here, outside the lock.
    pub fn publish(&self, snapshot: &WeightSnapshot) -> PlasticityResult<()> {
        let flags = self.writer.lock().flags();
        let encoded = hmax_serialization::encode_record(snapshot, flags)?;
        let previous = self.published.lock().replace(encoded);
        drop(previous);
        debug!(target: "hmax-plasticity", "Published epoch {} for emergency dump", snapshot.epoch);
        Ok(())
    }

    /// Append `snapshot` as a regular checkpoint
    pub fn checkpoint(&self, snapshot: &WeightSnapshot) -> PlasticityResult<()> {
        let mut writer = self.writer.lock();
        writer.append(snapshot)?;
        info!(
            target: "hmax-plasticity",
            "Checkpoint epoch {} written to {} ({} records)",
            snapshot.epoch,
            writer.path().display(),
            writer.records()
        );
        Ok(())
    }

    /// Append the published snapshot. Safe to call from a signal handler.
    pub fn dump(&self) -> DumpOutcome {
        let Some(published) = self.published.try_lock() else {
            return DumpOutcome::Busy;
        };
        let Some(encoded) = published.as_ref() else {
            return DumpOutcome::NoSnapshot;
        };
        let Some(mut writer) = self.writer.try_lock() else {
            return DumpOutcome::Busy;
        };
        match writer.append_encoded(encoded) {
            Ok(()) => DumpOutcome::Written {
                epoch: encoded.epoch(),
            },
            Err(_) => DumpOutcome::Failed,
        }
    }
}
