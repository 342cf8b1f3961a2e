// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Deliver real fatal signals to a forked child holding the hook.
//!
//! The child checkpoints nothing itself: the parent commits epochs 10 and
//! 20 and publishes 20 before forking, so the child only installs the hook
//! and raises the signal.

#![cfg(unix)]

use hmax_plasticity::{install_fatal_signal_hook, EmergencyDump};
use hmax_serialization::{load_weight_checkpoints, WeightCheckpointWriter};
use hmax_structures::{PrototypeWeights, SynapseId, WeightSnapshot};
use std::sync::Arc;
use tempfile::tempdir;

fn snapshot(epoch: u64) -> WeightSnapshot {
    let weights = (0..9u32)
        .map(|pre| (SynapseId::new(5, "0", pre, 0), epoch as f32 * 0.001 + pre as f32 * 0.01))
        .collect::<PrototypeWeights>();
    WeightSnapshot::new(epoch, vec![weights; 2])
}

/// Exit status of a child killed by `signal` with the hook installed
fn run_child_with_signal(dump: &Arc<EmergencyDump>, signal: libc::c_int) -> Option<i32> {
    let pid = unsafe { libc::fork() };
    assert!(pid >= 0, "fork failed");
    if pid == 0 {
        let code = match install_fatal_signal_hook(Arc::clone(dump)) {
            Ok(guard) => {
                unsafe { libc::raise(signal) };
                drop(guard);
                // Only reached if the hook returned
                11
            }
            Err(_) => 10,
        };
        unsafe { libc::_exit(code) };
    }

    let mut status = 0;
    let waited = unsafe { libc::waitpid(pid, &mut status, 0) };
    assert_eq!(waited, pid);
    libc::WIFEXITED(status).then(|| libc::WEXITSTATUS(status))
}

#[test]
fn test_fatal_signals_append_published_snapshot_and_exit_2() {
    for signal in [libc::SIGSEGV, libc::SIGABRT, libc::SIGFPE] {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.hmaxw");

        let dump = Arc::new(EmergencyDump::new(WeightCheckpointWriter::open(&path).unwrap()));
        dump.checkpoint(&snapshot(10)).unwrap();
        dump.checkpoint(&snapshot(20)).unwrap();
        dump.publish(&snapshot(20)).unwrap();

        assert_eq!(run_child_with_signal(&dump, signal), Some(2), "signal {}", signal);

        let history = load_weight_checkpoints(&path).unwrap();
        let epochs: Vec<u64> = history.iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![10, 20, 20], "signal {}", signal);
        assert_eq!(history[2], snapshot(20));
    }
}

#[test]
fn test_fatal_signal_without_published_snapshot_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");

    let dump = Arc::new(EmergencyDump::new(WeightCheckpointWriter::open(&path).unwrap()));
    dump.checkpoint(&snapshot(10)).unwrap();

    assert_eq!(run_child_with_signal(&dump, libc::SIGSEGV), Some(2));
    let epochs: Vec<u64> = load_weight_checkpoints(&path)
        .unwrap()
        .iter()
        .map(|s| s.epoch)
        .collect();
    assert_eq!(epochs, vec![10]);
}
