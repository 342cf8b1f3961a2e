// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Appends that fail halfway must not damage committed records.
//!
//! The file-size limit is per process, so the failing writes happen in a
//! forked child; the parent inspects the file afterwards.

#![cfg(unix)]

use hmax_serialization::{load_weight_checkpoints, WeightCheckpointWriter};
use hmax_structures::{PrototypeWeights, SynapseId, WeightSnapshot};
use tempfile::tempdir;

fn snapshot(epoch: u64) -> WeightSnapshot {
    let weights = (0..9u32)
        .map(|pre| (SynapseId::new(4, "o0", pre, 0), epoch as f32 * 0.01 + pre as f32))
        .collect::<PrototypeWeights>();
    WeightSnapshot::new(epoch, vec![weights; 2])
}

fn set_file_size_limit(limit: libc::rlim_t) -> bool {
    let mut current = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    unsafe {
        if libc::getrlimit(libc::RLIMIT_FSIZE, &mut current) != 0 {
            return false;
        }
        current.rlim_cur = limit.min(current.rlim_max);
        libc::setrlimit(libc::RLIMIT_FSIZE, &current) == 0
    }
}

fn exit_status_of(pid: libc::pid_t) -> Option<i32> {
    let mut status = 0;
    let waited = unsafe { libc::waitpid(pid, &mut status, 0) };
    (waited == pid && libc::WIFEXITED(status)).then(|| libc::WEXITSTATUS(status))
}

#[test]
fn test_failed_append_leaves_committed_records_loadable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");

    let mut writer = WeightCheckpointWriter::open(&path).unwrap();
    writer.append(&snapshot(10)).unwrap();
    let committed = std::fs::metadata(&path).unwrap().len();
    let epoch_20 = writer.encode(&snapshot(20)).unwrap();
    let epoch_30 = writer.encode(&snapshot(30)).unwrap();
    assert!(epoch_20.as_bytes().len() > 20);

    let pid = unsafe { libc::fork() };
    assert!(pid >= 0, "fork failed");
    if pid == 0 {
        // Child: no panics, report through the exit status only
        let code = unsafe {
            libc::signal(libc::SIGXFSZ, libc::SIG_IGN);
            let original = {
                let mut limit = libc::rlimit {
                    rlim_cur: 0,
                    rlim_max: 0,
                };
                libc::getrlimit(libc::RLIMIT_FSIZE, &mut limit);
                limit.rlim_cur
            };
            if !set_file_size_limit(committed + 20) {
                10
            } else if writer.append_encoded(&epoch_20).is_ok() {
                11
            } else if !set_file_size_limit(original) {
                12
            } else if writer.append_encoded(&epoch_30).is_err() {
                13
            } else if writer.records() != 2 {
                14
            } else {
                0
            }
        };
        unsafe { libc::_exit(code) };
    }

    assert_eq!(exit_status_of(pid), Some(0));

    let epochs: Vec<u64> = load_weight_checkpoints(&path)
        .unwrap()
        .iter()
        .map(|s| s.epoch)
        .collect();
    assert_eq!(epochs, vec![10, 30]);
    assert_eq!(WeightCheckpointWriter::open(&path).unwrap().records(), 2);
}
