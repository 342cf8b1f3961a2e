// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use hmax_serialization::{
    encode_record, load_c1_dump, load_weight_checkpoints, save_c1_dump, SerializationError,
    WeightCheckpointWriter,
};
use hmax_structures::{
    C1LayerRecord, C1SpikeDump, LayerShape, PrototypeWeights, SynapseId, WeightSnapshot,
};
use std::fs::OpenOptions;
use std::io::Write;
use tempfile::tempdir;

fn snapshot(epoch: u64, prototypes: usize) -> WeightSnapshot {
    let weights = (0..prototypes)
        .map(|p| {
            (0..9u32)
                .map(|pre| {
                    (
                        SynapseId::new(4, "o90", pre, 0),
                        epoch as f32 * 0.01 + p as f32 + pre as f32 * 0.1,
                    )
                })
                .collect::<PrototypeWeights>()
        })
        .collect();
    WeightSnapshot::new(epoch, weights)
}

#[test]
fn test_appended_snapshots_load_oldest_first() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");

    let mut writer = WeightCheckpointWriter::open(&path).unwrap();
    for epoch in [10, 20, 30] {
        writer.append(&snapshot(epoch, 3)).unwrap();
    }
    assert_eq!(writer.records(), 3);

    let loaded = load_weight_checkpoints(&path).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0], snapshot(10, 3));
    assert_eq!(loaded[2], snapshot(30, 3));
}

#[test]
fn test_reopen_appends_after_existing_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");

    WeightCheckpointWriter::open(&path)
        .unwrap()
        .append(&snapshot(10, 2))
        .unwrap();

    let mut writer = WeightCheckpointWriter::open(&path).unwrap();
    assert_eq!(writer.records(), 1);
    writer.append(&snapshot(20, 2)).unwrap();

    let epochs: Vec<u64> = load_weight_checkpoints(&path)
        .unwrap()
        .iter()
        .map(|s| s.epoch)
        .collect();
    assert_eq!(epochs, vec![10, 20]);
}

#[test]
fn test_header_only_file_has_no_snapshots() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");
    WeightCheckpointWriter::open(&path).unwrap();

    assert!(load_weight_checkpoints(&path).unwrap().is_empty());
}

#[test]
fn test_torn_tail_dropped_on_load_and_repaired_on_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");

    let mut writer = WeightCheckpointWriter::open(&path).unwrap();
    writer.append(&snapshot(10, 2)).unwrap();
    let partial = writer.encode(&snapshot(20, 2)).unwrap();
    drop(writer);

    // Simulate a write interrupted halfway through
    let half = partial.as_bytes().len() / 2;
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&partial.as_bytes()[..half]).unwrap();
    drop(file);

    let loaded = load_weight_checkpoints(&path).unwrap();
    assert_eq!(loaded.len(), 1);

    let mut writer = WeightCheckpointWriter::open(&path).unwrap();
    assert_eq!(writer.records(), 1);
    writer.append(&snapshot(30, 2)).unwrap();

    let epochs: Vec<u64> = load_weight_checkpoints(&path)
        .unwrap()
        .iter()
        .map(|s| s.epoch)
        .collect();
    assert_eq!(epochs, vec![10, 30]);
}

#[test]
fn test_corruption_before_last_record_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");

    let mut writer = WeightCheckpointWriter::open(&path).unwrap();
    writer.append(&snapshot(10, 1)).unwrap();
    writer.append(&snapshot(20, 1)).unwrap();
    drop(writer);

    let mut bytes = std::fs::read(&path).unwrap();
    // First payload byte: header (10) + record prefix (16)
    bytes[26] ^= 0xff;
    std::fs::write(&path, &bytes).unwrap();

    let result = load_weight_checkpoints(&path);
    assert!(matches!(
        result,
        Err(SerializationError::ChecksumMismatch { record: 0 })
    ));
}

#[test]
fn test_pre_encoded_record_appends_like_a_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");

    let mut writer = WeightCheckpointWriter::open(&path).unwrap();
    let encoded = encode_record(&snapshot(7, 2), writer.flags()).unwrap();
    assert_eq!(encoded.epoch(), 7);
    writer.append_encoded(&encoded).unwrap();

    let mismatched = encode_record(&snapshot(8, 2), writer.flags() ^ 1).unwrap();
    assert!(matches!(
        writer.append_encoded(&mismatched),
        Err(SerializationError::FlagMismatch { .. })
    ));

    let loaded = load_weight_checkpoints(&path).unwrap();
    assert_eq!(loaded, vec![snapshot(7, 2)]);
}

#[test]
fn test_uncompressed_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");

    let mut writer = WeightCheckpointWriter::open_with_flags(&path, 0).unwrap();
    writer.append(&snapshot(1, 1)).unwrap();
    drop(writer);

    // Flags of an existing file win over the requested ones
    let writer = WeightCheckpointWriter::open(&path).unwrap();
    assert_eq!(writer.flags(), 0);
    assert_eq!(load_weight_checkpoints(&path).unwrap(), vec![snapshot(1, 1)]);
}

fn c1_dump() -> C1SpikeDump {
    let mut dump = C1SpikeDump::new();
    for label in ["0", "45", "90", "135"] {
        let trains = (0..12).map(|u| vec![u as f64, 50.0 + u as f64]).collect();
        dump.insert_layer(7, C1LayerRecord::new(LayerShape::new(3, 4), label, trains));
    }
    dump
}

#[test]
fn test_c1_dump_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("train.hmaxc");

    save_c1_dump(&c1_dump(), &path).unwrap();
    assert_eq!(load_c1_dump(&path).unwrap(), c1_dump());
}

#[test]
fn test_files_are_not_interchangeable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("train.hmaxc");
    save_c1_dump(&c1_dump(), &path).unwrap();

    assert!(matches!(
        load_weight_checkpoints(&path),
        Err(SerializationError::InvalidMagic { expected: "HMAXW", .. })
    ));
}

#[test]
fn test_invalid_c1_dump_is_not_saved() {
    let dir = tempdir().unwrap();
    let mut dump = c1_dump();
    dump.insert_layer(
        7,
        C1LayerRecord::new(LayerShape::new(3, 4), "bad", vec![vec![]; 5]),
    );

    let result = save_c1_dump(&dump, dir.path().join("bad.hmaxc"));
    assert!(matches!(result, Err(SerializationError::Structure(_))));
}
