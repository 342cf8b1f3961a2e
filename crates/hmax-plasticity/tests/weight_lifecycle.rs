// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use hmax_brain_development::{build_c1_layers, build_s2, C1Layers, S2BuildSpec, S2Layers, WeightInit};
use hmax_plasticity::{
    apply, extract, CheckpointPolicy, DumpOutcome, EmergencyDump, PlasticityError,
    WeightLifecycleManager,
};
use hmax_serialization::{load_weight_checkpoints, WeightCheckpointWriter};
use hmax_simulator::{CoordinationRole, ReferenceSimulator, Simulator, StdpParams, UnitModel};
use hmax_structures::{C1LayerRecord, C1SpikeDump, LayerShape, SynapseId};
use std::sync::Arc;
use tempfile::tempdir;

fn c1_dump(rows: usize, cols: usize) -> C1SpikeDump {
    let mut dump = C1SpikeDump::new();
    for label in ["0", "90"] {
        let trains = (0..rows * cols)
            .map(|u| (0..25).filter(|i| (u + i) % 4 == 0).map(|i| i as f64 * 50.0 + 1.0).collect())
            .collect();
        dump.insert_layer(5, C1LayerRecord::new(LayerShape::new(rows, cols), label, trains));
    }
    dump
}

fn build(prototypes: usize, seed: u64) -> (ReferenceSimulator, C1Layers, S2Layers) {
    let mut sim = ReferenceSimulator::new();
    let c1 = build_c1_layers(&mut sim, &c1_dump(5, 5)).unwrap();
    let spec = S2BuildSpec {
        feature_size: 3,
        prototype_count: prototypes,
        unit_model: UnitModel::IntegrateAndFire {
            threshold: 1.0,
            refractory_ms: 0.1,
        },
        plasticity: Some(StdpParams::default()),
        initial_weights: None,
        weight_init: WeightInit::Uniform {
            low: 0.0,
            high: 0.3,
            seed: Some(seed),
        },
    };
    let s2 = build_s2(&mut sim, &c1, &spec).unwrap();
    (sim, c1, s2)
}

#[test]
fn test_extract_yields_one_entry_per_prototype() {
    let (sim, _, s2) = build(3, 1);
    let weights = extract(&sim, &s2, 3).unwrap();
    assert_eq!(weights.len(), 3);
    // 2 C1 layers x 9 S2 units x 9 inputs
    assert!(weights.iter().all(|w| w.len() == 2 * 9 * 9));

    assert!(matches!(
        extract(&sim, &s2, 4),
        Err(PlasticityError::PrototypeOutOfRange { prototype: 3, count: 3 })
    ));
}

#[test]
fn test_extract_apply_roundtrip_across_rebuilds() {
    let (source, _, source_s2) = build(2, 11);
    let learned = extract(&source, &source_s2, 2).unwrap();

    let (mut target, _, target_s2) = build(2, 12);
    assert_ne!(extract(&target, &target_s2, 2).unwrap(), learned);

    for (prototype, weights) in learned.iter().enumerate() {
        apply(&mut target, &target_s2, prototype, weights).unwrap();
    }
    assert_eq!(extract(&target, &target_s2, 2).unwrap(), learned);
}

#[test]
fn test_apply_rejects_skew_without_writing() {
    let (mut sim, _, s2) = build(1, 5);
    let before = extract(&sim, &s2, 1).unwrap();

    let mut unknown: hmax_structures::PrototypeWeights =
        before[0].iter().map(|(id, _)| (id.clone(), 0.9)).collect();
    unknown.insert(SynapseId::new(5, "45", 0, 0), 0.9);
    assert!(matches!(
        apply(&mut sim, &s2, 0, &unknown),
        Err(PlasticityError::UnknownSynapse { prototype: 0, .. })
    ));

    let partial: hmax_structures::PrototypeWeights =
        before[0].iter().skip(1).map(|(id, _)| (id.clone(), 0.9)).collect();
    assert!(matches!(
        apply(&mut sim, &s2, 0, &partial),
        Err(PlasticityError::MissingWeights { prototype: 0, .. })
    ));

    assert_eq!(extract(&sim, &s2, 1).unwrap(), before);
}

#[test]
fn test_training_run_checkpoints() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");
    let (mut sim, _, s2) = build(2, 3);

    let dump = Arc::new(EmergencyDump::new(WeightCheckpointWriter::open(&path).unwrap()));
    let mut manager = WeightLifecycleManager::new(
        CoordinationRole::single_process(),
        CheckpointPolicy::new(10),
        2,
        Some(Arc::clone(&dump)),
    );

    let total = 25;
    let mut taken = Vec::new();
    for trial in 1..=total {
        sim.run(50.0).unwrap();
        if let Some(snapshot) = manager.after_trial(&sim, &s2, trial, total).unwrap() {
            taken.push(snapshot.epoch);
        }
    }
    let last = manager.finish(&sim, &s2, total).unwrap();

    assert_eq!(taken, vec![10, 20]);
    assert_eq!(last.epoch, 25);
    let epochs: Vec<u64> = load_weight_checkpoints(&path)
        .unwrap()
        .iter()
        .map(|s| s.epoch)
        .collect();
    assert_eq!(epochs, vec![10, 20, 25]);
}

#[test]
fn test_emergency_dump_mid_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");
    let (mut sim, _, s2) = build(2, 3);

    let dump = Arc::new(EmergencyDump::new(WeightCheckpointWriter::open(&path).unwrap()));
    let mut manager = WeightLifecycleManager::new(
        CoordinationRole::single_process(),
        CheckpointPolicy::new(10),
        2,
        Some(Arc::clone(&dump)),
    );

    assert_eq!(dump.dump(), DumpOutcome::NoSnapshot);

    for trial in 1..=25 {
        sim.run(50.0).unwrap();
        manager.after_trial(&sim, &s2, trial, 40).unwrap();
    }
    // Fatal signal at trial 25: the hook writes what was last published
    assert_eq!(dump.dump(), DumpOutcome::Written { epoch: 20 });

    let history = load_weight_checkpoints(&path).unwrap();
    let epochs: Vec<u64> = history.iter().map(|s| s.epoch).collect();
    assert_eq!(epochs, vec![10, 20, 20]);
    assert_eq!(history[2], history[1]);
}

#[test]
fn test_worker_role_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.hmaxw");
    let (mut sim, _, s2) = build(1, 3);

    let dump = Arc::new(EmergencyDump::new(WeightCheckpointWriter::open(&path).unwrap()));
    let mut manager = WeightLifecycleManager::new(
        CoordinationRole::Worker {
            rank: 1,
            world_size: 2,
        },
        CheckpointPolicy::new(1),
        1,
        Some(dump),
    );

    sim.run(50.0).unwrap();
    assert!(manager.after_trial(&sim, &s2, 1, 3).unwrap().is_none());
    manager.finish(&sim, &s2, 3).unwrap();
    assert!(load_weight_checkpoints(&path).unwrap().is_empty());
}
