// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Train on a toy C1 dump, then classify every checkpoint it produced

use hmax::config::HmaxConfig;
use hmax::dataset::{c1_raster_path, reconstruction_path, s2_raster_path};
use hmax::prelude::*;
use hmax::structures::{C1LayerRecord, LayerShape};
use hmax::visualization::{FeatureImageDictionary, GrayImage};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const IMAGES: usize = 5;

/// Two orientations at scale 5; even images drive even units, odd images odd units
fn toy_dump() -> C1SpikeDump {
    let mut dump = C1SpikeDump::new();
    for label in ["0", "90"] {
        let trains = (0..25)
            .map(|unit| {
                (0..IMAGES)
                    .filter(|image| (unit + image) % 2 == 0)
                    .flat_map(|image| [image as f64 * 50.0 + 1.0, image as f64 * 50.0 + 5.0])
                    .collect()
            })
            .collect();
        dump.insert_layer(5, C1LayerRecord::new(LayerShape::new(5, 5), label, trains));
    }
    dump
}

fn toy_config() -> HmaxConfig {
    let mut config = HmaxConfig::default();
    config.simulation.seed = Some(7);
    config.s2.prototype_cells = 2;
    config.checkpoint.interval_trials = 2;
    config.classifier.epochs = 200;
    config
}

fn labels() -> Vec<String> {
    ["a", "b", "a", "b", "a"].iter().map(|l| l.to_string()).collect()
}

fn train_to(path: &Path, plan: &TrainingPlan, dump: &C1SpikeDump) -> WeightSnapshot {
    let role = CoordinationRole::single_process();
    let mut sim = ReferenceSimulator::new();
    let layers = build_training_network(&mut sim, dump, plan, None).unwrap();
    let dump_ctx = Arc::new(EmergencyDump::new(WeightCheckpointWriter::open(path).unwrap()));
    let mut manager = WeightLifecycleManager::new(
        role,
        CheckpointPolicy::new(2),
        plan.prototype_count,
        Some(dump_ctx),
    );
    train(&mut sim, role, &layers, plan, &mut manager).unwrap()
}

#[test]
fn test_train_then_classify_every_checkpoint() {
    let dir = tempdir().unwrap();
    let weights = dir.path().join("weights.bin");
    let config = toy_config();
    let dump = toy_dump();

    let plan = TrainingPlan::from_config(&config, "toy", IMAGES as u64, &dump).unwrap();
    assert_eq!(plan.dataset_label, "toy_fs3_5imgs_50ms_scales_5");
    let last = train_to(&weights, &plan, &dump);
    assert_eq!(last.epoch, 5);
    assert_eq!(last.prototype_count(), 2);

    let snapshots = load_weight_checkpoints(&weights).unwrap();
    let epochs: Vec<u64> = snapshots.iter().map(|s| s.epoch).collect();
    assert_eq!(epochs, vec![2, 4, 5]);
    assert_eq!(snapshots.last(), Some(&last));

    let plan = ClassificationPlan::from_config(&config).unwrap();
    let mut sim = ReferenceSimulator::new();
    let layers = build_validation_network(&mut sim, &dump, &snapshots, &plan).unwrap();
    assert_eq!(layers.c2().unwrap().len(), 2);

    let labels = labels();
    let set = LabeledDump {
        dump: &dump,
        labels: &labels,
        image_count: IMAGES,
    };
    for snapshot in &snapshots {
        let evaluation = evaluate_snapshot(&mut sim, &layers, snapshot, set, set, &plan).unwrap();
        assert_eq!(evaluation.epoch, snapshot.epoch);
        assert_eq!(evaluation.confusion.total(), IMAGES);

        let text = evaluation.to_string();
        assert!(text.starts_with(&"=".repeat(60)));
        assert!(text.contains(&format!("Epoch {}", snapshot.epoch)));
    }
}

#[test]
fn test_replay_is_repeatable() {
    let dir = tempdir().unwrap();
    let weights = dir.path().join("weights.bin");
    let config = toy_config();
    let dump = toy_dump();
    let plan = TrainingPlan::from_config(&config, "toy", IMAGES as u64, &dump).unwrap();
    train_to(&weights, &plan, &dump);
    let snapshots = load_weight_checkpoints(&weights).unwrap();

    let plan = ClassificationPlan::from_config(&config).unwrap();
    let mut sim = ReferenceSimulator::new();
    let layers = build_validation_network(&mut sim, &dump, &snapshots, &plan).unwrap();
    let c2 = layers.c2().unwrap();

    let first = collect_responses(&mut sim, layers.c1(), c2, &dump, IMAGES, plan.sim_time_ms).unwrap();
    let second = collect_responses(&mut sim, layers.c1(), c2, &dump, IMAGES, plan.sim_time_ms).unwrap();
    assert_eq!(first.len(), IMAGES);
    assert!(first.iter().all(|r| r.len() == 2));
    assert_eq!(first, second);
}

#[test]
fn test_training_writes_reconstructions_and_rasters() {
    let dir = tempdir().unwrap();
    let config = toy_config();
    let dump = toy_dump();

    let mut plan = TrainingPlan::from_config(&config, "toy", IMAGES as u64, &dump).unwrap();
    let templates = BTreeMap::from([
        ("0".to_string(), GrayImage::from_pixel(2, 2, image::Luma([255]))),
        ("90".to_string(), GrayImage::from_pixel(2, 2, image::Luma([64]))),
    ]);
    plan.reconstruction = Some(Reconstruction {
        dictionary: FeatureImageDictionary::from_images(templates),
        output_dir: dir.path().join("S2_reconstructions"),
    });
    plan.plots = Some(RasterPlots {
        output_dir: dir.path().join("plots"),
        c1: true,
        s2: true,
    });
    train_to(&dir.path().join("weights.bin"), &plan, &dump);

    let label = plan.dataset_label.as_str();
    for epoch in [2, 4, 5] {
        for prototype in 0..2 {
            let path = reconstruction_path(&dir.path().join("S2_reconstructions"), label, prototype, epoch);
            let png = image::open(&path).unwrap().to_luma8();
            assert_eq!(png.dimensions(), (6, 6));
        }
    }
    let plots = dir.path().join("plots");
    for image in 0..IMAGES as u64 {
        assert!(c1_raster_path(&plots, label, image, 5, "90").exists());
        assert!(s2_raster_path(&plots, label, image, 1, 5).exists());
    }
}

#[test]
fn test_seed_snapshot_must_match_prototype_count() {
    let config = toy_config();
    let dump = toy_dump();
    let plan = TrainingPlan::from_config(&config, "toy", IMAGES as u64, &dump).unwrap();
    let stale = WeightSnapshot::new(10, vec![Default::default()]);

    let mut sim = ReferenceSimulator::new();
    let result = build_training_network(&mut sim, &dump, &plan, Some(&stale));
    assert!(matches!(
        result,
        Err(PipelineError::PrototypeCount { epoch: 10, expected: 2, actual: 1 })
    ));
}

#[test]
fn test_classification_needs_snapshots() {
    let plan = ClassificationPlan::from_config(&toy_config()).unwrap();
    let mut sim = ReferenceSimulator::new();
    let result = build_validation_network(&mut sim, &toy_dump(), &[], &plan);
    assert!(matches!(result, Err(PipelineError::NoSnapshots)));
}

#[test]
fn test_classification_rejects_misaligned_labels() {
    let dir = tempdir().unwrap();
    let weights = dir.path().join("weights.bin");
    let config = toy_config();
    let dump = toy_dump();
    let plan = TrainingPlan::from_config(&config, "toy", IMAGES as u64, &dump).unwrap();
    train_to(&weights, &plan, &dump);
    let snapshots = load_weight_checkpoints(&weights).unwrap();

    let plan = ClassificationPlan::from_config(&config).unwrap();
    let mut sim = ReferenceSimulator::new();
    let layers = build_validation_network(&mut sim, &dump, &snapshots, &plan).unwrap();

    let labels = labels();
    let short = &labels[..4];
    let training = LabeledDump {
        dump: &dump,
        labels: short,
        image_count: IMAGES,
    };
    let validation = LabeledDump {
        dump: &dump,
        labels: &labels,
        image_count: IMAGES,
    };
    let result = evaluate_snapshot(&mut sim, &layers, &snapshots[0], training, validation, &plan);
    assert!(matches!(
        result,
        Err(PipelineError::Classifier(hmax::classifier::ClassifierError::SampleLabelMismatch {
            samples: 5,
            labels: 4
        }))
    ));
}
