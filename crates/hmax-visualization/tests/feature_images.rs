// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use hmax_structures::{FeatureKernel, LayerShape, PrototypeWeights, SynapseId};
use hmax_visualization::{reconstruct, save_png, FeatureImageDictionary, GrayImage, VisualizationError};
use image::Luma;
use std::collections::BTreeMap;
use tempfile::tempdir;

fn gabor_like(size: u32, vertical: bool) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| {
        let along = if vertical { x } else { y };
        Luma([if along == size / 2 { 255 } else { 32 }])
    })
}

#[test]
fn test_load_dir_keys_templates_by_stem() {
    let dir = tempdir().unwrap();
    gabor_like(9, true).save(dir.path().join("theta_90.png")).unwrap();
    gabor_like(9, false).save(dir.path().join("theta_0.png")).unwrap();
    std::fs::write(dir.path().join("README.txt"), "templates").unwrap();

    let dict = FeatureImageDictionary::load_dir(dir.path()).unwrap();
    assert_eq!(dict.len(), 2);
    assert_eq!(dict.labels().collect::<Vec<_>>(), vec!["theta_0", "theta_90"]);
    assert_eq!(dict.get("theta_90").unwrap(), &gabor_like(9, true));
    assert!(matches!(dict.get("theta_45"), Err(VisualizationError::MissingTemplate(_))));
}

#[test]
fn test_learned_weights_to_png() {
    let dir = tempdir().unwrap();
    let templates = BTreeMap::from([
        ("theta_0".to_string(), gabor_like(5, false)),
        ("theta_90".to_string(), gabor_like(5, true)),
    ]);
    let dict = FeatureImageDictionary::from_images(templates);

    // A 3x3 C1 grid into a single S2 unit; the vertical label dominates the centre column
    let c1 = LayerShape::new(3, 3);
    let mut weights = PrototypeWeights::new();
    for pre in 0..9u32 {
        let (_, col) = c1.position_of(pre as usize);
        weights.insert(SynapseId::new(2, "theta_90", pre, 0), if col == 1 { 0.9 } else { 0.1 });
        weights.insert(SynapseId::new(2, "theta_0", pre, 0), 0.05);
    }
    let kernel: FeatureKernel = weights.kernel(3, &BTreeMap::from([(2u32, c1)])).unwrap();

    let image = reconstruct(&kernel, &dict, 3).unwrap();
    assert_eq!(image.dimensions(), (15, 15));

    let path = dir.path().join("S2_reconstructions/demo/0/demo_prototype0_10_images.png");
    save_png(&image, &path).unwrap();
    let reloaded = image::open(&path).unwrap().to_luma8();
    assert_eq!(reloaded, image);
    assert_eq!(reloaded.pixels().map(|p| p[0]).max(), Some(255));
}
