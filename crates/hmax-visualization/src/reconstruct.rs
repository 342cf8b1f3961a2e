// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Feature reconstruction.
//!
//! A learned prototype is drawn as a `feature_size x feature_size` grid of
//! template-sized tiles. Tile `(r, c)` is the weighted sum of all templates,
//! each weighted by the kernel cell `(r, c)` of its label.

use crate::{FeatureImageDictionary, VisualizationError, VisualizationResult};
use hmax_structures::FeatureKernel;
use image::{GrayImage, ImageFormat, Luma};
use std::path::Path;
use tracing::debug;

/// Stretch `values` onto 0-255; a flat (or non-finite) range gives all zeros
pub(crate) fn normalize(values: &[f64]) -> Vec<u8> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let range = max - min;
    if !(range.is_finite() && range > f64::EPSILON) {
        return vec![0; values.len()];
    }
    values
        .iter()
        .map(|v| (((v - min) / range) * 255.0).round() as u8)
        .collect()
}

/// Composite `kernel` from the templates in `dictionary`.
///
/// Every label of the kernel needs a template, and all templates must
/// share one size. Deterministic; an all-zero kernel yields a black image.
pub fn reconstruct(
    kernel: &FeatureKernel,
    dictionary: &FeatureImageDictionary,
    feature_size: usize,
) -> VisualizationResult<GrayImage> {
    if kernel.feature_size() != feature_size {
        return Err(VisualizationError::KernelSize {
            kernel: kernel.feature_size(),
            requested: feature_size,
        });
    }

    let mut layers = Vec::with_capacity(kernel.len());
    let mut tile: Option<(u32, u32)> = None;
    for (label, weights) in kernel.iter() {
        let template = dictionary.get(label)?;
        let dims = template.dimensions();
        match tile {
            None => tile = Some(dims),
            Some(expected) if expected != dims => {
                return Err(VisualizationError::TemplateSizeMismatch {
                    label: label.to_string(),
                    expected,
                    actual: dims,
                })
            }
            Some(_) => {}
        }
        layers.push((weights, template));
    }

    let (tile_w, tile_h) = tile.unwrap_or((1, 1));
    let fs = feature_size as u32;
    let (width, height) = (tile_w * fs, tile_h * fs);
    let mut canvas = vec![0.0f64; (width * height) as usize];

    for (weights, template) in &layers {
        for r in 0..fs {
            for c in 0..fs {
                let weight = f64::from(weights[(r * fs + c) as usize]);
                if weight == 0.0 {
                    continue;
                }
                for (x, y, Luma([p])) in template.enumerate_pixels() {
                    let idx = ((r * tile_h + y) * width + c * tile_w + x) as usize;
                    canvas[idx] += weight * f64::from(*p);
                }
            }
        }
    }

    let pixels = normalize(&canvas);
    debug!(target: "hmax-visualization", "Reconstructed {} labels into {}x{}", layers.len(), width, height);
    GrayImage::from_raw(width, height, pixels).ok_or(VisualizationError::KernelSize {
        kernel: kernel.feature_size(),
        requested: feature_size,
    })
}

/// Write `image` as PNG, creating parent directories
pub fn save_png<P: AsRef<Path>>(image: &GrayImage, path: P) -> VisualizationResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| VisualizationError::Image {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(target: "hmax-visualization", "Saved {}", path.display());
    Ok(())
}
