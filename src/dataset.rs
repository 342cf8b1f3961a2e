// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run naming and the on-disk layout of run artifacts

use std::path::{Path, PathBuf};

/// Name of a training run, e.g. `faces_fs3_100imgs_50ms_scales_7_9`
pub fn dataset_label(
    base: &str,
    feature_size: usize,
    image_count: u64,
    sim_time_ms: f64,
    scales: impl IntoIterator<Item = u32>,
) -> String {
    let mut label = format!(
        "{}_fs{}_{}imgs_{}ms_scales",
        base, feature_size, image_count, sim_time_ms as u64
    );
    for scale in scales {
        label.push_str(&format!("_{}", scale));
    }
    label
}

/// `<out>/<dataset>/<prototype>/<dataset>_prototype<prototype>_<images>_images.png`
pub fn reconstruction_path(out_dir: &Path, dataset: &str, prototype: usize, images: u64) -> PathBuf {
    out_dir
        .join(dataset)
        .join(prototype.to_string())
        .join(format!("{}_prototype{}_{}_images.png", dataset, prototype, images))
}

/// `<plots>/C1/<dataset>/<dataset>_image_<i>_s<scale>_<label>.png`
pub fn c1_raster_path(plots_dir: &Path, dataset: &str, image: u64, scale: u32, label: &str) -> PathBuf {
    plots_dir
        .join("C1")
        .join(dataset)
        .join(format!("{}_image_{}_s{}_{}.png", dataset, image, scale, label))
}

/// `<plots>/S2/<dataset>/<prototype>/<dataset>_image_<i>_s<scale>.png`
pub fn s2_raster_path(plots_dir: &Path, dataset: &str, image: u64, prototype: usize, scale: u32) -> PathBuf {
    plots_dir
        .join("S2")
        .join(dataset)
        .join(prototype.to_string())
        .join(format!("{}_image_{}_s{}.png", dataset, image, scale))
}
