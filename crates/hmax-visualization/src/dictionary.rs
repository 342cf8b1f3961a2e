// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{VisualizationError, VisualizationResult};
use image::GrayImage;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Grayscale feature templates keyed by identifier (file stem). Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct FeatureImageDictionary {
    images: BTreeMap<String, GrayImage>,
}

impl FeatureImageDictionary {
    /// Load every image file in `dir` as 8-bit grayscale.
    ///
    /// Files the `image` crate cannot identify by extension are skipped.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> VisualizationResult<Self> {
        let dir = dir.as_ref();
        let mut images = BTreeMap::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || image::ImageFormat::from_path(&path).is_err() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let template = image::open(&path)
                .map_err(|source| VisualizationError::Image {
                    path: path.clone(),
                    source,
                })?
                .to_luma8();
            debug!(target: "hmax-visualization", "Loaded template '{}' ({}x{})", stem, template.width(), template.height());
            images.insert(stem.to_string(), template);
        }
        info!(target: "hmax-visualization", "Loaded {} feature templates from {}", images.len(), dir.display());
        Ok(Self { images })
    }

    pub fn from_images(images: BTreeMap<String, GrayImage>) -> Self {
        Self { images }
    }

    pub fn get(&self, label: &str) -> VisualizationResult<&GrayImage> {
        self.images
            .get(label)
            .ok_or_else(|| VisualizationError::MissingTemplate(label.to_string()))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }
}
