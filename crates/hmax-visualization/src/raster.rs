// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::reconstruct::normalize;
use crate::{VisualizationError, VisualizationResult};
use hmax_structures::LayerShape;
use image::GrayImage;

/// Render per-unit spike counts of a layer, one pixel per unit, row-major.
///
/// The busiest unit is white, the quietest black; a layer where every unit
/// spiked equally is black.
pub fn spike_count_raster(shape: LayerShape, counts: &[u64]) -> VisualizationResult<GrayImage> {
    if counts.len() != shape.unit_count() || shape.is_empty() {
        return Err(VisualizationError::CountMismatch {
            rows: shape.rows,
            cols: shape.cols,
            count: counts.len(),
        });
    }
    let values: Vec<f64> = counts.iter().map(|c| *c as f64).collect();
    GrayImage::from_raw(shape.cols as u32, shape.rows as u32, normalize(&values)).ok_or(
        VisualizationError::CountMismatch {
            rows: shape.rows,
            cols: shape.cols,
            count: counts.len(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_layout() {
        let img = spike_count_raster(LayerShape::new(2, 3), &[0, 1, 2, 3, 4, 10]).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(2, 1)[0], 255);
        assert_eq!(img.get_pixel(1, 1)[0], 102);
    }

    #[test]
    fn test_raster_count_mismatch() {
        assert!(matches!(
            spike_count_raster(LayerShape::new(2, 2), &[1, 2, 3]),
            Err(VisualizationError::CountMismatch { count: 3, .. })
        ));
    }
}
