// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Sliding-window receptive fields (stride 1, no padding).
*/

use hmax_structures::LayerShape;

/// Grid of the S2 layer built over a C1 grid, or `None` when the window does not fit
pub fn s2_grid(c1: LayerShape, feature_size: usize) -> Option<LayerShape> {
    c1.fits(feature_size).then(|| {
        LayerShape::new(c1.rows - feature_size + 1, c1.cols - feature_size + 1)
    })
}

/// `(pre, post)` unit pairs connecting one C1 layer to its S2 layer.
///
/// S2 unit `(r, c)` receives C1 units `(r + dr, c + dc)` for
/// `dr, dc in 0..feature_size`. Pairs are ordered by post, then by window
/// offset in row-major order.
pub fn window_connections(c1: LayerShape, feature_size: usize) -> Vec<(u32, u32)> {
    let Some(s2) = s2_grid(c1, feature_size) else {
        return Vec::new();
    };

    let mut pairs = Vec::with_capacity(s2.unit_count() * feature_size * feature_size);
    for r in 0..s2.rows {
        for c in 0..s2.cols {
            let post = s2.index_of(r, c) as u32;
            for dr in 0..feature_size {
                for dc in 0..feature_size {
                    let pre = c1.index_of(r + dr, c + dc) as u32;
                    pairs.push((pre, post));
                }
            }
        }
    }
    pairs
}
