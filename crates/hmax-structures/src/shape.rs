// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid dimensions of a layer. Units are laid out row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerShape {
    pub rows: usize,
    pub cols: usize,
}

impl LayerShape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of units in the grid
    pub const fn unit_count(&self) -> usize {
        self.rows * self.cols
    }

    pub const fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Row-major unit index of `(row, col)`
    pub const fn index_of(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Inverse of [`LayerShape::index_of`]
    pub const fn position_of(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// Whether a `size x size` window fits inside the grid
    pub const fn fits(&self, size: usize) -> bool {
        size > 0 && self.rows >= size && self.cols >= size
    }
}

impl From<(usize, usize)> for LayerShape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self::new(rows, cols)
    }
}

impl fmt::Display for LayerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}
