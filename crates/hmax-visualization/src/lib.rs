// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # HMAX Visualization
//!
//! Turns learned S2 weights and recorded spike counts into grayscale images.
//!
//! - [`FeatureImageDictionary`]: oriented Gabor templates keyed by file stem
//! - [`reconstruct`]: composites a [`FeatureKernel`](hmax_structures::FeatureKernel)
//!   from the templates
//! - [`spike_count_raster`]: one pixel per unit, brightness by spike count
//!
//! All outputs are normalized to the full 0-255 range.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod dictionary;
mod error;
mod raster;
mod reconstruct;

pub use dictionary::FeatureImageDictionary;
pub use error::{VisualizationError, VisualizationResult};
pub use raster::spike_count_raster;
pub use reconstruct::{reconstruct, save_png};

pub use image::GrayImage;
