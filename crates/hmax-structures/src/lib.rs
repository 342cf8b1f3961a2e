// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The core crate for the HMAX pipeline. Defines the data types that cross
//! crate and process boundaries:
//!
//! - [`LayerShape`]: the `(rows, cols)` grid of a layer
//! - [`SynapseId`]: stable key of one C1 → S2 connection
//! - [`PrototypeWeights`] / [`WeightSnapshot`]: learned S2 weights, one
//!   snapshot per checkpoint epoch
//! - [`FeatureKernel`]: a prototype's weights folded back onto its receptive field
//! - [`C1SpikeDump`]: the pre-computed C1 spike trains, per scale

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod c1;
mod error;
mod shape;
mod synapse;
mod weights;

pub use c1::{C1LayerRecord, C1SpikeDump};
pub use error::{StructureError, StructureResult};
pub use shape::LayerShape;
pub use synapse::SynapseId;
pub use weights::{FeatureKernel, PrototypeWeights, Weight, WeightSnapshot};
