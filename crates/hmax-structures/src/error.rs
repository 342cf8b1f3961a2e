// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::LayerShape;

/// Errors raised while validating core data structures
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("Invalid layer shape {0}: both dimensions must be non-zero")]
    InvalidShape(LayerShape),

    #[error("Layer '{label}' has {actual} spike trains but its shape {shape} holds {expected} units")]
    SpikeTrainCount {
        label: String,
        shape: LayerShape,
        expected: usize,
        actual: usize,
    },

    #[error("Scale {scale} has layers of differing shapes: '{first}' is {first_shape}, '{other}' is {other_shape}")]
    InconsistentScale {
        scale: u32,
        first: String,
        first_shape: LayerShape,
        other: String,
        other_shape: LayerShape,
    },

    #[error("Synapse {synapse} lies outside a {feature_size}x{feature_size} receptive field")]
    OutsideReceptiveField { synapse: String, feature_size: usize },

    #[error("No C1 shape known for scale {0}")]
    UnknownScale(u32),
}

pub type StructureResult<T> = Result<T, StructureError>;
