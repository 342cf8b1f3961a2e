// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Core types for BDU operations.
*/

use hmax_simulator::SimulatorError;
use hmax_structures::StructureError;

/// Result type for BDU operations
pub type BduResult<T> = Result<T, BduError>;

/// Errors that can occur while building the topology
#[derive(Debug, thiserror::Error)]
pub enum BduError {
    #[error("Shape mismatch at scale {scale}: {reason}")]
    ShapeMismatch { scale: u32, reason: String },

    #[error("No initial weight for prototype {prototype} synapse {synapse}")]
    MissingWeights { prototype: usize, synapse: String },

    #[error("No C1 layer '{label}' at scale {scale}")]
    UnknownLayer { scale: u32, label: String },

    #[error("Duplicate C1 layer '{label}' at scale {scale}")]
    DuplicateLabel { scale: u32, label: String },

    #[error("Layer '{label}' has shape {shape} but its population holds {actual} units")]
    PopulationSize {
        label: String,
        shape: String,
        actual: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Simulator error: {0}")]
    Simulator(#[from] SimulatorError),

    #[error(transparent)]
    Structure(#[from] StructureError),
}
