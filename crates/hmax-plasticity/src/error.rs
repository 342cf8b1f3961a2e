// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use hmax_serialization::SerializationError;
use hmax_simulator::SimulatorError;

/// Errors of the weight lifecycle
#[derive(Debug, thiserror::Error)]
pub enum PlasticityError {
    #[error("Prototype {prototype} has no connection for synapse {synapse}")]
    UnknownSynapse { prototype: usize, synapse: String },

    #[error("No weight given for synapse {synapse} of prototype {prototype}")]
    MissingWeights { prototype: usize, synapse: String },

    #[error("Prototype {prototype} out of range: the S2 stage holds {count}")]
    PrototypeOutOfRange { prototype: usize, count: usize },

    #[error("Invalid STDP parameters: {0}")]
    InvalidParams(String),

    #[error("Fatal-signal hook: {0}")]
    SignalFault(String),

    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

pub type PlasticityResult<T> = Result<T, PlasticityError>;
