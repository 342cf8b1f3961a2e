// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{ConnectionId, PopulationId};

/// Errors reported by a simulator backend
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Unknown population {0}")]
    UnknownPopulation(PopulationId),

    #[error("Unknown connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("Population {population} has {expected} units but {actual} spike trains were given")]
    SpikeTrainCount {
        population: PopulationId,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unit {unit} is out of range for population {population} of size {size}")]
    UnitOutOfRange {
        population: PopulationId,
        unit: u32,
        size: usize,
    },

    #[error("Population {population} does not record {signal}")]
    NotRecorded {
        population: PopulationId,
        signal: &'static str,
    },

    #[error("Coordination layer unavailable: {0}")]
    ChannelFailure(String),
}

pub type SimulatorResult<T> = Result<T, SimulatorError>;
