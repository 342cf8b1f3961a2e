// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Handles and parameter types exchanged with a simulator

use crate::SimulatorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Handle of a population, assigned in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PopulationId(pub u32);

impl fmt::Display for PopulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pop#{}", self.0)
    }
}

/// Handle of a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Reduction applied by a pooling unit to its presynaptic spike counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolingOp {
    #[default]
    Max,
    Sum,
}

impl FromStr for PoolingOp {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(PoolingOp::Max),
            "sum" => Ok(PoolingOp::Sum),
            other => Err(SimulatorError::InvalidParameter(format!(
                "unknown pooling operation '{}', expected 'max' or 'sum'",
                other
            ))),
        }
    }
}

impl fmt::Display for PoolingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolingOp::Max => f.write_str("max"),
            PoolingOp::Sum => f.write_str("sum"),
        }
    }
}

/// Unit model of a population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UnitModel {
    /// Emits externally supplied spike times
    SpikeSource,
    /// Fires once per `threshold` of accumulated weighted input, at most
    /// once per `refractory_ms`
    IntegrateAndFire { threshold: f64, refractory_ms: f64 },
    /// Single-step reduction over presynaptic spike counts
    Pooling(PoolingOp),
}

/// How two populations are wired
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionPattern {
    /// Explicit `(pre, post, weight)` triples; connection handles come back in list order
    FromList(Vec<(u32, u32, f32)>),
    /// Every source unit to every target unit, source-major order
    AllToAll { weight: f32 },
    /// Unit `i` to unit `i`; both populations must have the same size
    OneToOne { weight: f32 },
}

/// Spike-timing-dependent plasticity parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StdpParams {
    /// Potentiation trace time constant (ms)
    pub tau_plus_ms: f64,
    /// Depression trace time constant (ms)
    pub tau_minus_ms: f64,
    pub a_plus: f32,
    pub a_minus: f32,
    pub w_min: f32,
    pub w_max: f32,
    pub learning_rate: f32,
}

impl Default for StdpParams {
    fn default() -> Self {
        Self {
            tau_plus_ms: 20.0,
            tau_minus_ms: 20.0,
            a_plus: 0.01,
            a_minus: 0.012,
            w_min: 0.0,
            w_max: 1.0,
            learning_rate: 1.0,
        }
    }
}

/// Synapse dynamics attached to a connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum SynapseDynamics {
    #[default]
    Static,
    Stdp(StdpParams),
}

/// Signals a population can record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordSignal {
    Spikes,
    Voltage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pooling_op_parse() {
        assert_eq!("max".parse::<PoolingOp>().unwrap(), PoolingOp::Max);
        assert_eq!("Sum".parse::<PoolingOp>().unwrap(), PoolingOp::Sum);
        assert!("mean".parse::<PoolingOp>().is_err());
    }
}
