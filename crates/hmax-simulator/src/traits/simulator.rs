// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulator abstraction
//!
//! Builders and the weight lifecycle talk to the network only through this
//! trait. Populations and connections are addressed by the handles the
//! simulator hands out; nothing outside the simulator owns unit state.

use crate::{
    ConnectionId, ConnectionPattern, PopulationId, RecordSignal, SimulatorResult,
    SynapseDynamics, UnitModel,
};
use std::collections::BTreeMap;

/// A spiking network simulator.
///
/// All mutation goes through `&mut self`, so weights can only be read or
/// written between [`Simulator::run`] calls.
pub trait Simulator {
    /// Short backend identifier for logs
    fn backend_name(&self) -> &'static str;

    /// Create a population of `size` units
    fn create_population(
        &mut self,
        size: usize,
        model: UnitModel,
        label: &str,
    ) -> SimulatorResult<PopulationId>;

    /// Wire `source` to `target`; returns one handle per created connection
    fn connect(
        &mut self,
        source: PopulationId,
        target: PopulationId,
        pattern: ConnectionPattern,
        dynamics: SynapseDynamics,
    ) -> SimulatorResult<Vec<ConnectionId>>;

    /// Replace the spike times (ms) of a spike-source population, one train per unit
    fn set_spike_times(
        &mut self,
        population: PopulationId,
        spike_times: &[Vec<f64>],
    ) -> SimulatorResult<()>;

    /// Advance simulated time by `duration_ms`
    fn run(&mut self, duration_ms: f64) -> SimulatorResult<()>;

    /// Set time back to 0 and clear recordings; weights and spike times are kept
    fn reset(&mut self);

    /// Enable recording of `signals` on a population
    fn record(&mut self, population: PopulationId, signals: &[RecordSignal])
        -> SimulatorResult<()>;

    /// Spikes recorded per unit since the last clear
    fn spike_counts(&self, population: PopulationId) -> SimulatorResult<BTreeMap<u32, u64>>;

    /// Last recorded membrane drive per unit
    fn voltages(&self, population: PopulationId) -> SimulatorResult<Vec<f64>>;

    fn clear_recordings(&mut self, population: PopulationId) -> SimulatorResult<()>;

    fn read_weight(&self, connection: ConnectionId) -> SimulatorResult<f32>;

    fn write_weight(&mut self, connection: ConnectionId, weight: f32) -> SimulatorResult<()>;

    fn population_size(&self, population: PopulationId) -> SimulatorResult<usize>;

    fn population_label(&self, population: PopulationId) -> SimulatorResult<&str>;

    /// Current simulated time (ms)
    fn current_time(&self) -> f64;
}
