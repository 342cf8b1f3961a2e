// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Deterministic spike-count propagation backend

use super::ConnectionArray;
use crate::{
    ConnectionId, ConnectionPattern, PoolingOp, PopulationId, RecordSignal, Simulator,
    SimulatorError, SimulatorResult, SynapseDynamics, UnitModel,
};
use std::collections::BTreeMap;
use tracing::{debug, trace};

struct Population {
    label: String,
    size: usize,
    model: UnitModel,
    spike_times: Vec<Vec<f64>>,
    record_spikes: bool,
    record_voltage: bool,
    recorded_counts: Vec<u64>,
    voltages: Vec<f64>,
}

impl Population {
    fn new(size: usize, model: UnitModel, label: &str) -> Self {
        Self {
            label: label.to_string(),
            size,
            model,
            spike_times: vec![Vec::new(); size],
            record_spikes: false,
            record_voltage: false,
            recorded_counts: vec![0; size],
            voltages: vec![0.0; size],
        }
    }

    fn clear(&mut self) {
        self.recorded_counts.iter_mut().for_each(|c| *c = 0);
        self.voltages.iter_mut().for_each(|v| *v = 0.0);
    }
}

/// In-process reference simulator.
///
/// `run(d)` evaluates populations in creation order over the window
/// `[t, t + d)`:
/// - spike sources emit the supplied spike times falling in the window
/// - integrate-and-fire units fire `floor(Σ w·count_pre / threshold)` times,
///   capped at `floor(d / refractory_ms)`
/// - pooling units take the max or sum of their presynaptic counts
///
/// Connections must be feed-forward (source created before target). After
/// every window, plastic connections receive an activity-gated update.
pub struct ReferenceSimulator {
    populations: Vec<Population>,
    connections: ConnectionArray,
    time_ms: f64,
}

impl Default for ReferenceSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceSimulator {
    pub fn new() -> Self {
        Self {
            populations: Vec::new(),
            connections: ConnectionArray::new(),
            time_ms: 0.0,
        }
    }

    pub fn population_count(&self) -> usize {
        self.populations.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn population(&self, id: PopulationId) -> SimulatorResult<&Population> {
        self.populations
            .get(id.0 as usize)
            .ok_or(SimulatorError::UnknownPopulation(id))
    }

    fn population_mut(&mut self, id: PopulationId) -> SimulatorResult<&mut Population> {
        self.populations
            .get_mut(id.0 as usize)
            .ok_or(SimulatorError::UnknownPopulation(id))
    }

    fn connection_index(&self, id: ConnectionId) -> SimulatorResult<usize> {
        let idx = id.0 as usize;
        if idx < self.connections.len() {
            Ok(idx)
        } else {
            Err(SimulatorError::UnknownConnection(id))
        }
    }

    fn check_unit(population: PopulationId, unit: u32, size: usize) -> SimulatorResult<()> {
        if (unit as usize) < size {
            Ok(())
        } else {
            Err(SimulatorError::UnitOutOfRange {
                population,
                unit,
                size,
            })
        }
    }

    /// Spike counts of one population for the window, plus its drive when it integrates
    fn window_counts(
        &self,
        pop_idx: usize,
        start: f64,
        end: f64,
        counts: &[Vec<u64>],
    ) -> (Vec<u64>, Option<Vec<f64>>) {
        let duration = end - start;
        let pop = &self.populations[pop_idx];
        let target = pop_idx as u32;
        match pop.model {
            UnitModel::SpikeSource => {
                let emitted = pop
                    .spike_times
                    .iter()
                    .map(|train| train.iter().filter(|t| **t >= start && **t < end).count() as u64)
                    .collect();
                (emitted, None)
            }
            UnitModel::IntegrateAndFire {
                threshold,
                refractory_ms,
            } => {
                let drive = self.connections.accumulate_drive(target, pop.size, counts);
                let cap = if refractory_ms > 0.0 {
                    (duration / refractory_ms).floor() as u64
                } else {
                    u64::MAX
                };
                let fired = drive
                    .iter()
                    .map(|d| {
                        if *d <= 0.0 {
                            0
                        } else {
                            ((d / threshold).floor() as u64).min(cap)
                        }
                    })
                    .collect();
                (fired, Some(drive))
            }
            UnitModel::Pooling(op) => {
                let reduce: fn(u64, u64) -> u64 = match op {
                    PoolingOp::Max => u64::max,
                    PoolingOp::Sum => |a, b| a + b,
                };
                (self.connections.pool_counts(target, pop.size, counts, reduce), None)
            }
        }
    }
}

impl Simulator for ReferenceSimulator {
    fn backend_name(&self) -> &'static str {
        "reference"
    }

    fn create_population(
        &mut self,
        size: usize,
        model: UnitModel,
        label: &str,
    ) -> SimulatorResult<PopulationId> {
        if size == 0 {
            return Err(SimulatorError::InvalidParameter(format!(
                "population '{}' must have at least one unit",
                label
            )));
        }
        if let UnitModel::IntegrateAndFire {
            threshold,
            refractory_ms,
        } = model
        {
            if !(threshold > 0.0) || refractory_ms < 0.0 {
                return Err(SimulatorError::InvalidParameter(format!(
                    "population '{}': threshold must be positive and refractory period non-negative",
                    label
                )));
            }
        }
        let id = PopulationId(self.populations.len() as u32);
        self.populations.push(Population::new(size, model, label));
        debug!(target: "hmax-simulator", "Created population {} '{}' ({} units, {:?})", id, label, size, model);
        Ok(id)
    }

    fn connect(
        &mut self,
        source: PopulationId,
        target: PopulationId,
        pattern: ConnectionPattern,
        dynamics: SynapseDynamics,
    ) -> SimulatorResult<Vec<ConnectionId>> {
        let source_size = self.population(source)?.size;
        let target_pop = self.population(target)?;
        let target_size = target_pop.size;
        if matches!(target_pop.model, UnitModel::SpikeSource) {
            return Err(SimulatorError::InvalidParameter(format!(
                "spike source {} cannot receive connections",
                target
            )));
        }
        if source >= target {
            return Err(SimulatorError::InvalidParameter(format!(
                "connection {} -> {} is not feed-forward",
                source, target
            )));
        }

        let triples: Vec<(u32, u32, f32)> = match pattern {
            ConnectionPattern::FromList(list) => list,
            ConnectionPattern::AllToAll { weight } => (0..source_size as u32)
                .flat_map(|pre| (0..target_size as u32).map(move |post| (pre, post, weight)))
                .collect(),
            ConnectionPattern::OneToOne { weight } => {
                if source_size != target_size {
                    return Err(SimulatorError::InvalidParameter(format!(
                        "one-to-one between {} ({} units) and {} ({} units)",
                        source, source_size, target, target_size
                    )));
                }
                (0..source_size as u32).map(|i| (i, i, weight)).collect()
            }
        };

        // Validate before touching the store
        for (pre, post, weight) in &triples {
            Self::check_unit(source, *pre, source_size)?;
            Self::check_unit(target, *post, target_size)?;
            if !weight.is_finite() {
                return Err(SimulatorError::InvalidParameter(format!(
                    "non-finite weight on {}[{}] -> {}[{}]",
                    source, pre, target, post
                )));
            }
        }

        let ids = triples
            .into_iter()
            .map(|(pre, post, weight)| {
                let idx = self
                    .connections
                    .push(source.0, target.0, pre, post, weight, dynamics);
                ConnectionId(idx as u64)
            })
            .collect::<Vec<_>>();
        debug!(target: "hmax-simulator", "Connected {} -> {} with {} connections", source, target, ids.len());
        Ok(ids)
    }

    fn set_spike_times(
        &mut self,
        population: PopulationId,
        spike_times: &[Vec<f64>],
    ) -> SimulatorResult<()> {
        let pop = self.population_mut(population)?;
        if !matches!(pop.model, UnitModel::SpikeSource) {
            return Err(SimulatorError::InvalidParameter(format!(
                "population '{}' is not a spike source",
                pop.label
            )));
        }
        if spike_times.len() != pop.size {
            return Err(SimulatorError::SpikeTrainCount {
                population,
                expected: pop.size,
                actual: spike_times.len(),
            });
        }
        pop.spike_times = spike_times.to_vec();
        Ok(())
    }

    fn run(&mut self, duration_ms: f64) -> SimulatorResult<()> {
        if !(duration_ms.is_finite() && duration_ms > 0.0) {
            return Err(SimulatorError::InvalidParameter(format!(
                "run duration must be positive, got {}",
                duration_ms
            )));
        }
        let start = self.time_ms;
        let end = start + duration_ms;

        let mut counts: Vec<Vec<u64>> = Vec::with_capacity(self.populations.len());
        let mut drives: Vec<Option<Vec<f64>>> = Vec::with_capacity(self.populations.len());
        for pop_idx in 0..self.populations.len() {
            let (window, drive) = self.window_counts(pop_idx, start, end, &counts);
            counts.push(window);
            drives.push(drive);
        }

        for ((pop, window), drive) in self.populations.iter_mut().zip(&counts).zip(drives) {
            if pop.record_spikes {
                pop.recorded_counts
                    .iter_mut()
                    .zip(window)
                    .for_each(|(total, c)| *total += c);
            }
            if pop.record_voltage {
                if let Some(drive) = drive {
                    pop.voltages = drive;
                }
            }
        }

        let changed = self.connections.apply_plasticity(&counts);
        self.time_ms = end;
        trace!(target: "hmax-simulator", "Ran [{:.1}, {:.1}) ms, {} plastic weights changed", start, end, changed);
        Ok(())
    }

    fn reset(&mut self) {
        self.time_ms = 0.0;
        self.populations.iter_mut().for_each(Population::clear);
        debug!(target: "hmax-simulator", "Simulator reset");
    }

    fn record(
        &mut self,
        population: PopulationId,
        signals: &[RecordSignal],
    ) -> SimulatorResult<()> {
        let pop = self.population_mut(population)?;
        for signal in signals {
            match signal {
                RecordSignal::Spikes => pop.record_spikes = true,
                RecordSignal::Voltage => pop.record_voltage = true,
            }
        }
        Ok(())
    }

    fn spike_counts(&self, population: PopulationId) -> SimulatorResult<BTreeMap<u32, u64>> {
        let pop = self.population(population)?;
        if !pop.record_spikes {
            return Err(SimulatorError::NotRecorded {
                population,
                signal: "spikes",
            });
        }
        Ok(pop
            .recorded_counts
            .iter()
            .enumerate()
            .map(|(unit, count)| (unit as u32, *count))
            .collect())
    }

    fn voltages(&self, population: PopulationId) -> SimulatorResult<Vec<f64>> {
        let pop = self.population(population)?;
        if !pop.record_voltage {
            return Err(SimulatorError::NotRecorded {
                population,
                signal: "voltage",
            });
        }
        Ok(pop.voltages.clone())
    }

    fn clear_recordings(&mut self, population: PopulationId) -> SimulatorResult<()> {
        self.population_mut(population)?.clear();
        Ok(())
    }

    fn read_weight(&self, connection: ConnectionId) -> SimulatorResult<f32> {
        let idx = self.connection_index(connection)?;
        Ok(self.connections.weights[idx])
    }

    fn write_weight(&mut self, connection: ConnectionId, weight: f32) -> SimulatorResult<()> {
        let idx = self.connection_index(connection)?;
        if !weight.is_finite() {
            return Err(SimulatorError::InvalidParameter(format!(
                "non-finite weight for {}",
                connection
            )));
        }
        self.connections.weights[idx] = weight;
        Ok(())
    }

    fn population_size(&self, population: PopulationId) -> SimulatorResult<usize> {
        Ok(self.population(population)?.size)
    }

    fn population_label(&self, population: PopulationId) -> SimulatorResult<&str> {
        Ok(self.population(population)?.label.as_str())
    }

    fn current_time(&self) -> f64 {
        self.time_ms
    }
}
