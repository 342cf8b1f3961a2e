// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shaped handles over simulator populations

use crate::{BduError, BduResult};
use hmax_simulator::{PopulationId, Simulator};
use hmax_structures::LayerShape;
use std::collections::BTreeMap;

/// A named, shaped view of one population.
///
/// Identity (label, shape) never changes; the population's state lives in
/// the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    population: PopulationId,
    shape: LayerShape,
    label: String,
}

impl Layer {
    /// Wrap an existing population; its size must equal `rows * cols`
    pub fn new<S: Simulator + ?Sized>(
        sim: &S,
        population: PopulationId,
        shape: LayerShape,
        label: impl Into<String>,
    ) -> BduResult<Self> {
        let label = label.into();
        let actual = sim.population_size(population)?;
        if actual != shape.unit_count() {
            return Err(BduError::PopulationSize {
                label,
                shape: shape.to_string(),
                actual,
            });
        }
        Ok(Self {
            population,
            shape,
            label,
        })
    }

    pub fn population(&self) -> PopulationId {
        self.population
    }

    pub fn shape(&self) -> LayerShape {
        self.shape
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// `(scale, label) -> Layer` lookup, built once
#[derive(Debug, Clone, Default)]
pub struct LayerIndex {
    layers: BTreeMap<(u32, String), Layer>,
}

impl LayerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scale: u32, layer: Layer) -> BduResult<()> {
        let key = (scale, layer.label().to_string());
        if self.layers.contains_key(&key) {
            return Err(BduError::DuplicateLabel {
                scale,
                label: key.1,
            });
        }
        self.layers.insert(key, layer);
        Ok(())
    }

    pub fn get(&self, scale: u32, label: &str) -> BduResult<&Layer> {
        self.layers
            .get(&(scale, label.to_string()))
            .ok_or_else(|| BduError::UnknownLayer {
                scale,
                label: label.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
