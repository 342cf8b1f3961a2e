// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
S2 topology builder.

One S2 layer per scale per prototype. Each S2 unit receives a
`feature_size × feature_size` window of every C1 layer of its scale. The
builder returns, with the layers, a per-prototype registry mapping each
[`SynapseId`] to the simulator connection that realizes it.
*/

use crate::connectivity::{s2_grid, window_connections};
use crate::rng::seeded_rng;
use crate::{BduError, BduResult, C1Layers, Layer};
use hmax_simulator::{
    ConnectionId, ConnectionPattern, RecordSignal, Simulator, StdpParams, SynapseDynamics,
    UnitModel,
};
use hmax_structures::{LayerShape, PrototypeWeights, SynapseId};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// How fresh weights are drawn when no initial weights are given
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightInit {
    /// Uniform on `[low, high]`; a seed makes the draw reproducible
    Uniform { low: f32, high: f32, seed: Option<u64> },
}

impl Default for WeightInit {
    fn default() -> Self {
        WeightInit::Uniform {
            low: 0.0,
            high: 0.3,
            seed: None,
        }
    }
}

/// Parameters of [`build_s2`]
#[derive(Debug, Clone)]
pub struct S2BuildSpec<'a> {
    pub feature_size: usize,
    pub prototype_count: usize,
    pub unit_model: UnitModel,
    /// STDP for every S2 connection; `None` builds static connections
    pub plasticity: Option<StdpParams>,
    /// Per-prototype weights to seed connections from
    pub initial_weights: Option<&'a [PrototypeWeights]>,
    pub weight_init: WeightInit,
}

/// The S2 stage
#[derive(Debug, Clone)]
pub struct S2Layers {
    feature_size: usize,
    /// scale -> layers indexed by prototype
    by_scale: BTreeMap<u32, Vec<Layer>>,
    /// prototype -> synapse -> connection
    registry: Vec<BTreeMap<SynapseId, ConnectionId>>,
}

impl S2Layers {
    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    pub fn prototype_count(&self) -> usize {
        self.registry.len()
    }

    pub fn scales(&self) -> &BTreeMap<u32, Vec<Layer>> {
        &self.by_scale
    }

    /// The S2 layers of one prototype, one per scale
    pub fn layers_for_prototype(&self, prototype: usize) -> impl Iterator<Item = (u32, &Layer)> {
        self.by_scale
            .iter()
            .filter_map(move |(scale, layers)| layers.get(prototype).map(|l| (*scale, l)))
    }

    pub fn layers(&self) -> impl Iterator<Item = (u32, &Layer)> {
        self.by_scale
            .iter()
            .flat_map(|(scale, layers)| layers.iter().map(move |l| (*scale, l)))
    }

    /// Synapse registry of one prototype
    pub fn registry(&self, prototype: usize) -> Option<&BTreeMap<SynapseId, ConnectionId>> {
        self.registry.get(prototype)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.iter().map(BTreeMap::len).sum()
    }

    /// Enable recording of `signals` on every S2 layer
    pub fn record<S: Simulator + ?Sized>(
        &self,
        sim: &mut S,
        signals: &[RecordSignal],
    ) -> BduResult<()> {
        for (_, layer) in self.layers() {
            sim.record(layer.population(), signals)?;
        }
        Ok(())
    }
}

/// Check every C1 scale against the feature size; returns `scale -> (C1 grid, S2 grid)`
fn plan_grids(c1: &C1Layers, feature_size: usize) -> BduResult<BTreeMap<u32, (LayerShape, LayerShape)>> {
    if feature_size == 0 {
        return Err(BduError::ShapeMismatch {
            scale: 0,
            reason: "feature size must be at least 1".to_string(),
        });
    }

    let mut grids = BTreeMap::new();
    for (scale, layers) in c1.scales() {
        let Some(first) = layers.first() else {
            continue;
        };
        let c1_shape = first.shape();
        if let Some(other) = layers.iter().find(|l| l.shape() != c1_shape) {
            return Err(BduError::ShapeMismatch {
                scale: *scale,
                reason: format!(
                    "C1 layers '{}' ({}) and '{}' ({}) differ",
                    first.label(),
                    c1_shape,
                    other.label(),
                    other.shape()
                ),
            });
        }
        let s2_shape = s2_grid(c1_shape, feature_size).ok_or_else(|| BduError::ShapeMismatch {
            scale: *scale,
            reason: format!(
                "C1 grid {} is smaller than the {}x{} receptive field",
                c1_shape, feature_size, feature_size
            ),
        })?;
        grids.insert(*scale, (c1_shape, s2_shape));
    }
    Ok(grids)
}

/// Require an initial weight for every connection the topology will contain
fn check_initial_weights(
    c1: &C1Layers,
    grids: &BTreeMap<u32, (LayerShape, LayerShape)>,
    feature_size: usize,
    initial: &[PrototypeWeights],
    prototype_count: usize,
) -> BduResult<()> {
    if initial.len() != prototype_count {
        return Err(BduError::InvalidParameter(format!(
            "initial weights cover {} prototypes, {} requested",
            initial.len(),
            prototype_count
        )));
    }
    for (scale, (c1_shape, _)) in grids {
        let pairs = window_connections(*c1_shape, feature_size);
        for layer in &c1.scales()[scale] {
            for (prototype, weights) in initial.iter().enumerate() {
                for (pre, post) in &pairs {
                    let id = SynapseId::new(*scale, layer.label(), *pre, *post);
                    if !weights.contains(&id) {
                        return Err(BduError::MissingWeights {
                            prototype,
                            synapse: id.to_string(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Build the S2 stage over `c1`.
///
/// # Errors
///
/// - `ShapeMismatch` when `feature_size` is 0, a C1 grid is smaller than the
///   receptive field, or the C1 layers of one scale disagree on shape
/// - `MissingWeights` when `initial_weights` lacks any connection
///
/// Both are detected before any population is created.
pub fn build_s2<S: Simulator + ?Sized>(
    sim: &mut S,
    c1: &C1Layers,
    spec: &S2BuildSpec<'_>,
) -> BduResult<S2Layers> {
    let feature_size = spec.feature_size;
    if spec.prototype_count == 0 {
        return Err(BduError::InvalidParameter(
            "at least one S2 prototype is required".to_string(),
        ));
    }
    let grids = plan_grids(c1, feature_size)?;
    if let Some(initial) = spec.initial_weights {
        check_initial_weights(c1, &grids, feature_size, initial, spec.prototype_count)?;
    }

    let WeightInit::Uniform { low, high, seed } = spec.weight_init;
    if !(low <= high) {
        return Err(BduError::InvalidParameter(format!(
            "uniform weight range [{}, {}] is empty",
            low, high
        )));
    }
    let mut rng = seeded_rng(seed);
    let dynamics = spec
        .plasticity
        .map(SynapseDynamics::Stdp)
        .unwrap_or(SynapseDynamics::Static);

    let mut by_scale: BTreeMap<u32, Vec<Layer>> = BTreeMap::new();
    let mut registry = vec![BTreeMap::new(); spec.prototype_count];

    for (prototype, synapses) in registry.iter_mut().enumerate() {
        for (scale, (c1_shape, s2_shape)) in &grids {
            let label = format!("S2_s{}_p{}", scale, prototype);
            let population = sim.create_population(s2_shape.unit_count(), spec.unit_model, &label)?;
            let s2_layer = Layer::new(&*sim, population, *s2_shape, label)?;
            let pairs = window_connections(*c1_shape, feature_size);

            for c1_layer in &c1.scales()[scale] {
                let ids: Vec<SynapseId> = pairs
                    .iter()
                    .map(|(pre, post)| SynapseId::new(*scale, c1_layer.label(), *pre, *post))
                    .collect();
                let list = ids
                    .iter()
                    .map(|id| {
                        let weight = match spec.initial_weights {
                            Some(initial) => initial[prototype].get(id).unwrap_or_default(),
                            None => rng.gen_range(low..=high),
                        };
                        (id.pre, id.post, weight)
                    })
                    .collect();
                let connections = sim.connect(
                    c1_layer.population(),
                    population,
                    ConnectionPattern::FromList(list),
                    dynamics,
                )?;
                synapses.extend(ids.into_iter().zip(connections));
            }

            debug!(
                target: "hmax-bdu",
                "Prototype {} scale {}: S2 {} over C1 {}",
                prototype, scale, s2_shape, c1_shape
            );
            by_scale.entry(*scale).or_default().push(s2_layer);
        }
    }

    let layers = S2Layers {
        feature_size,
        by_scale,
        registry,
    };
    info!(
        target: "hmax-bdu",
        "Created {} S2 layers ({} prototypes, feature size {}, {} connections, {})",
        layers.layers().count(),
        layers.prototype_count(),
        feature_size,
        layers.connection_count(),
        if spec.plasticity.is_some() { "plastic" } else { "static" }
    );
    Ok(layers)
}
