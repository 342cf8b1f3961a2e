// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
C2 pooling: one single-unit pooling population per prototype, fed
all-to-all by every S2 layer of that prototype across all scales.
*/

use crate::{BduError, BduResult, Layer, S2Layers};
use hmax_simulator::{
    ConnectionPattern, PoolingOp, RecordSignal, Simulator, SynapseDynamics, UnitModel,
};
use hmax_structures::LayerShape;
use tracing::info;

/// The C2 stage, one layer per prototype
#[derive(Debug, Clone)]
pub struct C2Layers {
    layers: Vec<Layer>,
    op: PoolingOp,
}

impl C2Layers {
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn pooling(&self) -> PoolingOp {
        self.op
    }

    /// One spike count per prototype for the trial just run, then clear the recordings
    pub fn response_vector<S: Simulator + ?Sized>(&self, sim: &mut S) -> BduResult<Vec<u64>> {
        let mut responses = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let counts = sim.spike_counts(layer.population())?;
            responses.push(counts.values().sum());
        }
        for layer in &self.layers {
            sim.clear_recordings(layer.population())?;
        }
        Ok(responses)
    }
}

/// Build and start recording the C2 stage
pub fn build_c2<S: Simulator + ?Sized>(
    sim: &mut S,
    s2: &S2Layers,
    prototype_count: usize,
    op: PoolingOp,
) -> BduResult<C2Layers> {
    if prototype_count != s2.prototype_count() {
        return Err(BduError::InvalidParameter(format!(
            "C2 for {} prototypes requested over S2 with {}",
            prototype_count,
            s2.prototype_count()
        )));
    }

    let mut layers = Vec::with_capacity(prototype_count);
    for prototype in 0..prototype_count {
        let label = format!("C2_p{}", prototype);
        let population = sim.create_population(1, UnitModel::Pooling(op), &label)?;
        for (_, s2_layer) in s2.layers_for_prototype(prototype) {
            sim.connect(
                s2_layer.population(),
                population,
                ConnectionPattern::AllToAll { weight: 1.0 },
                SynapseDynamics::Static,
            )?;
        }
        sim.record(population, &[RecordSignal::Spikes])?;
        layers.push(Layer::new(&*sim, population, LayerShape::new(1, 1), label)?);
    }

    info!(target: "hmax-bdu", "Created {} C2 {}-pooling layers", layers.len(), op);
    Ok(C2Layers { layers, op })
}
