// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
C1 spike-source layers built from a spike dump.
*/

use crate::{BduError, BduResult, Layer, LayerIndex};
use hmax_simulator::{RecordSignal, Simulator, UnitModel};
use hmax_structures::{C1SpikeDump, LayerShape};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// The C1 stage: layers per scale, in dump order, plus their `(scale, label)` index
#[derive(Debug, Clone)]
pub struct C1Layers {
    by_scale: BTreeMap<u32, Vec<Layer>>,
    index: LayerIndex,
}

impl C1Layers {
    pub fn scales(&self) -> &BTreeMap<u32, Vec<Layer>> {
        &self.by_scale
    }

    pub fn index(&self) -> &LayerIndex {
        &self.index
    }

    /// The shared C1 grid of every scale
    pub fn shapes(&self) -> BTreeMap<u32, LayerShape> {
        self.by_scale
            .iter()
            .filter_map(|(scale, layers)| layers.first().map(|l| (*scale, l.shape())))
            .collect()
    }

    pub fn layer_count(&self) -> usize {
        self.index.len()
    }

    pub fn layers(&self) -> impl Iterator<Item = (u32, &Layer)> {
        self.by_scale
            .iter()
            .flat_map(|(scale, layers)| layers.iter().map(move |l| (*scale, l)))
    }
}

fn check_unique_labels(dump: &C1SpikeDump) -> BduResult<()> {
    for (scale, records) in &dump.scales {
        let mut seen = BTreeSet::new();
        for record in records {
            if !seen.insert(record.label.as_str()) {
                return Err(BduError::DuplicateLabel {
                    scale: *scale,
                    label: record.label.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Create one spike-source population per C1 layer of the dump and load its spike trains
pub fn build_c1_layers<S: Simulator + ?Sized>(
    sim: &mut S,
    dump: &C1SpikeDump,
) -> BduResult<C1Layers> {
    dump.validate()?;
    check_unique_labels(dump)?;
    if dump.is_empty() {
        return Err(BduError::InvalidParameter("C1 dump holds no layers".to_string()));
    }

    let mut by_scale = BTreeMap::new();
    let mut index = LayerIndex::new();
    for (scale, records) in &dump.scales {
        let mut layers = Vec::with_capacity(records.len());
        for record in records {
            let population =
                sim.create_population(record.shape.unit_count(), UnitModel::SpikeSource, &record.label)?;
            sim.set_spike_times(population, &record.spiketrains)?;
            let layer = Layer::new(&*sim, population, record.shape, record.label.clone())?;
            index.insert(*scale, layer.clone())?;
            layers.push(layer);
        }
        debug!(target: "hmax-bdu", "Scale {}: {} C1 layers of {}", scale, layers.len(), records[0].shape);
        by_scale.insert(*scale, layers);
    }

    info!(target: "hmax-bdu", "Created {} C1 layers over {} scales", index.len(), by_scale.len());
    Ok(C1Layers { by_scale, index })
}

/// Replace the spike trains of existing C1 layers with those of `dump`.
///
/// Every record must name a known `(scale, label)` with the same shape; this
/// is checked for all records before any spike train is replaced.
pub fn set_c1_spiketrains<S: Simulator + ?Sized>(
    sim: &mut S,
    c1: &C1Layers,
    dump: &C1SpikeDump,
) -> BduResult<()> {
    dump.validate()?;

    let mut targets = Vec::with_capacity(dump.layer_count());
    for (scale, records) in &dump.scales {
        for record in records {
            let layer = c1.index().get(*scale, &record.label)?;
            if layer.shape() != record.shape {
                return Err(BduError::ShapeMismatch {
                    scale: *scale,
                    reason: format!(
                        "layer '{}' is {} but the dump holds {}",
                        record.label,
                        layer.shape(),
                        record.shape
                    ),
                });
            }
            targets.push((layer.population(), &record.spiketrains));
        }
    }

    for (population, trains) in targets {
        sim.set_spike_times(population, trains)?;
    }
    debug!(target: "hmax-bdu", "Replaced spike trains of {} C1 layers", dump.layer_count());
    Ok(())
}

/// Record spikes on every C1 layer
pub fn record_c1_spikes<S: Simulator + ?Sized>(sim: &mut S, c1: &C1Layers) -> BduResult<()> {
    for (_, layer) in c1.layers() {
        sim.record(layer.population(), &[RecordSignal::Spikes])?;
    }
    Ok(())
}
