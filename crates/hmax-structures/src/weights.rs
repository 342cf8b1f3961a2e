// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Learned S2 weights and their checkpoint representation

use crate::{LayerShape, StructureError, StructureResult, SynapseId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Synaptic weight as exchanged with the simulator
pub type Weight = f32;

/// Weights of every instantiated connection of one S2 prototype, across all scales.
///
/// A missing key means the connection does not exist; it never means zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrototypeWeights {
    weights: BTreeMap<SynapseId, Weight>,
}

impl PrototypeWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, synapse: SynapseId, weight: Weight) -> Option<Weight> {
        self.weights.insert(synapse, weight)
    }

    pub fn get(&self, synapse: &SynapseId) -> Option<Weight> {
        self.weights.get(synapse).copied()
    }

    pub fn contains(&self, synapse: &SynapseId) -> bool {
        self.weights.contains_key(synapse)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SynapseId, Weight)> {
        self.weights.iter().map(|(id, w)| (id, *w))
    }

    pub fn keys(&self) -> impl Iterator<Item = &SynapseId> {
        self.weights.keys()
    }

    /// Fold the weights back onto the `feature_size x feature_size` receptive field.
    ///
    /// Every connection contributes to the kernel cell given by its offset inside
    /// the receptive field of its postsynaptic unit; each cell holds the mean over
    /// all positions and scales. `c1_shapes` maps each scale to its C1 grid.
    pub fn kernel(
        &self,
        feature_size: usize,
        c1_shapes: &BTreeMap<u32, LayerShape>,
    ) -> StructureResult<FeatureKernel> {
        let cells = feature_size * feature_size;
        let mut sums: BTreeMap<&str, (Vec<f64>, Vec<u32>)> = BTreeMap::new();

        for (id, weight) in self.iter() {
            let c1 = *c1_shapes
                .get(&id.scale)
                .ok_or(StructureError::UnknownScale(id.scale))?;
            let outside = || StructureError::OutsideReceptiveField {
                synapse: id.to_string(),
                feature_size,
            };
            if !c1.fits(feature_size) {
                return Err(outside());
            }
            let s2_cols = c1.cols - feature_size + 1;
            let (pre_row, pre_col) = c1.position_of(id.pre as usize);
            let (post_row, post_col) = (id.post as usize / s2_cols, id.post as usize % s2_cols);
            let dr = pre_row.checked_sub(post_row).filter(|d| *d < feature_size);
            let dc = pre_col.checked_sub(post_col).filter(|d| *d < feature_size);
            let (dr, dc) = match (dr, dc) {
                (Some(dr), Some(dc)) => (dr, dc),
                _ => return Err(outside()),
            };

            let (sum, count) = sums
                .entry(id.source.as_str())
                .or_insert_with(|| (vec![0.0; cells], vec![0; cells]));
            sum[dr * feature_size + dc] += f64::from(weight);
            count[dr * feature_size + dc] += 1;
        }

        let by_label = sums
            .into_iter()
            .map(|(label, (sum, count))| {
                let mean = sum
                    .iter()
                    .zip(count.iter())
                    .map(|(s, n)| if *n == 0 { 0.0 } else { (s / f64::from(*n)) as Weight })
                    .collect();
                (label.to_string(), mean)
            })
            .collect();

        Ok(FeatureKernel {
            feature_size,
            by_label,
        })
    }
}

impl FromIterator<(SynapseId, Weight)> for PrototypeWeights {
    fn from_iter<I: IntoIterator<Item = (SynapseId, Weight)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

/// The S2 weights of all prototypes at one checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot {
    /// Checkpoint epoch (number of training images presented so far)
    pub epoch: u64,
    /// Indexed by prototype
    pub weights_by_prototype: Vec<PrototypeWeights>,
}

impl WeightSnapshot {
    pub fn new(epoch: u64, weights_by_prototype: Vec<PrototypeWeights>) -> Self {
        Self {
            epoch,
            weights_by_prototype,
        }
    }

    pub fn prototype_count(&self) -> usize {
        self.weights_by_prototype.len()
    }

    /// Recover the receptive-field extent the weights were trained with.
    ///
    /// The first S2 unit of a layer sees a full `feature_size x feature_size`
    /// window of every C1 layer, so counting its inputs from one C1 layer
    /// yields `feature_size²`.
    pub fn infer_feature_size(&self) -> Option<usize> {
        let prototype = self.weights_by_prototype.first()?;
        let first = prototype.keys().next()?;
        let inputs = prototype
            .keys()
            .filter(|id| id.scale == first.scale && id.source == first.source && id.post == 0)
            .count();
        let size = (inputs as f64).sqrt().round() as usize;
        (size > 0 && size * size == inputs).then_some(size)
    }
}

/// A prototype's weights laid out on its receptive field, one
/// row-major `feature_size²` vector per C1 layer label.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureKernel {
    feature_size: usize,
    by_label: BTreeMap<String, Vec<Weight>>,
}

impl FeatureKernel {
    /// Build a kernel directly. Every vector must hold `feature_size²` weights.
    pub fn new(feature_size: usize, by_label: BTreeMap<String, Vec<Weight>>) -> Option<Self> {
        let cells = feature_size * feature_size;
        by_label
            .values()
            .all(|w| w.len() == cells)
            .then_some(Self {
                feature_size,
                by_label,
            })
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    pub fn weights(&self, label: &str) -> Option<&[Weight]> {
        self.by_label.get(label).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Weight])> {
        self.by_label.iter().map(|(l, w)| (l.as_str(), w.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    /// Multiply every weight by `factor`
    pub fn scaled(&self, factor: Weight) -> Self {
        Self {
            feature_size: self.feature_size,
            by_label: self
                .by_label
                .iter()
                .map(|(l, w)| (l.clone(), w.iter().map(|x| x * factor).collect()))
                .collect(),
        }
    }
}
