// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pre-computed C1 spike trains

use crate::{LayerShape, StructureError, StructureResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One C1 layer as stored in the spike dump: its grid, its orientation
/// label and one spike train (times in ms, per training image concatenated)
/// per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct C1LayerRecord {
    pub shape: LayerShape,
    pub label: String,
    pub spiketrains: Vec<Vec<f64>>,
}

impl C1LayerRecord {
    pub fn new(shape: LayerShape, label: impl Into<String>, spiketrains: Vec<Vec<f64>>) -> Self {
        Self {
            shape,
            label: label.into(),
            spiketrains,
        }
    }

    /// Check the record's own invariants: non-empty grid, one train per unit
    pub fn validate(&self) -> StructureResult<()> {
        if self.shape.is_empty() {
            return Err(StructureError::InvalidShape(self.shape));
        }
        if self.spiketrains.len() != self.shape.unit_count() {
            return Err(StructureError::SpikeTrainCount {
                label: self.label.clone(),
                shape: self.shape,
                expected: self.shape.unit_count(),
                actual: self.spiketrains.len(),
            });
        }
        Ok(())
    }

    pub fn spike_count(&self) -> usize {
        self.spiketrains.iter().map(Vec::len).sum()
    }
}

/// The full C1 spike dump, keyed by scale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct C1SpikeDump {
    pub scales: BTreeMap<u32, Vec<C1LayerRecord>>,
}

impl C1SpikeDump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_layer(&mut self, scale: u32, record: C1LayerRecord) {
        self.scales.entry(scale).or_default().push(record);
    }

    /// Scales in ascending order
    pub fn scale_keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.scales.keys().copied()
    }

    pub fn layer_count(&self) -> usize {
        self.scales.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layer_count() == 0
    }

    /// Validate every record and require all layers of a scale to share a shape
    pub fn validate(&self) -> StructureResult<()> {
        for (scale, layers) in &self.scales {
            let Some(first) = layers.first() else {
                continue;
            };
            for layer in layers {
                layer.validate()?;
                if layer.shape != first.shape {
                    return Err(StructureError::InconsistentScale {
                        scale: *scale,
                        first: first.label.clone(),
                        first_shape: first.shape,
                        other: layer.label.clone(),
                        other_shape: layer.shape,
                    });
                }
            }
        }
        Ok(())
    }

    /// The C1 grid of every scale that has at least one layer
    pub fn shapes(&self) -> BTreeMap<u32, LayerShape> {
        self.scales
            .iter()
            .filter_map(|(scale, layers)| layers.first().map(|l| (*scale, l.shape)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &str, rows: usize, cols: usize) -> C1LayerRecord {
        C1LayerRecord::new(
            LayerShape::new(rows, cols),
            label,
            vec![vec![1.0, 51.0]; rows * cols],
        )
    }

    #[test]
    fn test_valid_dump() {
        let mut dump = C1SpikeDump::new();
        dump.insert_layer(7, record("0", 4, 4));
        dump.insert_layer(7, record("45", 4, 4));
        dump.insert_layer(9, record("0", 3, 3));

        dump.validate().unwrap();
        assert_eq!(dump.layer_count(), 3);
        assert_eq!(dump.scale_keys().collect::<Vec<_>>(), vec![7, 9]);
        assert_eq!(dump.shapes()[&9], LayerShape::new(3, 3));
    }

    #[test]
    fn test_spike_train_count_mismatch() {
        let mut bad = record("0", 4, 4);
        bad.spiketrains.pop();
        let err = bad.validate().unwrap_err();
        assert!(matches!(err, StructureError::SpikeTrainCount { expected: 16, actual: 15, .. }));
    }

    #[test]
    fn test_inconsistent_scale() {
        let mut dump = C1SpikeDump::new();
        dump.insert_layer(7, record("0", 4, 4));
        dump.insert_layer(7, record("90", 4, 5));
        assert!(matches!(
            dump.validate(),
            Err(StructureError::InconsistentScale { scale: 7, .. })
        ));
    }

    #[test]
    fn test_empty_shape_rejected() {
        let empty = C1LayerRecord::new(LayerShape::new(0, 4), "0", vec![]);
        assert!(matches!(empty.validate(), Err(StructureError::InvalidShape(_))));
    }
}
