// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Structure-of-arrays connection store

use crate::{StdpParams, SynapseDynamics};
use ahash::AHashMap;
use rayon::prelude::*;

/// All connections of a network, one entry per index
#[derive(Debug, Default)]
pub struct ConnectionArray {
    /// Source population ids
    pub source_populations: Vec<u32>,

    /// Target population ids
    pub target_populations: Vec<u32>,

    /// Presynaptic unit index inside the source population
    pub pre_units: Vec<u32>,

    /// Postsynaptic unit index inside the target population
    pub post_units: Vec<u32>,

    pub weights: Vec<f32>,

    /// `None` for static connections
    pub plasticity: Vec<Option<StdpParams>>,

    /// Target population -> connection indices, for drive accumulation
    pub target_index: AHashMap<u32, Vec<usize>>,
}

impl ConnectionArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Append one connection and return its index
    pub fn push(
        &mut self,
        source: u32,
        target: u32,
        pre: u32,
        post: u32,
        weight: f32,
        dynamics: SynapseDynamics,
    ) -> usize {
        let idx = self.weights.len();
        self.source_populations.push(source);
        self.target_populations.push(target);
        self.pre_units.push(pre);
        self.post_units.push(post);
        self.weights.push(weight);
        self.plasticity.push(match dynamics {
            SynapseDynamics::Static => None,
            SynapseDynamics::Stdp(params) => Some(params),
        });
        self.target_index.entry(target).or_default().push(idx);
        idx
    }

    /// Connection indices ending in `target`
    pub fn incoming(&self, target: u32) -> &[usize] {
        self.target_index
            .get(&target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Weighted input per unit of `target`, given the window spike counts of
    /// every population (indexed by population id).
    pub fn accumulate_drive(&self, target: u32, size: usize, counts: &[Vec<u64>]) -> Vec<f64> {
        self.incoming(target)
            .par_iter()
            .fold(
                || vec![0.0f64; size],
                |mut drive, &idx| {
                    let pre_count = counts[self.source_populations[idx] as usize]
                        [self.pre_units[idx] as usize];
                    drive[self.post_units[idx] as usize] +=
                        f64::from(self.weights[idx]) * pre_count as f64;
                    drive
                },
            )
            .reduce(
                || vec![0.0f64; size],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    a
                },
            )
    }

    /// Presynaptic spike counts seen by each unit of `target`, reduced with `reduce`
    pub fn pool_counts(
        &self,
        target: u32,
        size: usize,
        counts: &[Vec<u64>],
        reduce: fn(u64, u64) -> u64,
    ) -> Vec<u64> {
        let mut pooled = vec![0u64; size];
        for &idx in self.incoming(target) {
            let pre_count =
                counts[self.source_populations[idx] as usize][self.pre_units[idx] as usize];
            let post = self.post_units[idx] as usize;
            pooled[post] = reduce(pooled[post], pre_count);
        }
        pooled
    }

    /// Activity-gated weight update for plastic connections.
    ///
    /// A connection changes only when its postsynaptic unit fired in the
    /// window: `+a_plus` if the presynaptic unit fired too, `-a_minus`
    /// otherwise, scaled by the learning rate and clamped to `[w_min, w_max]`.
    /// Returns the number of connections whose weight changed.
    pub fn apply_plasticity(&mut self, counts: &[Vec<u64>]) -> usize {
        let sources = &self.source_populations;
        let targets = &self.target_populations;
        let pres = &self.pre_units;
        let posts = &self.post_units;

        self.weights
            .par_iter_mut()
            .zip(self.plasticity.par_iter())
            .enumerate()
            .filter_map(|(idx, (weight, params))| params.as_ref().map(|p| (idx, weight, p)))
            .map(|(idx, weight, params)| {
                let post_active = counts[targets[idx] as usize][posts[idx] as usize] > 0;
                if !post_active {
                    return 0;
                }
                let pre_active = counts[sources[idx] as usize][pres[idx] as usize] > 0;
                let delta = if pre_active {
                    params.a_plus
                } else {
                    -params.a_minus
                };
                let updated =
                    (*weight + params.learning_rate * delta).clamp(params.w_min, params.w_max);
                let changed = updated != *weight;
                *weight = updated;
                usize::from(changed)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stdp() -> SynapseDynamics {
        SynapseDynamics::Stdp(StdpParams::default())
    }

    #[test]
    fn test_accumulate_drive() {
        let mut conns = ConnectionArray::new();
        conns.push(0, 1, 0, 0, 0.5, SynapseDynamics::Static);
        conns.push(0, 1, 1, 0, 0.25, SynapseDynamics::Static);
        conns.push(0, 1, 1, 1, 1.0, SynapseDynamics::Static);

        let counts = vec![vec![2, 4], vec![0, 0]];
        let drive = conns.accumulate_drive(1, 2, &counts);
        assert_eq!(drive, vec![2.0, 4.0]);
    }

    #[test]
    fn test_pool_counts_max() {
        let mut conns = ConnectionArray::new();
        for pre in 0..3 {
            conns.push(0, 1, pre, 0, 1.0, SynapseDynamics::Static);
        }
        let counts = vec![vec![1, 7, 3], vec![0]];
        assert_eq!(conns.pool_counts(1, 1, &counts, u64::max), vec![7]);
        assert_eq!(
            conns.pool_counts(1, 1, &counts, |a, b| a + b),
            vec![11]
        );
    }

    #[test]
    fn test_plasticity_gated_by_post_activity() {
        let mut conns = ConnectionArray::new();
        conns.push(0, 1, 0, 0, 0.5, stdp()); // pre active, post active
        conns.push(0, 1, 1, 0, 0.5, stdp()); // pre silent, post active
        conns.push(0, 1, 0, 1, 0.5, stdp()); // post silent
        conns.push(0, 1, 0, 0, 0.5, SynapseDynamics::Static);

        let counts = vec![vec![1, 0], vec![1, 0]];
        let changed = conns.apply_plasticity(&counts);

        assert_eq!(changed, 2);
        assert!((conns.weights[0] - 0.51).abs() < 1e-6);
        assert!((conns.weights[1] - 0.488).abs() < 1e-6);
        assert_eq!(conns.weights[2], 0.5);
        assert_eq!(conns.weights[3], 0.5);
    }

    #[test]
    fn test_plasticity_clamps_to_bounds() {
        let mut conns = ConnectionArray::new();
        conns.push(0, 1, 0, 0, 1.0, stdp());
        conns.push(0, 1, 1, 0, 0.0, stdp());

        let counts = vec![vec![1, 0], vec![1]];
        let changed = conns.apply_plasticity(&counts);

        assert_eq!(changed, 0);
        assert_eq!(conns.weights, vec![1.0, 0.0]);
    }
}
