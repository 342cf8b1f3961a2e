// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Moving S2 weights between the simulator and [`PrototypeWeights`].
//!
//! Both directions go through the connection registry returned by
//! `build_s2`, so no lookup scans the simulator. Call these only between
//! `run`s; the `&mut` borrow in [`apply`] rules out concurrent mutation.

use crate::{PlasticityError, PlasticityResult};
use hmax_brain_development::S2Layers;
use hmax_simulator::{ConnectionId, Simulator};
use hmax_structures::{PrototypeWeights, SynapseId};
use std::collections::BTreeMap;
use tracing::{debug, trace};

fn registry(s2: &S2Layers, prototype: usize) -> PlasticityResult<&BTreeMap<SynapseId, ConnectionId>> {
    s2.registry(prototype)
        .ok_or(PlasticityError::PrototypeOutOfRange {
            prototype,
            count: s2.prototype_count(),
        })
}

/// Read the current weights of the first `prototype_count` prototypes
pub fn extract<S: Simulator + ?Sized>(
    sim: &S,
    s2: &S2Layers,
    prototype_count: usize,
) -> PlasticityResult<Vec<PrototypeWeights>> {
    let mut all = Vec::with_capacity(prototype_count);
    for prototype in 0..prototype_count {
        let weights = registry(s2, prototype)?
            .iter()
            .map(|(id, connection)| Ok((id.clone(), sim.read_weight(*connection)?)))
            .collect::<PlasticityResult<PrototypeWeights>>()?;
        trace!(target: "hmax-plasticity", "Prototype {}: read {} weights", prototype, weights.len());
        all.push(weights);
    }
    debug!(target: "hmax-plasticity", "Extracted weights of {} prototypes", all.len());
    Ok(all)
}

/// Overwrite every connection of `prototype` with `weights`.
///
/// `weights` must name exactly the prototype's connections. Keys are checked
/// before the first write, so a failed apply leaves the simulator untouched.
pub fn apply<S: Simulator + ?Sized>(
    sim: &mut S,
    s2: &S2Layers,
    prototype: usize,
    weights: &PrototypeWeights,
) -> PlasticityResult<()> {
    let connections = registry(s2, prototype)?;

    let mut writes = Vec::with_capacity(weights.len());
    for (id, weight) in weights.iter() {
        let connection = connections
            .get(id)
            .ok_or_else(|| PlasticityError::UnknownSynapse {
                prototype,
                synapse: id.to_string(),
            })?;
        writes.push((*connection, weight));
    }
    if writes.len() != connections.len() {
        if let Some(id) = connections.keys().find(|id| !weights.contains(id)) {
            return Err(PlasticityError::MissingWeights {
                prototype,
                synapse: id.to_string(),
            });
        }
    }

    for (connection, weight) in writes {
        sim.write_weight(connection, weight)?;
    }
    debug!(target: "hmax-plasticity", "Prototype {}: applied {} weights", prototype, weights.len());
    Ok(())
}
