// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# HMAX BDU (Brain Development Utilities)

Builds the layered topology of the HMAX network inside a [`Simulator`]:

- **C1**: one spike-source layer per pre-computed C1 map, grouped by scale
- **S2**: one layer per scale per prototype; every S2 unit sees a
  `feature_size × feature_size` window of every C1 layer of its scale
- **C2**: one pooling unit per prototype over all of that prototype's S2 layers

All validation happens before the simulator is touched, so a failed build
leaves no half-built topology behind.

[`Simulator`]: hmax_simulator::Simulator
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod c1;
pub mod c2;
pub mod collection;
pub mod connectivity;
pub mod layer;
mod rng;
pub mod s2;
pub mod types;

pub use c1::{build_c1_layers, record_c1_spikes, set_c1_spiketrains, C1Layers};
pub use c2::{build_c2, C2Layers};
pub use collection::{LayerCollection, Stage};
pub use connectivity::{s2_grid, window_connections};
pub use layer::{Layer, LayerIndex};
pub use s2::{build_s2, S2BuildSpec, S2Layers, WeightInit};
pub use types::{BduError, BduResult};
