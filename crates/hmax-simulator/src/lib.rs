// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # hmax-simulator
//!
//! The narrow interface through which the HMAX builders drive a spiking
//! network simulator.
//!
//! ## Architecture
//!
//! - **traits**: the [`Simulator`] trait (populations, connections, runs, recordings, weights)
//! - **std_impl**: [`ReferenceSimulator`], a deterministic in-process spike-count
//!   propagation backend used by the drivers and tests
//! - **coordination**: [`CoordinationRole`], resolved once per process
//!
//! The reference backend does not model membrane dynamics. Each run window
//! turns presynaptic spike counts into postsynaptic spike counts, population
//! by population in creation order.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod coordination;
pub mod error;
pub mod std_impl;
pub mod traits;
pub mod types;

pub use coordination::CoordinationRole;
pub use error::{SimulatorError, SimulatorResult};
pub use std_impl::ReferenceSimulator;
pub use traits::Simulator;
pub use types::{
    ConnectionId, ConnectionPattern, PoolingOp, PopulationId, RecordSignal, StdpParams,
    SynapseDynamics, UnitModel,
};
