// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # HMAX Plasticity
//!
//! Everything that happens to learned S2 weights outside the simulator's
//! own update rule.
//!
//! ## Architecture
//! - **stdp**: STDP parameters from configuration, validated
//! - **lifecycle**: [`extract`] and [`apply`] through the S2 connection registry
//! - **policy**: when periodic checkpoints are due
//! - **emergency**: [`EmergencyDump`], the pre-encoded record the fatal-signal hook writes
//! - **signals**: installs and removes the fatal-signal hook
//! - **manager**: [`WeightLifecycleManager`], checkpoint cadence of a training run
//!
//! The simulator owns the STDP numerics; this crate only moves weights in
//! and out of it.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod emergency;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod policy;
pub mod signals;
pub mod stdp;

pub use emergency::{DumpOutcome, EmergencyDump};
pub use error::{PlasticityError, PlasticityResult};
pub use lifecycle::{apply, extract};
pub use manager::WeightLifecycleManager;
pub use policy::CheckpointPolicy;
pub use signals::{install_fatal_signal_hook, FatalSignalGuard, FATAL_SIGNALS};
pub use stdp::{stdp_params, validate_stdp_params};
