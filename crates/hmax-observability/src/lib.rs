// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # hmax-observability
//!
//! Logging infrastructure shared by the HMAX drivers, with per-crate debug
//! flag support.
//!
//! ## Features
//! - `file-logging`: daily-rolling JSON log files inside a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known HMAX crate names (tracing targets) for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "hmax-pipeline",
    "hmax-config",
    "hmax-simulator",
    "hmax-bdu",
    "hmax-plasticity",
    "hmax-serialization",
    "hmax-visualization",
    "hmax-classifier",
];
