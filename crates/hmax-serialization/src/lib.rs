// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # HMAX Serialization
//!
//! File formats that cross the training / validation process boundary.
//!
//! - **Weight checkpoints**: an append-only sequence of
//!   [`WeightSnapshot`](hmax_structures::WeightSnapshot) records, oldest first.
//!   Committed records are never rewritten; a torn final record is dropped
//!   on load.
//! - **C1 spike dumps**: one [`C1SpikeDump`](hmax_structures::C1SpikeDump) per file.
//!
//! Both share a header (`magic | version | flags`) and a record framing
//! (`length | checksum | payload`); payloads are bincode, optionally LZ4
//! compressed.
//!
//! ## Usage
//! ```ignore
//! use hmax_serialization::{load_weight_checkpoints, WeightCheckpointWriter};
//!
//! let mut writer = WeightCheckpointWriter::open("weights.hmaxw")?;
//! writer.append(&snapshot)?;
//! let history = load_weight_checkpoints("weights.hmaxw")?;
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod c1_dump;
mod error;
mod format;
mod weights;

pub use c1_dump::{load_c1_dump, save_c1_dump};
pub use error::{Result, SerializationError};
pub use format::{default_flags, FLAG_LZ4, FORMAT_VERSION};
pub use weights::{encode_record, load_weight_checkpoints, EncodedSnapshot, WeightCheckpointWriter};
