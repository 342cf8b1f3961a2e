// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # HMAX Classifier
//!
//! Classifies C2 response vectors.
//!
//! - [`SampleMatrix`]: one feature vector per image, positionally paired with its label
//! - [`Classifier`]: fit / predict over string labels; [`LinearSvm`] implements it
//! - [`ClassificationReport`] and [`ConfusionMatrix`]: per-epoch evaluation output
//! - [`load_labels`]: newline-delimited label files

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod error;
pub mod metrics;
pub mod samples;
pub mod svm;

pub use error::{ClassifierError, ClassifierResult};
pub use metrics::{ClassificationReport, ClassReport, ConfusionMatrix};
pub use samples::{load_labels, SampleMatrix};
pub use svm::{Classifier, LinearSvm};
