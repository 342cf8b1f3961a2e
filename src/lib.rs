// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # HMAX - spiking S2/C2 feature learning
//!
//! A spiking rendition of the HMAX visual hierarchy. Pre-computed C1 spike
//! trains drive plastic S2 prototype layers that learn with STDP; C2 pools
//! each prototype over positions and scales, and a linear SVM classifies
//! the resulting C2 response vectors.
//!
//! ## Pipelines
//!
//! - [`training`]: build C1 + plastic S2, present every image of a C1 dump,
//!   checkpoint the weights periodically and dump them on fatal signals.
//! - [`classification`]: rebuild a static network from the checkpointed
//!   weights and score every checkpoint with a linear SVM.
//!
//! Both binaries (`hmax-s2-train`, `hmax-c2-classify`) are thin wrappers
//! over these modules.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hmax::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HmaxConfig::default();
//! let dump = load_c1_dump("c1_spikes.bin")?;
//! let plan = TrainingPlan::from_config(&config, "faces", 100, &dump)?;
//!
//! let mut sim = ReferenceSimulator::new();
//! let layers = build_training_network(&mut sim, &dump, &plan, None)?;
//! let role = CoordinationRole::single_process();
//! let mut manager = WeightLifecycleManager::new(role, CheckpointPolicy::default(), plan.prototype_count, None);
//! let weights = train(&mut sim, role, &layers, &plan, &mut manager)?;
//! println!("learned {} prototypes", weights.prototype_count());
//! # Ok(())
//! # }
//! ```

mod error;

pub mod classification;
pub mod dataset;
pub mod training;

pub use error::{PipelineError, PipelineResult};

// Re-export foundation
pub use hmax_config as config;
pub use hmax_observability as observability;
pub use hmax_structures as structures;

// Re-export the simulator collaborator and algorithms
pub use hmax_brain_development as bdu;
pub use hmax_plasticity as plasticity;
pub use hmax_simulator as simulator;

// Re-export I/O layer
pub use hmax_classifier as classifier;
pub use hmax_serialization as serialization;
pub use hmax_visualization as visualization;

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::classification::{
        build_validation_network, collect_responses, evaluate_snapshot, ClassificationPlan,
        EpochEvaluation, LabeledDump,
    };
    pub use crate::training::{
        build_training_network, train, write_reconstructions, RasterPlots, Reconstruction,
        TrainingPlan,
    };
    pub use crate::{PipelineError, PipelineResult};

    pub use crate::bdu::{LayerCollection, Stage};
    pub use crate::classifier::{load_labels, Classifier, LinearSvm};
    pub use crate::config::{load_config_or_default, HmaxConfig};
    pub use crate::plasticity::{
        install_fatal_signal_hook, CheckpointPolicy, EmergencyDump, WeightLifecycleManager,
    };
    pub use crate::serialization::{load_c1_dump, load_weight_checkpoints, WeightCheckpointWriter};
    pub use crate::simulator::{CoordinationRole, PoolingOp, ReferenceSimulator, Simulator};
    pub use crate::structures::{C1SpikeDump, WeightSnapshot};
}
