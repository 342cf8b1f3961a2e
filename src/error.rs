// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use hmax_brain_development::{BduError, Stage};
use hmax_classifier::ClassifierError;
use hmax_plasticity::PlasticityError;
use hmax_serialization::SerializationError;
use hmax_simulator::SimulatorError;
use hmax_structures::StructureError;
use hmax_visualization::VisualizationError;

/// Errors of the training and classification pipelines
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("The {0} stage has not been built")]
    MissingStage(Stage),

    #[error("Weight checkpoint holds no snapshots")]
    NoSnapshots,

    #[error("Cannot infer the feature size from the weights of epoch {epoch}")]
    FeatureSizeUnknown { epoch: u64 },

    #[error("Snapshot of epoch {epoch} holds {actual} prototypes, the network has {expected}")]
    PrototypeCount {
        epoch: u64,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Topology(#[from] BduError),

    #[error(transparent)]
    Plasticity(#[from] PlasticityError),

    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Visualization(#[from] VisualizationError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
