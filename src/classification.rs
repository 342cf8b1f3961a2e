// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! C2 classification of checkpointed S2 weights.
//!
//! The network is built once, static, from the shape of the training dump
//! and the last snapshot. Each snapshot is then applied in turn; the
//! training and validation dumps are replayed to collect one C2 response
//! vector per image, and a linear SVM fitted on the training responses is
//! scored on the validation ones.

use crate::{PipelineError, PipelineResult};
use hmax_brain_development::{
    build_c1_layers, build_c2, build_s2, set_c1_spiketrains, C1Layers, C2Layers, LayerCollection,
    S2BuildSpec, Stage, WeightInit,
};
use hmax_classifier::{ClassificationReport, Classifier, ConfusionMatrix, LinearSvm, SampleMatrix};
use hmax_config::HmaxConfig;
use hmax_plasticity::apply;
use hmax_simulator::{PoolingOp, Simulator, UnitModel};
use hmax_structures::{C1SpikeDump, WeightSnapshot};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ClassificationPlan {
    pub sim_time_ms: f64,
    pub unit_model: UnitModel,
    pub pooling: PoolingOp,
    pub svm: LinearSvm,
}

impl ClassificationPlan {
    pub fn from_config(config: &HmaxConfig) -> PipelineResult<Self> {
        Ok(Self {
            sim_time_ms: config.simulation.sim_time_ms,
            unit_model: UnitModel::IntegrateAndFire {
                threshold: config.s2.threshold,
                refractory_ms: config.s2.refractory_ms,
            },
            pooling: config.c2.pooling.parse()?,
            svm: LinearSvm::new(
                config.classifier.c,
                config.classifier.epochs,
                config.classifier.learning_rate,
            ),
        })
    }
}

/// A C1 dump with the class label of each of its images
#[derive(Debug, Clone, Copy)]
pub struct LabeledDump<'a> {
    pub dump: &'a C1SpikeDump,
    pub labels: &'a [String],
    pub image_count: usize,
}

/// Build static C1/S2/C2 sized by the last snapshot of `snapshots`.
///
/// The feature size is recovered from the weights and the prototype count
/// from the number of prototypes in the snapshot.
pub fn build_validation_network<S: Simulator + ?Sized>(
    sim: &mut S,
    training: &C1SpikeDump,
    snapshots: &[WeightSnapshot],
    plan: &ClassificationPlan,
) -> PipelineResult<LayerCollection> {
    let last = snapshots.last().ok_or(PipelineError::NoSnapshots)?;
    let feature_size = last
        .infer_feature_size()
        .ok_or(PipelineError::FeatureSizeUnknown { epoch: last.epoch })?;
    let prototype_count = last.prototype_count();
    info!(
        target: "hmax-pipeline",
        "Epoch {} weights: feature size {}, {} prototypes",
        last.epoch, feature_size, prototype_count
    );

    let started = Instant::now();
    let c1 = build_c1_layers(sim, training)?;
    let spec = S2BuildSpec {
        feature_size,
        prototype_count,
        unit_model: plan.unit_model,
        plasticity: None,
        initial_weights: Some(&last.weights_by_prototype),
        weight_init: WeightInit::default(),
    };
    let s2 = build_s2(sim, &c1, &spec)?;
    let c2 = build_c2(sim, &s2, prototype_count, plan.pooling)?;
    debug!(target: "hmax-pipeline", "Network creation took {:.2?}", started.elapsed());

    let mut layers = LayerCollection::new(c1);
    layers.attach_s2(s2)?;
    layers.attach_c2(c2)?;
    Ok(layers)
}

/// Replay `dump` from time 0 and collect one C2 response vector per image
pub fn collect_responses<S: Simulator + ?Sized>(
    sim: &mut S,
    c1: &C1Layers,
    c2: &C2Layers,
    dump: &C1SpikeDump,
    image_count: usize,
    sim_time_ms: f64,
) -> PipelineResult<Vec<Vec<u64>>> {
    sim.reset();
    set_c1_spiketrains(sim, c1, dump)?;
    let mut responses = Vec::with_capacity(image_count);
    for image in 0..image_count {
        sim.run(sim_time_ms)?;
        let response = c2.response_vector(sim)?;
        debug!(target: "hmax-pipeline", "Image {}: C2 response {:?}", image, response);
        responses.push(response);
    }
    Ok(responses)
}

/// Classification results of one snapshot
#[derive(Debug, Clone)]
pub struct EpochEvaluation {
    pub epoch: u64,
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
}

impl fmt::Display for EpochEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "Epoch {}", self.epoch)?;
        writeln!(f, "{}", self.report)?;
        writeln!(f, "{}", self.confusion)
    }
}

/// Apply `snapshot`, collect responses for both datasets, fit and score
pub fn evaluate_snapshot<S: Simulator + ?Sized>(
    sim: &mut S,
    layers: &LayerCollection,
    snapshot: &WeightSnapshot,
    training: LabeledDump<'_>,
    validation: LabeledDump<'_>,
    plan: &ClassificationPlan,
) -> PipelineResult<EpochEvaluation> {
    let s2 = layers.s2().ok_or(PipelineError::MissingStage(Stage::S2))?;
    let c2 = layers.c2().ok_or(PipelineError::MissingStage(Stage::C2))?;
    if snapshot.prototype_count() != s2.prototype_count() {
        return Err(PipelineError::PrototypeCount {
            epoch: snapshot.epoch,
            expected: s2.prototype_count(),
            actual: snapshot.prototype_count(),
        });
    }

    info!(target: "hmax-pipeline", "Setting S2 weights to epoch {}", snapshot.epoch);
    for (prototype, weights) in snapshot.weights_by_prototype.iter().enumerate() {
        apply(sim, s2, prototype, weights)?;
    }

    let samples = |sim: &mut S, set: LabeledDump| -> PipelineResult<SampleMatrix> {
        let rows = collect_responses(
            sim,
            layers.c1(),
            c2,
            set.dump,
            set.image_count,
            plan.sim_time_ms,
        )?;
        let samples = SampleMatrix::from_counts(&rows, set.labels.to_vec())?;
        samples.ensure_aligned()?;
        Ok(samples)
    };
    info!(target: "hmax-pipeline", "Extracting data samples for fitting");
    let training = samples(&mut *sim, training)?;
    info!(target: "hmax-pipeline", "Extracting data samples for validation");
    let validation = samples(&mut *sim, validation)?;

    let mut svm = plan.svm.clone();
    svm.fit(&training)?;
    let predicted = svm.predict(validation.features().view())?;

    let evaluation = EpochEvaluation {
        epoch: snapshot.epoch,
        report: ClassificationReport::from_predictions(validation.labels(), &predicted)?,
        confusion: ConfusionMatrix::from_predictions(validation.labels(), &predicted)?,
    };
    info!(
        target: "hmax-pipeline",
        "Epoch {}: validation accuracy {:.3}",
        snapshot.epoch, evaluation.report.accuracy
    );
    Ok(evaluation)
}
