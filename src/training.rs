// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! S2 feature learning over a C1 spike dump.
//!
//! Every image of the dump is one trial of `sim_time_ms`. The dump's spike
//! trains are concatenated in time, so trial `i` sees the spikes in
//! `[i * sim_time_ms, (i + 1) * sim_time_ms)`.

use crate::dataset::{c1_raster_path, dataset_label, reconstruction_path, s2_raster_path};
use crate::{PipelineError, PipelineResult};
use hmax_brain_development::{
    build_c1_layers, build_s2, record_c1_spikes, LayerCollection, S2BuildSpec, S2Layers, Stage,
    WeightInit,
};
use hmax_config::HmaxConfig;
use hmax_plasticity::{stdp_params, WeightLifecycleManager};
use hmax_simulator::{CoordinationRole, PopulationId, RecordSignal, Simulator, StdpParams, UnitModel};
use hmax_structures::{C1SpikeDump, LayerShape, WeightSnapshot};
use hmax_visualization::{reconstruct, save_png, spike_count_raster, FeatureImageDictionary};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where and from what reconstructed prototypes are drawn
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub dictionary: FeatureImageDictionary,
    pub output_dir: PathBuf,
}

/// Which spike-count rasters to write after each trial
#[derive(Debug, Clone)]
pub struct RasterPlots {
    pub output_dir: PathBuf,
    pub c1: bool,
    pub s2: bool,
}

/// Everything a training run needs besides the simulator and the data
#[derive(Debug, Clone)]
pub struct TrainingPlan {
    pub dataset_label: String,
    pub feature_size: usize,
    pub prototype_count: usize,
    pub image_count: u64,
    pub sim_time_ms: f64,
    pub unit_model: UnitModel,
    pub stdp: StdpParams,
    pub weight_init: WeightInit,
    pub plots: Option<RasterPlots>,
    pub reconstruction: Option<Reconstruction>,
}

impl TrainingPlan {
    /// Plan from configuration. Plots and reconstruction start disabled.
    pub fn from_config(
        config: &HmaxConfig,
        dataset: &str,
        image_count: u64,
        dump: &C1SpikeDump,
    ) -> PipelineResult<Self> {
        Ok(Self {
            dataset_label: dataset_label(
                dataset,
                config.s2.feature_size,
                image_count,
                config.simulation.sim_time_ms,
                dump.scale_keys(),
            ),
            feature_size: config.s2.feature_size,
            prototype_count: config.s2.prototype_cells,
            image_count,
            sim_time_ms: config.simulation.sim_time_ms,
            unit_model: UnitModel::IntegrateAndFire {
                threshold: config.s2.threshold,
                refractory_ms: config.s2.refractory_ms,
            },
            stdp: stdp_params(&config.plasticity)?,
            weight_init: WeightInit::Uniform {
                low: config.s2.weight_init_low,
                high: config.s2.weight_init_high,
                seed: config.simulation.seed,
            },
            plots: None,
            reconstruction: None,
        })
    }
}

/// Build C1 from the dump and a plastic S2 over it, and start recording.
///
/// With `initial`, S2 starts from those weights instead of random ones.
pub fn build_training_network<S: Simulator + ?Sized>(
    sim: &mut S,
    dump: &C1SpikeDump,
    plan: &TrainingPlan,
    initial: Option<&WeightSnapshot>,
) -> PipelineResult<LayerCollection> {
    if let Some(snapshot) = initial {
        if snapshot.prototype_count() != plan.prototype_count {
            return Err(PipelineError::PrototypeCount {
                epoch: snapshot.epoch,
                expected: plan.prototype_count,
                actual: snapshot.prototype_count(),
            });
        }
        info!(target: "hmax-pipeline", "Seeding S2 from the weights of epoch {}", snapshot.epoch);
    }

    let started = Instant::now();
    let c1 = build_c1_layers(sim, dump)?;
    debug!(target: "hmax-pipeline", "C1 creation took {:.2?}", started.elapsed());

    let started = Instant::now();
    let spec = S2BuildSpec {
        feature_size: plan.feature_size,
        prototype_count: plan.prototype_count,
        unit_model: plan.unit_model,
        plasticity: Some(plan.stdp),
        initial_weights: initial.map(|s| s.weights_by_prototype.as_slice()),
        weight_init: plan.weight_init,
    };
    let s2 = build_s2(sim, &c1, &spec)?;
    debug!(target: "hmax-pipeline", "S2 creation took {:.2?}", started.elapsed());

    record_c1_spikes(sim, &c1)?;
    s2.record(sim, &[RecordSignal::Spikes, RecordSignal::Voltage])?;

    let mut layers = LayerCollection::new(c1);
    layers.attach_s2(s2)?;
    Ok(layers)
}

fn save_raster<S: Simulator + ?Sized>(
    sim: &mut S,
    population: PopulationId,
    shape: LayerShape,
    path: &Path,
) -> PipelineResult<()> {
    let counts: Vec<u64> = sim.spike_counts(population)?.into_values().collect();
    save_png(&spike_count_raster(shape, &counts)?, path)?;
    sim.clear_recordings(population)?;
    Ok(())
}

/// Per-trial rasters; recordings are cleared so each raster covers one image
fn write_rasters<S: Simulator + ?Sized>(
    sim: &mut S,
    layers: &LayerCollection,
    plan: &TrainingPlan,
    plots: &RasterPlots,
    image: u64,
) -> PipelineResult<()> {
    if plots.c1 {
        for (scale, layer) in layers.c1().layers() {
            let path = c1_raster_path(&plots.output_dir, &plan.dataset_label, image, scale, layer.label());
            save_raster(sim, layer.population(), layer.shape(), &path)?;
        }
    }
    if plots.s2 {
        let s2 = layers.s2().ok_or(PipelineError::MissingStage(Stage::S2))?;
        for prototype in 0..s2.prototype_count() {
            for (scale, layer) in s2.layers_for_prototype(prototype) {
                let path = s2_raster_path(&plots.output_dir, &plan.dataset_label, image, prototype, scale);
                save_raster(sim, layer.population(), layer.shape(), &path)?;
            }
        }
    }
    Ok(())
}

/// Draw every prototype of `snapshot` to its PNG
pub fn write_reconstructions(
    snapshot: &WeightSnapshot,
    c1_shapes: &BTreeMap<u32, LayerShape>,
    feature_size: usize,
    dataset: &str,
    reconstruction: &Reconstruction,
) -> PipelineResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(snapshot.prototype_count());
    for (prototype, weights) in snapshot.weights_by_prototype.iter().enumerate() {
        let kernel = weights.kernel(feature_size, c1_shapes)?;
        let image = reconstruct(&kernel, &reconstruction.dictionary, feature_size)?;
        let path = reconstruction_path(&reconstruction.output_dir, dataset, prototype, snapshot.epoch);
        save_png(&image, &path)?;
        written.push(path);
    }
    debug!(target: "hmax-pipeline", "Reconstructed {} prototypes at epoch {}", written.len(), snapshot.epoch);
    Ok(written)
}

/// Run all trials and return the final weights.
///
/// Periodic checkpoints, rasters and reconstructions are best-effort and
/// root-only; failures are logged. The final checkpoint must succeed.
pub fn train<S: Simulator + ?Sized>(
    sim: &mut S,
    role: CoordinationRole,
    layers: &LayerCollection,
    plan: &TrainingPlan,
    manager: &mut WeightLifecycleManager,
) -> PipelineResult<WeightSnapshot> {
    let s2: &S2Layers = layers.s2().ok_or(PipelineError::MissingStage(Stage::S2))?;
    let c1_shapes = layers.c1().shapes();
    let total = plan.image_count;
    let reconstruct_snapshot = |snapshot: &WeightSnapshot| {
        if let Some(reconstruction) = &plan.reconstruction {
            let result = write_reconstructions(
                snapshot,
                &c1_shapes,
                plan.feature_size,
                &plan.dataset_label,
                reconstruction,
            );
            if let Err(e) = result {
                warn!(target: "hmax-pipeline", "Reconstruction at epoch {} failed: {}", snapshot.epoch, e);
            }
        }
    };

    info!(target: "hmax-pipeline", "========= Start simulation =========");
    let started = Instant::now();
    for image in 0..total {
        debug!(target: "hmax-pipeline", "Simulating for image number {}", image);
        sim.run(plan.sim_time_ms)?;

        if role.is_root() {
            if let Some(plots) = &plan.plots {
                if let Err(e) = write_rasters(sim, layers, plan, plots, image) {
                    warn!(target: "hmax-pipeline", "Spike rasters for image {} failed: {}", image, e);
                }
            }
        }

        if let Some(snapshot) = manager.after_trial(&*sim, s2, image + 1, total)? {
            reconstruct_snapshot(&snapshot);
        }
    }
    info!(target: "hmax-pipeline", "========= Stop  simulation =========");
    info!(target: "hmax-pipeline", "Simulation of {} images took {:.2?}", total, started.elapsed());

    let snapshot = manager.finish(&*sim, s2, total)?;
    if role.is_root() {
        reconstruct_snapshot(&snapshot);
    }
    Ok(snapshot)
}
